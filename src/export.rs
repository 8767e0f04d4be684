use crate::models::{SessionRow, Workout};

/// Quotes a CSV field, doubling embedded quotes. Every field is quoted so the
/// exports open cleanly regardless of commas in notes or activity names.
fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

fn row(fields: &[String]) -> String {
    fields
        .iter()
        .map(|f| quote(f))
        .collect::<Vec<_>>()
        .join(",")
}

/// Workout log export: header row, then one row per entry in descending
/// timestamp order.
pub fn workouts_csv(entries: &[Workout]) -> String {
    let mut sorted: Vec<&Workout> = entries.iter().collect();
    sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    let mut lines = vec![row(&[
        "Date".to_string(),
        "Activity".to_string(),
        "Category".to_string(),
        "Duration (min)".to_string(),
        "Frequency".to_string(),
        "Patient".to_string(),
    ])];
    for entry in sorted {
        lines.push(row(&[
            entry.timestamp.to_rfc3339(),
            entry.activity_name.clone(),
            entry.category.clone(),
            entry.duration.to_string(),
            entry.frequency.clone(),
            entry.patient_id.clone(),
        ]));
    }
    lines.join("\n") + "\n"
}

/// Session history export, same shape as the reports table.
pub fn sessions_csv(rows: &[SessionRow]) -> String {
    let mut sorted: Vec<&SessionRow> = rows.iter().collect();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));

    let mut lines = vec![row(&[
        "Date".to_string(),
        "Patient".to_string(),
        "Duration (min)".to_string(),
        "Activities".to_string(),
        "Score".to_string(),
        "Notes".to_string(),
    ])];
    for session in sorted {
        lines.push(row(&[
            session.date.clone(),
            session.patient.clone(),
            session.duration.to_string(),
            session.activities.clone(),
            session.score.to_string(),
            session.notes.clone(),
        ]));
    }
    lines.join("\n") + "\n"
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn workout(name: &str, day: u32) -> Workout {
        Workout {
            id: None,
            patient_id: "1".to_string(),
            activity_name: name.to_string(),
            category: "fine-motor".to_string(),
            duration: 10,
            frequency: "daily".to_string(),
            instructions: None,
            timestamp: Utc.with_ymd_and_hms(2026, 3, day, 9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn two_entries_export_as_header_plus_two_rows_newest_first() {
        let older = workout("Bead Threading", 1);
        let newer = workout("Balance Beam Walk", 2);
        let csv = workouts_csv(&[older, newer]);

        let lines: Vec<&str> = csv.trim_end().lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("\"Date\""));
        assert!(lines[1].contains("\"Balance Beam Walk\""));
        assert!(lines[2].contains("\"Bead Threading\""));
        for line in &lines[1..] {
            assert!(line.starts_with('"') && line.ends_with('"'));
        }
    }

    #[test]
    fn quotes_inside_fields_are_doubled() {
        let mut entry = workout("Say \"hello\"", 1);
        entry.frequency = "2x, daily".to_string();
        let csv = workouts_csv(&[entry]);
        assert!(csv.contains("\"Say \"\"hello\"\"\""));
        assert!(csv.contains("\"2x, daily\""));
    }

    #[test]
    fn sessions_csv_sorts_by_date_desc() {
        let a = SessionRow {
            date: "2026-03-01".to_string(),
            patient: "Amira".to_string(),
            patient_id: "1".to_string(),
            age: Some(6),
            duration: 45,
            activities: "Assessment Session".to_string(),
            score: 72,
            notes: String::new(),
        };
        let b = SessionRow {
            date: "2026-03-05".to_string(),
            ..a.clone()
        };
        let csv = sessions_csv(&[a, b]);
        let lines: Vec<&str> = csv.trim_end().lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("\"2026-03-05\""));
    }
}
