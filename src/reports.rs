use crate::models::ReportRequest;
use chrono::NaiveDate;

pub const REPORT_TYPES: &[(&str, &str)] = &[
    ("daily", "Daily Summary"),
    ("weekly", "Weekly Progress"),
    ("monthly", "Monthly Review"),
];

/// Filters shared by the reports page and the generate request. An empty
/// patient filter means "all patients".
#[derive(Debug, Clone, Default)]
pub struct ReportFilters {
    pub patient_id: Option<String>,
    pub report_type: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl ReportFilters {
    pub fn patient(&self) -> Option<&str> {
        self.patient_id.as_deref().filter(|id| !id.is_empty())
    }

    pub fn report_type(&self) -> &str {
        if self.report_type.is_empty() {
            "daily"
        } else {
            &self.report_type
        }
    }

    pub fn to_request(&self, want_pdf: bool) -> ReportRequest {
        ReportRequest {
            patient_id: self.patient().map(str::to_string),
            report_type: self.report_type().to_string(),
            start_date: self.start_date,
            end_date: self.end_date,
            format: if want_pdf { "pdf" } else { "text" }.to_string(),
        }
    }
}

/// Download name for a generated report, matching the backend's attachment
/// naming: `report_<type>_<patient|all>.<pdf|txt>`.
pub fn report_filename(report_type: &str, patient_id: Option<&str>, pdf: bool) -> String {
    format!(
        "report_{}_{}.{}",
        report_type,
        patient_id.unwrap_or("all"),
        if pdf { "pdf" } else { "txt" }
    )
}

/// Badge class for the skill-performance status column.
pub fn status_class(status: &str) -> &'static str {
    match status {
        "On Track" => "badge ok",
        "Improving" => "badge info",
        _ => "badge warn",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_covers_patient_and_format() {
        assert_eq!(report_filename("daily", None, true), "report_daily_all.pdf");
        assert_eq!(
            report_filename("weekly", Some("12"), false),
            "report_weekly_12.txt"
        );
    }

    #[test]
    fn empty_filter_means_all_patients() {
        let mut filters = ReportFilters::default();
        filters.patient_id = Some(String::new());
        assert!(filters.patient().is_none());
        assert_eq!(filters.report_type(), "daily");

        let request = filters.to_request(true);
        assert!(request.patient_id.is_none());
        assert_eq!(request.format, "pdf");
    }

    #[test]
    fn known_statuses_map_to_badges() {
        assert_eq!(status_class("On Track"), "badge ok");
        assert_eq!(status_class("Improving"), "badge info");
        assert_eq!(status_class("Needs Attention"), "badge warn");
    }
}
