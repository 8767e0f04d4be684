use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Assessment form lifecycle. Selecting a patient reveals the form; a
/// successful submit drops back to `PatientUnselected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    PatientUnselected,
    PatientSelected,
    Submitting,
    Submitted,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// 0-5 skill rating.
    Score,
    /// Free numeric value with bounds.
    Number { min: i64, max: i64 },
    Text,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub section: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

const fn score(key: &'static str, label: &'static str, section: &'static str) -> FieldSpec {
    FieldSpec {
        key,
        label,
        section,
        kind: FieldKind::Score,
        required: true,
    }
}

/// The clinical form, section by section. Keys match what the backend stores.
pub const FIELDS: &[FieldSpec] = &[
    score("fineMotor_grip", "Pencil grip quality", "Fine Motor"),
    score("fineMotor_beads", "Bead threading accuracy", "Fine Motor"),
    FieldSpec {
        key: "fineMotor_notes",
        label: "Fine motor notes",
        section: "Fine Motor",
        kind: FieldKind::Text,
        required: false,
    },
    score("grossMotor_balance", "Single-leg balance", "Gross Motor"),
    FieldSpec {
        key: "grossMotor_time",
        label: "Balance hold (seconds)",
        section: "Gross Motor",
        kind: FieldKind::Number { min: 0, max: 300 },
        required: false,
    },
    FieldSpec {
        key: "grossMotor_falls",
        label: "Falls during session",
        section: "Gross Motor",
        kind: FieldKind::Number { min: 0, max: 50 },
        required: false,
    },
    score("cognitive_approach", "Problem-solving approach", "Cognitive"),
    score("cognitive_memory", "Working memory", "Cognitive"),
    score("sensory_behavior", "Sensory regulation", "Sensory"),
    score("emotional_quality", "Emotional engagement", "Emotional"),
    score("communication_clarity", "Speech clarity", "Communication"),
    score("communication_grammar", "Sentence structure", "Communication"),
    score("social_interaction", "Peer interaction", "Social"),
    score("adl_independence", "Self-care independence", "ADL"),
    score("attention_span", "Sustained attention", "Attention"),
];

pub fn field(key: &str) -> Option<&'static FieldSpec> {
    FIELDS.iter().find(|f| f.key == key)
}

/// The keys the backend averages into the overall score.
pub const SCORE_KEYS: [&str; 6] = [
    "fineMotor_grip",
    "grossMotor_balance",
    "cognitive_approach",
    "emotional_quality",
    "communication_clarity",
    "communication_grammar",
];

/// Percentage average over the present overall-score fields, on the 0-5 scale.
/// No scored fields present means 0.
pub fn compute_score(data: &Map<String, Value>) -> u32 {
    let values: Vec<i64> = SCORE_KEYS
        .iter()
        .filter_map(|key| data.get(*key))
        .filter_map(numeric)
        .collect();
    if values.is_empty() {
        return 0;
    }
    let sum: i64 = values.iter().sum();
    let pct = sum as f64 / (values.len() as f64 * 5.0) * 100.0;
    pct.round() as u32
}

fn numeric(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Field-level validation, independent of submission gating.
pub fn validate_field(spec: &FieldSpec, raw: &str) -> Result<(), String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return if spec.required {
            Err(format!("{} is required", spec.label))
        } else {
            Ok(())
        };
    }
    let bounds = match spec.kind {
        FieldKind::Score => Some((0, 5)),
        FieldKind::Number { min, max } => Some((min, max)),
        FieldKind::Text => None,
    };
    if let Some((min, max)) = bounds {
        let value: i64 = raw
            .parse()
            .map_err(|_| format!("{} must be a number", spec.label))?;
        if value < min || value > max {
            return Err(format!("{} must be between {min} and {max}", spec.label));
        }
    }
    Ok(())
}

/// Assessment form view-model. Field values stay as entered (strings) until
/// serialized for the backend.
#[derive(Debug, Clone)]
pub struct AssessmentForm {
    pub phase: Phase,
    pub patient_id: Option<String>,
    pub fields: BTreeMap<String, String>,
    pub message: Option<String>,
}

impl Default for AssessmentForm {
    fn default() -> Self {
        Self {
            phase: Phase::PatientUnselected,
            patient_id: None,
            fields: BTreeMap::new(),
            message: None,
        }
    }
}

impl AssessmentForm {
    pub fn select_patient(&mut self, patient_id: impl Into<String>) {
        self.patient_id = Some(patient_id.into());
        self.phase = Phase::PatientSelected;
        self.message = None;
    }

    pub fn set_field(&mut self, key: &str, value: String) {
        if value.trim().is_empty() {
            self.fields.remove(key);
        } else {
            self.fields.insert(key.to_string(), value);
        }
    }

    /// Validates the whole form; first error wins.
    pub fn validate(&self) -> Result<(), String> {
        if self.patient_id.is_none() {
            return Err("Select a patient before submitting".to_string());
        }
        for spec in FIELDS {
            let raw = self.fields.get(spec.key).map(String::as_str).unwrap_or("");
            validate_field(spec, raw)?;
        }
        Ok(())
    }

    /// Serializes all fields plus patientId and timestamp, flat, as the
    /// backend expects. Score fields go out as numbers.
    pub fn payload(&self, timestamp: DateTime<Utc>) -> Result<Value, String> {
        let patient_id = self
            .patient_id
            .as_ref()
            .ok_or_else(|| "Select a patient before submitting".to_string())?;
        let mut map = Map::new();
        map.insert("patientId".to_string(), Value::String(patient_id.clone()));
        map.insert(
            "timestamp".to_string(),
            Value::String(timestamp.to_rfc3339()),
        );
        for (key, raw) in &self.fields {
            let value = match field(key).map(|f| f.kind) {
                Some(FieldKind::Score) | Some(FieldKind::Number { .. }) => raw
                    .trim()
                    .parse::<i64>()
                    .map(Value::from)
                    .unwrap_or_else(|_| Value::String(raw.clone())),
                _ => Value::String(raw.clone()),
            };
            map.insert(key.clone(), value);
        }
        Ok(Value::Object(map))
    }

    /// Derived overall score of the current entries, shown next to the form.
    pub fn current_score(&self) -> u32 {
        let mut map = Map::new();
        for (key, raw) in &self.fields {
            map.insert(key.clone(), Value::String(raw.clone()));
        }
        compute_score(&map)
    }

    pub fn submitted(&mut self, message: String) {
        self.phase = Phase::Submitted;
        self.message = Some(message);
        self.patient_id = None;
        self.fields.clear();
    }

    pub fn failed(&mut self, message: String) {
        self.phase = Phase::Failed;
        self.message = Some(message);
    }
}
