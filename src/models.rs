use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub age: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPatient {
    pub name: String,
    #[serde(default)]
    pub age: Option<u32>,
}

/// A logged home-activity session, as stored by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
    #[serde(default)]
    pub id: Option<String>,
    pub patient_id: String,
    pub activity_name: String,
    pub category: String,
    /// Minutes.
    pub duration: u32,
    pub frequency: String,
    #[serde(default)]
    pub instructions: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Payload for POST /workouts; the backend assigns the id.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWorkout {
    pub patient_id: String,
    pub activity_name: String,
    pub category: String,
    pub duration: u32,
    pub frequency: String,
    pub instructions: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkoutSaved {
    pub message: String,
    pub id: String,
}

/// An assessment as returned by GET /assessments, enriched with patient info.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub patient_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default)]
    pub patient_name: Option<String>,
    #[serde(default)]
    pub patient_age: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssessmentSaved {
    pub message: String,
    pub id: String,
    pub score: u32,
}

/// KPI card values from GET /stats/dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub active_patients: u64,
    pub todays_assessments: u64,
    pub average_progress: u64,
    pub home_workouts: u64,
}

/// Labelled series shared by every chart endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub data: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillPerformanceRow {
    pub skill: String,
    pub current: u32,
    pub previous: u32,
    pub goal: u32,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRow {
    pub date: String,
    pub patient: String,
    pub patient_id: String,
    #[serde(default)]
    pub age: Option<u32>,
    pub duration: u32,
    pub activities: String,
    pub score: u32,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub patient_id: Option<String>,
    pub report_type: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub format: String,
}

/// POST /reports/generate answers either with a PDF body or a JSON text fallback.
#[derive(Debug, Clone)]
pub enum GeneratedReport {
    Pdf(Vec<u8>),
    Text(String),
}
