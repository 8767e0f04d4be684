use crate::models::{
    AssessmentRecord, AssessmentSaved, ChartSeries, DashboardStats, GeneratedReport, NewPatient,
    NewWorkout, Patient, ReportRequest, SessionRow, SkillPerformanceRow, Workout, WorkoutSaved,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::env;

/// Client for the therapy REST API. The backend is the source of truth; every
/// wrapper rejects whenever the HTTP response is not ok.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

pub fn resolve_base_url() -> String {
    env::var("API_BASE_URL").unwrap_or_else(|_| "http://localhost:3000/api".to_string())
}

fn patient_query(patient_id: Option<&str>) -> Vec<(&'static str, String)> {
    match patient_id {
        Some(id) if !id.is_empty() => vec![("patientId", id.to_string())],
        _ => Vec::new(),
    }
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, reqwest::Error> {
        self.http
            .get(self.url(path))
            .query(query)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl serde::Serialize,
    ) -> Result<T, reqwest::Error> {
        self.http
            .post(self.url(path))
            .json(body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }

    pub async fn patients(&self) -> Result<Vec<Patient>, reqwest::Error> {
        self.get_json("patients", &[]).await
    }

    pub async fn create_patient(&self, patient: &NewPatient) -> Result<Patient, reqwest::Error> {
        self.post_json("patients", patient).await
    }

    pub async fn workouts(&self, patient_id: Option<&str>) -> Result<Vec<Workout>, reqwest::Error> {
        self.get_json("workouts", &patient_query(patient_id)).await
    }

    pub async fn create_workout(
        &self,
        workout: &NewWorkout,
    ) -> Result<WorkoutSaved, reqwest::Error> {
        self.post_json("workouts", workout).await
    }

    pub async fn assessments(
        &self,
        patient_id: Option<&str>,
        limit: Option<u32>,
    ) -> Result<Vec<AssessmentRecord>, reqwest::Error> {
        let mut query = patient_query(patient_id);
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }
        self.get_json("assessments", &query).await
    }

    pub async fn create_assessment(
        &self,
        payload: &Value,
    ) -> Result<AssessmentSaved, reqwest::Error> {
        self.post_json("assessments", payload).await
    }

    pub async fn dashboard_stats(
        &self,
        patient_id: Option<&str>,
    ) -> Result<DashboardStats, reqwest::Error> {
        self.get_json("stats/dashboard", &patient_query(patient_id))
            .await
    }

    async fn chart(
        &self,
        path: &str,
        patient_id: Option<&str>,
    ) -> Result<ChartSeries, reqwest::Error> {
        self.get_json(path, &patient_query(patient_id)).await
    }

    pub async fn progress_chart(
        &self,
        patient_id: Option<&str>,
    ) -> Result<ChartSeries, reqwest::Error> {
        self.chart("charts/dashboard/progress", patient_id).await
    }

    pub async fn skills_chart(
        &self,
        patient_id: Option<&str>,
    ) -> Result<ChartSeries, reqwest::Error> {
        self.chart("charts/dashboard/skills", patient_id).await
    }

    pub async fn weekly_activity_chart(
        &self,
        patient_id: Option<&str>,
    ) -> Result<ChartSeries, reqwest::Error> {
        self.chart("charts/homeworkout/weekly", patient_id).await
    }

    pub async fn activity_distribution_chart(
        &self,
        patient_id: Option<&str>,
    ) -> Result<ChartSeries, reqwest::Error> {
        self.chart("charts/homeworkout/distribution", patient_id)
            .await
    }

    pub async fn skill_performance(
        &self,
        patient_id: Option<&str>,
    ) -> Result<Vec<SkillPerformanceRow>, reqwest::Error> {
        self.get_json("reports/skill-performance", &patient_query(patient_id))
            .await
    }

    pub async fn session_history(
        &self,
        patient_id: Option<&str>,
    ) -> Result<Vec<SessionRow>, reqwest::Error> {
        self.get_json("reports/session-history", &patient_query(patient_id))
            .await
    }

    /// The backend answers with a PDF body or a JSON `{content}` fallback,
    /// depending on what it could produce.
    pub async fn generate_report(
        &self,
        request: &ReportRequest,
    ) -> Result<GeneratedReport, reqwest::Error> {
        let response = self
            .http
            .post(self.url("reports/generate"))
            .json(request)
            .send()
            .await?
            .error_for_status()?;

        let is_pdf = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/pdf"));

        if is_pdf {
            let bytes = response.bytes().await?;
            Ok(GeneratedReport::Pdf(bytes.to_vec()))
        } else {
            #[derive(serde::Deserialize)]
            struct TextReport {
                #[serde(default)]
                content: String,
            }
            let body: TextReport = response.json().await?;
            Ok(GeneratedReport::Text(body.content))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_without_double_slash() {
        let client = ApiClient::new("http://localhost:3000/api/");
        assert_eq!(client.url("patients"), "http://localhost:3000/api/patients");
    }

    #[test]
    fn patient_query_skips_empty_filter() {
        assert!(patient_query(None).is_empty());
        assert!(patient_query(Some("")).is_empty());
        assert_eq!(patient_query(Some("7")), vec![("patientId", "7".to_string())]);
    }
}
