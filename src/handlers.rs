use crate::assessment::{self, Phase};
use crate::charts;
use crate::errors::AppError;
use crate::export;
use crate::models::{ChartSeries, NewPatient, Patient};
use crate::reports::{report_filename, ReportFilters};
use crate::state::AppState;
use crate::storage;
use crate::tracker::{self, TrackerStatus};
use crate::ui;
use axum::{
    extract::{Query, State},
    http::header,
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use tracing::{error, info};

#[derive(Debug, Default, Deserialize)]
pub struct PatientFilter {
    #[serde(rename = "patientId", default)]
    pub patient_id: Option<String>,
}

impl PatientFilter {
    fn patient(&self) -> Option<&str> {
        self.patient_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// Refreshes the patient cache from the backend; a failed fetch keeps the
/// previous cache (stale but visible). Overlapping refreshes each write the
/// cache when their fetch resolves, so the last response to arrive wins.
async fn refresh_patients(state: &AppState) -> Vec<Patient> {
    match state.api.patients().await {
        Ok(list) => {
            *state.patients.lock().await = list.clone();
            list
        }
        Err(err) => {
            error!("failed to load patients: {err}");
            state.patients.lock().await.clone()
        }
    }
}

fn series_or_empty(result: Result<ChartSeries, reqwest::Error>, what: &str) -> ChartSeries {
    match result {
        Ok(series) => series,
        Err(err) => {
            error!("failed to load {what}: {err}");
            ChartSeries::default()
        }
    }
}

// Pages

pub async fn dashboard(
    State(state): State<AppState>,
    Query(filter): Query<PatientFilter>,
) -> Html<String> {
    let patient = filter.patient();
    let patients = refresh_patients(&state).await;
    let stats = match state.api.dashboard_stats(patient).await {
        Ok(stats) => Some(stats),
        Err(err) => {
            error!("failed to load dashboard stats: {err}");
            None
        }
    };
    let recent = state
        .api
        .assessments(patient, Some(5))
        .await
        .unwrap_or_else(|err| {
            error!("failed to load recent assessments: {err}");
            Vec::new()
        });
    let progress = series_or_empty(state.api.progress_chart(patient).await, "progress chart");
    let skills = series_or_empty(state.api.skills_chart(patient).await, "skills chart");

    Html(ui::render_dashboard(
        &patients,
        patient,
        stats.as_ref(),
        &recent,
        &charts::line_chart(&progress, "Progress over the last 7 days"),
        &charts::pie_chart(&skills, "Skill breakdown"),
    ))
}

pub async fn tracker_page(
    State(state): State<AppState>,
    Query(filter): Query<PatientFilter>,
) -> Html<String> {
    let patients = refresh_patients(&state).await;

    if filter.patient_id.is_some() {
        state.tracker.lock().await.patient_id = filter.patient().map(str::to_string);
    }
    let patient = state.tracker.lock().await.patient_id.clone();

    match state.api.workouts(patient.as_deref()).await {
        Ok(log) => state.tracker.lock().await.log = log,
        Err(err) => error!("failed to load workout log: {err}"),
    }

    let tracker = state.tracker.lock().await;
    Html(ui::render_tracker(
        &patients,
        tracker.patient_id.as_deref(),
        &tracker.completed,
        &tracker.log,
    ))
}

pub async fn assessment_page(State(state): State<AppState>) -> Html<String> {
    let patients = refresh_patients(&state).await;
    let form = state.assessment.lock().await.clone();
    Html(ui::render_assessment(&patients, &form))
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    #[serde(rename = "patientId", default)]
    pub patient_id: Option<String>,
    #[serde(rename = "type", default)]
    pub report_type: Option<String>,
}

pub async fn reports_page(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Html<String> {
    let filters = ReportFilters {
        patient_id: query.patient_id,
        report_type: query.report_type.unwrap_or_default(),
        ..ReportFilters::default()
    };
    let patient = filters.patient();

    let patients = refresh_patients(&state).await;
    let skills = state.api.skill_performance(patient).await.unwrap_or_else(|err| {
        error!("failed to load skill performance: {err}");
        Vec::new()
    });
    let sessions = state.api.session_history(patient).await.unwrap_or_else(|err| {
        error!("failed to load session history: {err}");
        Vec::new()
    });
    let weekly = series_or_empty(
        state.api.weekly_activity_chart(patient).await,
        "weekly activity chart",
    );
    let distribution = series_or_empty(
        state.api.activity_distribution_chart(patient).await,
        "activity distribution chart",
    );

    Html(ui::render_reports(
        &patients,
        &filters,
        &skills,
        &sessions,
        &charts::line_chart(&weekly, "Workouts per weekday"),
        &charts::pie_chart(&distribution, "Workouts per category"),
    ))
}

// Patient directory

#[derive(Debug, Deserialize)]
pub struct NewPatientForm {
    pub name: String,
    #[serde(default)]
    pub age: Option<u32>,
}

pub async fn create_patient(
    State(state): State<AppState>,
    Form(form): Form<NewPatientForm>,
) -> Result<Redirect, AppError> {
    let name = form.name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request("patient name is required"));
    }
    let patient = state
        .api
        .create_patient(&NewPatient {
            name: name.to_string(),
            age: form.age,
        })
        .await?;
    info!(id = %patient.id, "patient registered");
    refresh_patients(&state).await;
    Ok(Redirect::to("/"))
}

// Workout tracker

pub async fn tracker_status(State(state): State<AppState>) -> Json<TrackerStatus> {
    Json(tracker::status(&mut *state.tracker.lock().await))
}

#[derive(Debug, Deserialize)]
pub struct StartForm {
    pub activity_id: String,
}

pub async fn tracker_start(
    State(state): State<AppState>,
    Form(form): Form<StartForm>,
) -> Result<Json<TrackerStatus>, AppError> {
    let activity = tracker::activity(&form.activity_id)
        .ok_or_else(|| AppError::bad_request("unknown activity"))?;
    let mut guard = state.tracker.lock().await;
    tracker::start_activity(&mut guard, activity);
    Ok(Json(tracker::status(&mut guard)))
}

pub async fn tracker_toggle(State(state): State<AppState>) -> Json<TrackerStatus> {
    tracker::toggle_timer(&state.tracker).await;
    Json(tracker::status(&mut *state.tracker.lock().await))
}

pub async fn tracker_reset(State(state): State<AppState>) -> Json<TrackerStatus> {
    tracker::reset_timer(&state.tracker).await;
    Json(tracker::status(&mut *state.tracker.lock().await))
}

#[derive(Debug, Deserialize)]
pub struct LogForm {
    pub activity_id: String,
    #[serde(default)]
    pub patient_id: Option<String>,
    #[serde(default)]
    pub duration: Option<u32>,
}

pub async fn tracker_log(
    State(state): State<AppState>,
    Form(form): Form<LogForm>,
) -> Result<Redirect, AppError> {
    let activity = tracker::activity(&form.activity_id)
        .ok_or_else(|| AppError::bad_request("unknown activity"))?;

    let (patient, timer_minutes) = {
        let guard = state.tracker.lock().await;
        let patient = form
            .patient_id
            .clone()
            .filter(|id| !id.is_empty())
            .or_else(|| guard.patient_id.clone())
            .ok_or_else(|| AppError::bad_request("Select a patient before logging an activity"))?;
        let timer_minutes = guard
            .session
            .as_ref()
            .filter(|s| s.activity_id == activity.id && s.timer.elapsed_secs() > 0)
            .map(|s| s.timer.logged_minutes());
        (patient, timer_minutes)
    };

    let entry = tracker::build_log_entry(activity, &patient, timer_minutes, form.duration, Utc::now());
    let saved = state.api.create_workout(&entry).await?;
    info!(id = %saved.id, activity = activity.id, "workout logged");

    {
        let mut guard = state.tracker.lock().await;
        guard.completed.insert(activity.id.to_string());
        guard.close_session();
    }
    match state.api.workouts(Some(&patient)).await {
        Ok(log) => state.tracker.lock().await.log = log,
        Err(err) => error!("failed to refresh workout log: {err}"),
    }

    Ok(Redirect::to("/tracker"))
}

pub async fn tracker_csv(State(state): State<AppState>) -> Response {
    let csv = export::workouts_csv(&state.tracker.lock().await.log);
    download("text/csv", "workout_log.csv", csv.into_bytes())
}

// Assessment form

#[derive(Debug, Deserialize)]
pub struct SelectForm {
    #[serde(default)]
    pub patient_id: String,
}

pub async fn assessment_select(
    State(state): State<AppState>,
    Form(form): Form<SelectForm>,
) -> Redirect {
    let mut guard = state.assessment.lock().await;
    if form.patient_id.is_empty() {
        guard.patient_id = None;
        guard.phase = Phase::PatientUnselected;
        guard.message = None;
    } else {
        guard.select_patient(form.patient_id);
    }
    Redirect::to("/assessment")
}

#[derive(Debug, Deserialize)]
pub struct FieldUpdate {
    pub key: String,
    #[serde(default)]
    pub value: String,
}

/// Draft autosave + field validation, fired on input; independent of the
/// submit gating.
pub async fn assessment_field(
    State(state): State<AppState>,
    Json(update): Json<FieldUpdate>,
) -> Result<Json<serde_json::Value>, AppError> {
    let spec = assessment::field(&update.key)
        .ok_or_else(|| AppError::bad_request("unknown assessment field"))?;
    let validation = assessment::validate_field(spec, &update.value).err();

    let draft = {
        let mut guard = state.assessment.lock().await;
        guard.set_field(&update.key, update.value);
        guard.fields.clone()
    };
    let score = assessment::compute_score(
        &draft
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect(),
    );
    if let Err(err) = storage::persist_draft(&state.draft_path, &draft).await {
        error!("failed to persist assessment draft: {}", err.message);
    }

    Ok(Json(json!({ "score": score, "error": validation })))
}

pub async fn assessment_submit(
    State(state): State<AppState>,
    Form(fields): Form<BTreeMap<String, String>>,
) -> Redirect {
    let payload = {
        let mut guard = state.assessment.lock().await;
        for spec in assessment::FIELDS {
            if let Some(value) = fields.get(spec.key) {
                guard.set_field(spec.key, value.clone());
            }
        }
        guard.phase = Phase::Submitting;
        match guard.validate().and_then(|_| guard.payload(Utc::now())) {
            Ok(payload) => payload,
            Err(msg) => {
                guard.failed(msg);
                return Redirect::to("/assessment");
            }
        }
    };

    match state.api.create_assessment(&payload).await {
        Ok(saved) => {
            info!(id = %saved.id, score = saved.score, "assessment saved");
            state
                .assessment
                .lock()
                .await
                .submitted(format!("{} (score {}%)", saved.message, saved.score));
            storage::clear_draft(&state.draft_path).await;
        }
        Err(err) => {
            error!("failed to save assessment: {err}");
            state.assessment.lock().await.failed(err.to_string());
        }
    }
    Redirect::to("/assessment")
}

// Reports

pub async fn sessions_csv(
    State(state): State<AppState>,
    Query(filter): Query<PatientFilter>,
) -> Result<Response, AppError> {
    let sessions = state.api.session_history(filter.patient()).await?;
    let csv = export::sessions_csv(&sessions);
    Ok(download("text/csv", "session_history.csv", csv.into_bytes()))
}

#[derive(Debug, Deserialize)]
pub struct GenerateForm {
    #[serde(default)]
    pub patient_id: Option<String>,
    #[serde(default)]
    pub report_type: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub format: String,
}

fn parse_date(raw: Option<&str>) -> Option<NaiveDate> {
    raw.filter(|s| !s.is_empty())
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
}

pub async fn generate_report(
    State(state): State<AppState>,
    Form(form): Form<GenerateForm>,
) -> Result<Response, AppError> {
    let filters = ReportFilters {
        patient_id: form.patient_id,
        report_type: form.report_type,
        start_date: parse_date(form.start_date.as_deref()),
        end_date: parse_date(form.end_date.as_deref()),
    };
    let want_pdf = form.format != "text";
    let request = filters.to_request(want_pdf);

    let report = state.api.generate_report(&request).await?;
    let response = match report {
        crate::models::GeneratedReport::Pdf(bytes) => download(
            "application/pdf",
            &report_filename(filters.report_type(), filters.patient(), true),
            bytes,
        ),
        crate::models::GeneratedReport::Text(content) => download(
            "text/plain; charset=utf-8",
            &report_filename(filters.report_type(), filters.patient(), false),
            content.into_bytes(),
        ),
    };
    Ok(response)
}

fn download(content_type: &str, filename: &str, body: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={filename}"),
            ),
        ],
        body,
    )
        .into_response()
}
