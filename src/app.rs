use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::dashboard))
        .route("/tracker", get(handlers::tracker_page))
        .route("/assessment", get(handlers::assessment_page))
        .route("/reports", get(handlers::reports_page))
        .route("/patients", post(handlers::create_patient))
        .route("/api/tracker/status", get(handlers::tracker_status))
        .route("/api/tracker/start", post(handlers::tracker_start))
        .route("/api/tracker/toggle", post(handlers::tracker_toggle))
        .route("/api/tracker/reset", post(handlers::tracker_reset))
        .route("/tracker/log", post(handlers::tracker_log))
        .route("/tracker/export.csv", get(handlers::tracker_csv))
        .route("/assessment/select", post(handlers::assessment_select))
        .route("/api/assessment/field", post(handlers::assessment_field))
        .route("/assessment/submit", post(handlers::assessment_submit))
        .route("/reports/sessions.csv", get(handlers::sessions_csv))
        .route("/reports/generate", post(handlers::generate_report))
        .with_state(state)
}
