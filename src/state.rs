use crate::api::ApiClient;
use crate::assessment::AssessmentForm;
use crate::models::Patient;
use crate::tracker::Tracker;
use std::collections::BTreeMap;
use std::{path::PathBuf, sync::Arc};
use tokio::sync::Mutex;

/// Per-page view-model state. The patient and workout caches always mirror the
/// last successful fetch; the backend stays the source of truth.
#[derive(Clone)]
pub struct AppState {
    pub api: ApiClient,
    pub patients: Arc<Mutex<Vec<Patient>>>,
    pub tracker: Arc<Mutex<Tracker>>,
    pub assessment: Arc<Mutex<AssessmentForm>>,
    pub draft_path: PathBuf,
}

impl AppState {
    pub fn new(api: ApiClient, draft_path: PathBuf, draft: BTreeMap<String, String>) -> Self {
        let assessment = AssessmentForm {
            fields: draft,
            ..AssessmentForm::default()
        };
        Self {
            api,
            patients: Arc::new(Mutex::new(Vec::new())),
            tracker: Arc::new(Mutex::new(Tracker::default())),
            assessment: Arc::new(Mutex::new(assessment)),
            draft_path,
        }
    }
}
