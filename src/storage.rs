use crate::errors::AppError;
use std::collections::BTreeMap;
use std::{env, path::Path, path::PathBuf};
use tokio::fs;
use tracing::error;

/// Where the in-progress assessment draft lives. Best-effort local persistence;
/// the backend never sees drafts.
pub fn resolve_draft_path() -> Result<PathBuf, std::io::Error> {
    if let Ok(path) = env::var("DRAFT_PATH") {
        return Ok(PathBuf::from(path));
    }

    Ok(PathBuf::from("data/assessment_draft.json"))
}

pub async fn load_draft(path: &Path) -> BTreeMap<String, String> {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(draft) => draft,
            Err(err) => {
                error!("failed to parse draft file: {err}");
                BTreeMap::new()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
        Err(err) => {
            error!("failed to read draft file: {err}");
            BTreeMap::new()
        }
    }
}

pub async fn persist_draft(
    path: &Path,
    draft: &BTreeMap<String, String>,
) -> Result<(), AppError> {
    let payload = serde_json::to_vec_pretty(draft).map_err(AppError::internal)?;
    fs::write(path, payload).await.map_err(AppError::internal)?;
    Ok(())
}

pub async fn clear_draft(path: &Path) {
    if let Err(err) = fs::remove_file(path).await {
        if err.kind() != std::io::ErrorKind::NotFound {
            error!("failed to clear draft file: {err}");
        }
    }
}
