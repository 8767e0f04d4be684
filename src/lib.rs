pub mod api;
pub mod app;
pub mod assessment;
pub mod charts;
pub mod errors;
pub mod export;
pub mod handlers;
pub mod models;
pub mod reports;
pub mod state;
pub mod storage;
pub mod timer;
pub mod tracker;
pub mod ui;

pub use api::{resolve_base_url, ApiClient};
pub use app::router;
pub use state::AppState;
pub use storage::{load_draft, resolve_draft_path};
