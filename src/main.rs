use rehab_dashboard::{load_draft, resolve_base_url, resolve_draft_path, router, ApiClient, AppState};
use std::{env, net::SocketAddr};
use tokio::fs;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let draft_path = resolve_draft_path()?;
    if let Some(parent) = draft_path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let draft = load_draft(&draft_path).await;

    let base_url = resolve_base_url();
    info!("using therapy API at {base_url}");
    let state = AppState::new(ApiClient::new(base_url), draft_path, draft);

    let app = router(state);

    let port = env::var("PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
