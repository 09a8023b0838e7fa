use craftchat_backend_lib::{config::Settings, ws_router, AppState};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Try the working directory first, then the conventional config path.
    let settings = Settings::load()
        .or_else(|_| Settings::load_from("config/default.toml"))
        .unwrap_or_default();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(settings.log_level.clone())),
        )
        .init();

    let state = Arc::new(AppState::new(settings));
    let app = ws_router::create_router(state.clone());

    let listener = TcpListener::bind(state.settings.bind_addr).await?;
    tracing::info!(addr = %state.settings.bind_addr, "listening");

    axum::serve(listener, app).await?;

    Ok(())
}
