use anyhow::Context;
use tokio::net::TcpListener;

use digibank_backend::app::create_app;
use digibank_backend::build_state;
use digibank_backend::config::AppConfig;
use digibank_backend::logging::{init_logging, LoggingConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    init_logging(LoggingConfig::from_env())?;

    let config = AppConfig::from_env().map_err(anyhow::Error::msg)?;
    let state = build_state(&config)?;
    let app = create_app(state);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!("🚀 Digibank backend running at http://{}/", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
