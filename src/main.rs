use std::net::SocketAddr;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use mixerai_api::config::config;
use mixerai_api::database::DatabaseManager;
use mixerai_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, SECURITY_JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = config();
    tracing::info!("Starting MixerAI API in {:?} mode", config.environment);
    if config.security.jwt_secret.is_empty() {
        if mixerai_api::is_production!() {
            anyhow::bail!("SECURITY_JWT_SECRET must be set in production");
        }
        tracing::warn!("SECURITY_JWT_SECRET is not set; every protected request will be rejected");
    }

    let db = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to the database")?;
    let state = AppState::from_config(config, db)?;
    let app = mixerai_api::app(state);

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("MixerAI API listening on http://{}", bind_addr);
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}
