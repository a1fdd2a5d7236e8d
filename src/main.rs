//! Vitalrisk: cardiometabolic risk scoring service.
//!
//! Main entry point: logging setup and HTTP server startup.

use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vitalrisk::adapters::FsArtifactStore;
use vitalrisk::application::{EstimatorFamily, ModelManager};
use vitalrisk::http::router;

/// Environment variable overriding the listen address.
const BIND_ADDR_ENV: &str = "RISK_BIND_ADDR";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let store = FsArtifactStore::from_env();
    tracing::info!(dir = %store.dir().display(), "artifact directory");

    let manager = Arc::new(ModelManager::new(store, EstimatorFamily::from_env()));
    let app = router(manager);

    let addr = std::env::var(BIND_ADDR_ENV).unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
    let listener = tokio::net::TcpListener::bind(addr.as_str()).await?;
    tracing::info!(%addr, "vitalrisk listening");

    axum::serve(listener, app).await?;
    Ok(())
}
