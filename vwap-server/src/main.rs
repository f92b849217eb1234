//! VWAP Job Server
//!
//! Serves the USD volume-weighted average price pipeline over HTTP for
//! every supported host convention.

use anyhow::{Context, Result};
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use vwap_core::{kaiko_service, VwapApiServer, VwapConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting VWAP job server");

    let config = VwapConfig::from_env().context("Failed to load configuration")?;
    let port = config.port;
    let service = kaiko_service(config).context("Failed to build Kaiko client")?;

    let server = VwapApiServer::new(service, port);

    tokio::select! {
        _ = server.start() => {
            info!("API server exited");
        }
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received...");
        }
    }

    info!("VWAP job server shutdown complete");
    Ok(())
}
