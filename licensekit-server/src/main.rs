//! licensekit license server
//!
//! Issues signed licenses and records revocations over HTTP.
//!
//! Usage:
//!   licensekit-server --listen 0.0.0.0:8080 --storage fs --data-dir data

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use licensekit_server::{build_router, ServerConfig};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::parse();
    init_tracing(config.verbose);

    info!("licensekit server starting...");
    if config.generate_key {
        config.ensure_signing_key()?;
    }

    let state = Arc::new(config.build_state().await?);
    let listener = TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen))?;
    info!("HTTP API listening on {}", config.listen);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Shut down cleanly");
    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
