//! Taskbridge - personal task and calendar aggregator.
//!
//! Main entry point: configuration, migrations, background schedulers, and
//! the HTTP surface.

use std::sync::Arc;

use taskbridge_api::{router, AppContext};
use taskbridge_domain::Config;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logging first, so .env loading is visible
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match dotenvy::dotenv() {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!("no .env file found"),
    }

    let config = match taskbridge_infra::config::load() {
        Ok(config) => config,
        Err(err) => {
            warn!(error = %err, "no configuration found, using defaults");
            Config::default()
        }
    };
    let bind_addr = config.server.bind_addr.clone();

    let ctx = Arc::new(AppContext::new(config).await?);
    ctx.start_background().await?;
    info!("taskbridge initialised");

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %bind_addr, "listening");

    axum::serve(listener, router(Arc::clone(&ctx)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    ctx.shutdown().await;
    info!("taskbridge stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "could not install ctrl-c handler");
    }
}
