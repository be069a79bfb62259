//! scout-proxy entry point.
//!
//! Boots the HTTP proxy: one catch-all route that answers `?q=` searches and
//! `?url=` fetches from a SQLite-backed response cache.
//! Logging goes to stderr as JSON.

use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use scout_client::{FetchConfig, HttpTransport};
use scout_core::{AppConfig, CacheDb};

mod envelope;
mod handler;
mod resolver;

#[cfg(test)]
mod testing;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    if let Err(e) = config.require_google_api_key() {
        tracing::warn!("{}; search requests will fail with 500", e);
    }

    let db = CacheDb::open(&config.db_path)
        .await
        .map_err(|e| anyhow::anyhow!("failed to open cache at {}: {}", config.db_path.display(), e))?;
    match db.purge_expired().await {
        Ok(0) => {}
        Ok(purged) => tracing::info!("purged {} expired cache entries", purged),
        Err(e) => tracing::warn!("failed to purge expired cache entries: {}", e),
    }

    let transport = HttpTransport::new(&FetchConfig::from(&config)).map_err(|e| anyhow::anyhow!("{}", e))?;
    let listener = TcpListener::bind(&config.listen_addr).await?;
    tracing::info!("scout-proxy listening on {}", listener.local_addr()?);

    let state = handler::AppState::new(config, Arc::new(db), Arc::new(transport));
    let cache = state.cache.clone();

    axum::serve(listener, handler::router(state)).with_graceful_shutdown(shutdown_signal()).await?;

    cache.shutdown().await;
    tracing::info!("scout-proxy stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("shutdown signal received, draining connections");
}
