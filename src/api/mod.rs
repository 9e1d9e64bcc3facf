//! HTTP API over a running engine
//!
//! Exposes route submission, gas estimates, custody reads and engine status
//! to off-chain opportunity submitters.

pub mod routes;

pub use routes::{create_router, ExecuteRequest, GasEstimateRequest};

use crate::{config::ServerConfig, engine::ArbitrageExecutor, ArbitrageError, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

/// Serve the API until Ctrl-C
pub async fn serve(engine: Arc<ArbitrageExecutor>, config: &ServerConfig) -> Result<()> {
    let mut app = create_router(engine).layer(TraceLayer::new_for_http());
    if config.enable_cors {
        app = app.layer(CorsLayer::permissive());
    }

    let listener = TcpListener::bind(&config.listen_addr)
        .await
        .map_err(|e| ArbitrageError::Config(format!("Failed to bind {}: {}", config.listen_addr, e)))?;
    info!(listen_addr = %config.listen_addr, "HTTP API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
