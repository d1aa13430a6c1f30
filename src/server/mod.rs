//! HTTP surface
//!
//! - `GET /` liveness with the service title
//! - `POST /ask` runs the pipeline for one query

pub mod routes;

pub use routes::{router, ApiError, AskRequest, RootResponse};

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::app::AppContext;

/// Serve until Ctrl-C
pub async fn serve(addr: &str, state: Arc<AppContext>) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(addr = %listener.local_addr()?, "Listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down");
    }
}
