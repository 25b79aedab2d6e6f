//! HTTP export server
//!
//! Hosts the built web front end and forwards export requests to the report
//! generator. The server keeps no configuration state between requests.

mod error;
mod handlers;

use anyhow::{Context, Result};
use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use axum::Router;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::constants::server::MAX_BODY_BYTES;
use crate::engine::PowerPolicy;
use crate::report::{ExportGate, ReportFont};

/// Read-only state shared by all requests
#[derive(Debug)]
pub struct ServerState {
    pub catalog: Arc<Catalog>,
    pub policy: PowerPolicy,
    pub gate: ExportGate,
    pub font: ReportFont,
    pub static_dir: PathBuf,
    /// Suggested download name
    pub file_name: String,
}

pub type SharedState = Arc<ServerState>;

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/api/export-pdf", post(handlers::export_pdf))
        .route("/export", post(handlers::export_pdf))
        .fallback(handlers::static_file)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(Arc::new(state))
}

/// Serve until Ctrl-C
pub async fn serve(state: ServerState, bind: &str) -> Result<()> {
    if !state.static_dir.is_dir() {
        warn!(dir = %state.static_dir.display(), "Static directory not found, only the export API is available");
    }

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;
    let addr = listener.local_addr().context("Failed to read bound address")?;
    info!(%addr, static_dir = %state.static_dir.display(), "Export server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Export server failed")?;

    info!("Export server stopped");
    Ok(())
}

/// Blocking entry point for the `serve` subcommand
pub fn run(state: ServerState, bind: &str) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start tokio runtime")?;
    runtime.block_on(serve(state, bind))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = ?err, "Failed to listen for Ctrl-C, shutting down");
        return;
    }
    info!("Ctrl-C received, shutting down");
}
