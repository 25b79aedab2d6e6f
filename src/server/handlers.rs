//! Request handlers: PDF export and static files

use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

use super::error::ApiError;
use super::SharedState;
use crate::constants::export::CONTENT_TYPE;
use crate::constants::server::INDEX_FILE;
use crate::engine::ConfigurationSnapshot;
use crate::report::{self, ReportInput};

/// `POST /api/export-pdf`: render the posted configuration as a PDF download
pub async fn export_pdf(
    State(state): State<SharedState>,
    payload: Result<Json<ConfigurationSnapshot>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(snapshot) = payload.map_err(|rejection| ApiError::InvalidRequest(rejection.body_text()))?;
    let permit = state.gate.try_acquire()?;

    info!(
        server = ?snapshot.selected_server_id,
        counts = ?snapshot.counts,
        "Export requested"
    );

    let input = ReportInput {
        snapshot,
        catalog: state.catalog.clone(),
        policy: state.policy,
    };
    let font = state.font.clone();
    let bytes = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        report::render_report(&input, &font)
    })
    .await
    .map_err(|err| ApiError::Internal(err.to_string()))??;

    debug!(bytes = bytes.len(), "Export rendered");
    let disposition = format!("attachment; filename=\"{}\"", state.file_name);
    Ok((
        [
            (header::CONTENT_TYPE, CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

/// Everything else: files from the static dir, `index.html` for unknown paths
pub async fn static_file(State(state): State<SharedState>, method: Method, uri: Uri) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }
    let Some(relative) = sanitize(uri.path()) else {
        warn!(path = uri.path(), "Rejected static path");
        return StatusCode::NOT_FOUND.into_response();
    };

    if !relative.as_os_str().is_empty() {
        let candidate = state.static_dir.join(&relative);
        if let Ok(bytes) = tokio::fs::read(&candidate).await {
            return file_response(&candidate, bytes);
        }
    }

    let index = state.static_dir.join(INDEX_FILE);
    match tokio::fs::read(&index).await {
        Ok(bytes) => file_response(&index, bytes),
        Err(err) => {
            debug!(path = %index.display(), error = %err, "No index file to serve");
            (StatusCode::NOT_FOUND, "Not found").into_response()
        }
    }
}

/// Request path to a relative file path; `None` if it tries to leave the dir
fn sanitize(path: &str) -> Option<PathBuf> {
    let mut relative = PathBuf::new();
    for segment in path.split('/').filter(|s| !s.is_empty() && *s != ".") {
        if segment.contains('\\') {
            return None;
        }
        match Path::new(segment).components().next() {
            Some(Component::Normal(part)) => relative.push(part),
            _ => return None,
        }
    }
    Some(relative)
}

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("html") => "text/html; charset=utf-8",
        Some("js" | "mjs") => "text/javascript; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("json") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("ico") => "image/x-icon",
        Some("woff2") => "font/woff2",
        Some("txt") => "text/plain; charset=utf-8",
        Some("pdf") => CONTENT_TYPE,
        _ => "application/octet-stream",
    }
}

fn file_response(path: &Path, bytes: Vec<u8>) -> Response {
    ([(header::CONTENT_TYPE, content_type(path))], Body::from(bytes)).into_response()
}
