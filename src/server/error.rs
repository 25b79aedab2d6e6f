//! HTTP error responses for the export server

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use crate::errors::{EngineError, ExportError};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("Export task failed: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
}

fn engine_code(err: &EngineError) -> &'static str {
    match err {
        EngineError::NoChassisSelected => "NO_CHASSIS_SELECTED",
        EngineError::UnknownChassis(_) => "UNKNOWN_CHASSIS",
        EngineError::CapacityExceeded { .. } => "CAPACITY_EXCEEDED",
        EngineError::CategoryMismatch { .. } => "CATEGORY_MISMATCH",
        EngineError::PowerBudgetExceeded { .. } => "POWER_BUDGET_EXCEEDED",
        EngineError::MemoryRequiresProcessor { .. } => "MEMORY_REQUIRES_PROCESSOR",
        EngineError::UnknownPart { .. } => "UNKNOWN_PART",
        EngineError::UnknownPowerSupply(_) => "UNKNOWN_POWER_SUPPLY",
    }
}

impl ApiError {
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            ApiError::Export(ExportError::NoChassisSelected) => {
                (StatusCode::BAD_REQUEST, "NO_CHASSIS_SELECTED")
            }
            ApiError::Export(ExportError::InvalidConfiguration(err)) => {
                (StatusCode::BAD_REQUEST, engine_code(err))
            }
            ApiError::Export(ExportError::Busy) => (StatusCode::CONFLICT, "EXPORT_BUSY"),
            ApiError::Export(_) => (StatusCode::INTERNAL_SERVER_ERROR, "EXPORT_FAILED"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            error!(code, error = %self, "Export request failed");
        } else {
            warn!(code, error = %self, "Export request rejected");
        }

        let body = ErrorResponse {
            error: self.to_string(),
            code,
        };
        (status, Json(body)).into_response()
    }
}
