//! Error types for vislog-server
//!
//! Storage faults are not recovered: the detail is logged and the caller
//! gets a generic 500.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Body message for every storage failure
pub const STORAGE_FAILURE_MESSAGE: &str = "Storage unavailable";

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed request parameter (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Visit store failure (500)
    #[error("Storage error: {0}")]
    Storage(#[from] vislog_common::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Storage(err) => {
                error!("Request failed: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    STORAGE_FAILURE_MESSAGE.to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
