//! Error types for the category server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use category_matcher::MatchError;
use thiserror::Error;

/// Errors returned by the HTTP API.
///
/// Each variant maps to its own status code so clients can tell bad input
/// from a matcher that could not run.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    InvalidParameter(String),

    #[error("{0}")]
    ModelUnavailable(String),

    /// Ranking did not finish within the request timeout; nothing was saved
    #[error("{0}")]
    Timeout(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidParameter(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::ModelUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<MatchError> for ApiError {
    fn from(err: MatchError) -> Self {
        match &err {
            MatchError::Validation(msg) => ApiError::BadRequest(msg.clone()),
            MatchError::InvalidParameter { .. } => ApiError::InvalidParameter(err.to_string()),
            MatchError::ModelUnavailable(_) | MatchError::DimensionMismatch { .. } => {
                ApiError::ModelUnavailable(err.to_string())
            }
            _ => ApiError::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

/// Errors while turning command-line options into a server configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
}

/// Result type alias for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;
