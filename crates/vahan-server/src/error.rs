use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use vahan_core::VahanError;

/// Error body returned by every route: `{"message": ...}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// A required query parameter was absent.
    BadRequest(String),
    /// Anything else; details stay in the log.
    Internal,
}

impl ApiError {
    /// Map an engine error raised while serving `operation`.
    ///
    /// Missing parameters become 400 with the error text; every other failure
    /// is logged with the operation name and hidden behind a generic 500.
    pub fn from_error(operation: &'static str, err: VahanError) -> Self {
        match err {
            VahanError::MissingParameter(_) => ApiError::BadRequest(err.to_string()),
            other => {
                tracing::error!(operation, error = %other, "Request failed");
                ApiError::Internal
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(message) => message,
            ApiError::Internal => "Server error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "message": self.message() }))).into_response()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
