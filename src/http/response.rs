//! Error responses.
//!
//! Failures are answered with a small JSON document:
//! `{"error": "<detail>", "message": "<what the relay was doing>"}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::dispatch::DispatchError;

/// A failed inbound request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub error: String,
    pub message: &'static str,
}

impl ApiError {
    pub fn bad_request(error: impl ToString, message: &'static str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: error.to_string(),
            message,
        }
    }
}

impl From<&DispatchError> for ApiError {
    fn from(err: &DispatchError) -> Self {
        let (status, message) = match err {
            DispatchError::Render(_) => (StatusCode::INTERNAL_SERVER_ERROR, "failed to execute body template"),
            DispatchError::Credentials { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "failed to read basic auth credentials")
            }
            DispatchError::Build(_) => (StatusCode::INTERNAL_SERVER_ERROR, "failed to create HTTP request"),
            DispatchError::Cancelled => (StatusCode::SERVICE_UNAVAILABLE, "relay is shutting down"),
        };
        Self {
            status,
            error: err.to_string(),
            message,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(&self)).into_response()
    }
}
