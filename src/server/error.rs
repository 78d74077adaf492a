//! Error-to-HTTP response conversion.
//!
//! Handlers return `Result<T, AppError>`; anything that converts into
//! [`homily_common::Error`] can be propagated with `?`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use homily_common::Error;
use serde_json::json;

/// An error response with a `{"error": "..."}` body.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Not found")
    }

    pub fn payload_too_large(limit: u64) -> Self {
        Self::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            format!("File exceeds the {} byte upload limit", limit),
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<Error> for AppError {
    fn from(e: Error) -> Self {
        match e {
            Error::InvalidInput(msg) => Self::new(StatusCode::BAD_REQUEST, msg),
            Error::Conflict(msg) => Self::new(StatusCode::CONFLICT, msg),
            Error::Unavailable(_) => {
                tracing::warn!(error = %e, "Catalog unavailable");
                Self::new(StatusCode::SERVICE_UNAVAILABLE, "Service unavailable")
            }
            // Server faults stay opaque to the client.
            Error::Database(_) | Error::Io(_) => {
                tracing::error!(error = %e, "Server error in API handler");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}
