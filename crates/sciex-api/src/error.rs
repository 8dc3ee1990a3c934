//! API error handling
//!
//! Author: hephaex@gmail.com

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sciex_core::SciexError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const BAD_REQUEST_MESSAGE: &str = "Bad request, file not included or empty filename.";
pub const UNSUPPORTED_TYPE_MESSAGE: &str = "Unsupported file type.";
pub const PAYLOAD_TOO_LARGE_MESSAGE: &str = "File too large.";
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// API error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Human-readable message
    #[schema(example = "Unsupported file type.")]
    pub error: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }

    pub fn bad_request() -> Self {
        Self::new(BAD_REQUEST_MESSAGE)
    }

    pub fn unsupported_type() -> Self {
        Self::new(UNSUPPORTED_TYPE_MESSAGE)
    }

    pub fn payload_too_large() -> Self {
        Self::new(PAYLOAD_TOO_LARGE_MESSAGE)
    }

    pub fn internal_error() -> Self {
        Self::new(INTERNAL_ERROR_MESSAGE)
    }
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    UnsupportedType(String),
    PayloadTooLarge(String),
    Internal(SciexError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::BadRequest(msg) => {
                tracing::warn!("Rejected request: {}", msg);
                (StatusCode::BAD_REQUEST, ApiError::bad_request())
            }
            AppError::UnsupportedType(msg) => {
                tracing::warn!("Rejected upload: {}", msg);
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, ApiError::unsupported_type())
            }
            AppError::PayloadTooLarge(msg) => {
                tracing::warn!("Rejected upload: {}", msg);
                (StatusCode::PAYLOAD_TOO_LARGE, ApiError::payload_too_large())
            }
            AppError::Internal(err) => {
                tracing::error!("Error processing request: {}", error_chain(&err));
                (StatusCode::INTERNAL_SERVER_ERROR, ApiError::internal_error())
            }
        };

        (status, Json(error)).into_response()
    }
}

impl From<SciexError> for AppError {
    fn from(err: SciexError) -> Self {
        match err {
            SciexError::BadRequest(msg) => AppError::BadRequest(msg),
            SciexError::UnsupportedType(msg) => AppError::UnsupportedType(msg),
            other => AppError::Internal(other),
        }
    }
}

/// Render an error with all of its sources, outermost first
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
