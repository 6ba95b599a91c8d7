//! API error types with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::pipeline::extraction::ExtractionError;

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// Request-level errors with HTTP status mapping.
///
/// These cover problems with the upload itself. Model and parse failures are
/// not errors at this layer; they travel inside `UploadOutcome`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Invalid image: {0}")]
    InvalidImage(String),
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),
    #[error("Upload exceeds {limit_bytes} bytes")]
    PayloadTooLarge { limit_bytes: usize },
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::BadRequest(detail) => (
                StatusCode::BAD_REQUEST,
                "BAD_REQUEST",
                detail.clone(),
            ),
            ApiError::InvalidImage(detail) => (
                StatusCode::BAD_REQUEST,
                "INVALID_IMAGE",
                detail.clone(),
            ),
            ApiError::UnsupportedMediaType(detail) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "UNSUPPORTED_MEDIA_TYPE",
                format!("File type not supported: {detail}"),
            ),
            ApiError::PayloadTooLarge { limit_bytes } => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "PAYLOAD_TOO_LARGE",
                format!("File too large. Maximum {}.", format_limit(*limit_bytes)),
            ),
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };
        (status, Json(body)).into_response()
    }
}

/// Whole megabytes when the limit is an exact multiple, bytes otherwise.
fn format_limit(limit_bytes: usize) -> String {
    const MIB: usize = 1024 * 1024;
    if limit_bytes >= MIB && limit_bytes % MIB == 0 {
        format!("{}MB", limit_bytes / MIB)
    } else {
        format!("{limit_bytes} bytes")
    }
}

impl From<ExtractionError> for ApiError {
    fn from(err: ExtractionError) -> Self {
        if !err.is_input_error() {
            return ApiError::Internal(err.to_string());
        }
        match err {
            ExtractionError::UnsupportedFormat(detail) => ApiError::UnsupportedMediaType(detail),
            ExtractionError::ImageProcessing(detail) => ApiError::InvalidImage(detail),
            other => ApiError::Internal(other.to_string()),
        }
    }
}
