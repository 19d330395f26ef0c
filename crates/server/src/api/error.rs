//! Error bodies shared by the API handlers.

use axum::{http::StatusCode, Json};
use docshift_core::{BatchError, ConversionError, StoreError};
use serde::Serialize;

/// Error response: a machine-readable category plus human-readable detail.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub detail: String,
}

/// Error half of every handler result.
pub type ApiError = (StatusCode, Json<ErrorResponse>);

fn error(status: StatusCode, kind: &str, detail: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: kind.to_string(),
            detail: detail.into(),
        }),
    )
}

/// Malformed request: missing parts, bad field values.
pub fn bad_request(detail: impl Into<String>) -> ApiError {
    error(StatusCode::BAD_REQUEST, "invalid_request", detail)
}

/// Maps a single-file conversion error to its HTTP status.
pub fn conversion_error(err: &ConversionError) -> ApiError {
    let status = match err {
        ConversionError::UnrecognizedFormat { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        ConversionError::InvalidCompressionOption { .. } => StatusCode::BAD_REQUEST,
        ConversionError::UnsupportedConversion { .. }
        | ConversionError::ConversionFailed { .. }
        | ConversionError::Timeout { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        ConversionError::StoreFailed { .. } => StatusCode::INSUFFICIENT_STORAGE,
    };
    error(status, err.kind(), err.to_string())
}

pub fn batch_error(err: &BatchError) -> ApiError {
    error(StatusCode::BAD_REQUEST, err.kind(), err.to_string())
}

pub fn store_error(err: &StoreError) -> ApiError {
    let status = match err {
        StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
        StoreError::TooLarge { .. } => StatusCode::INSUFFICIENT_STORAGE,
    };
    error(status, err.kind(), err.to_string())
}
