use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use docshift_core::{ArtifactHandle, StoreError};
use std::sync::Arc;
use tracing::debug;

use super::error::{store_error, ApiError};
use crate::state::AppState;

fn parse_handle(raw: &str) -> Result<ArtifactHandle, ApiError> {
    ArtifactHandle::parse(raw).ok_or_else(|| store_error(&StoreError::not_found(raw)))
}

/// `attachment` disposition with an ASCII fallback and an RFC 5987 name.
pub fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_graphic() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(filename)
    )
}

/// Downloads a converted artifact.
pub async fn download_artifact(
    State(state): State<Arc<AppState>>,
    Path(handle): Path<String>,
) -> Result<Response, ApiError> {
    let handle = parse_handle(&handle)?;
    let artifact = state
        .store()
        .get(&handle)
        .await
        .map_err(|e| store_error(&e))?;

    let disposition = HeaderValue::from_str(&content_disposition(&artifact.meta.filename))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    debug!(handle = %handle, size_bytes = artifact.meta.size_bytes, "Serving artifact");
    Ok((
        StatusCode::OK,
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static(artifact.meta.format.mime_type()),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        artifact.bytes,
    )
        .into_response())
}

/// Deletes an artifact before its retention window ends.
pub async fn delete_artifact(
    State(state): State<Arc<AppState>>,
    Path(handle): Path<String>,
) -> Result<StatusCode, ApiError> {
    let handle = parse_handle(&handle)?;
    state
        .store()
        .evict(&handle)
        .await
        .map_err(|e| store_error(&e))?;
    Ok(StatusCode::NO_CONTENT)
}
