use axum::{extract::Multipart, Json};
use docshift_core::{detect, FormatTag};
use serde::Serialize;

use super::error::ApiError;
use super::multipart::UploadForm;

#[derive(Debug, Serialize)]
pub struct DetectResponse {
    pub format: FormatTag,
}

/// Identifies an uploaded file. Never fails on content: unrecognized input
/// yields `UNKNOWN`.
pub async fn detect_format(multipart: Multipart) -> Result<Json<DetectResponse>, ApiError> {
    let mut form = UploadForm::read(multipart).await?;
    let file = form.single_file()?;

    Ok(Json(DetectResponse {
        format: detect(&file.bytes, &file.filename),
    }))
}
