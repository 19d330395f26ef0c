//! Single-file conversion.

use axum::{extract::Multipart, extract::State, Json};
use docshift_core::{
    ArtifactHandle, CompressionOptions, CompressionTier, ConversionError, ConversionRequest,
    Converter, FormatTag,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use super::error::{bad_request, conversion_error, ApiError};
use super::multipart::UploadForm;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ConvertResponse {
    pub download_handle: ArtifactHandle,
    pub output_filename: String,
    pub source_format: FormatTag,
    pub target_format: FormatTag,
    pub size_bytes: u64,
    pub sha256: String,
}

/// Reads the optional `quality` / `tier` form fields.
///
/// Range is not checked here; out-of-range qualities are clamped by the
/// strategy.
pub fn parse_compression(
    quality: Option<&str>,
    tier: Option<&str>,
) -> Result<Option<CompressionOptions>, ConversionError> {
    match (quality, tier) {
        (None, None) => Ok(None),
        (Some(_), Some(_)) => Err(ConversionError::invalid_option(
            "give either quality or tier, not both",
        )),
        (Some(q), None) => q
            .parse::<i64>()
            .map(|q| Some(CompressionOptions::Quality(q)))
            .map_err(|_| {
                ConversionError::invalid_option(format!("quality '{}' is not an integer", q))
            }),
        (None, Some(t)) => CompressionTier::parse(t)
            .map(|t| Some(CompressionOptions::Tier(t)))
            .ok_or_else(|| {
                ConversionError::invalid_option(format!(
                    "unknown tier '{}', expected low, medium or high",
                    t
                ))
            }),
    }
}

/// Converts one uploaded file and returns a download handle.
pub async fn convert_file(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<ConvertResponse>, ApiError> {
    let mut form = UploadForm::read(multipart).await?;
    let file = form.single_file()?;

    let target_format = form
        .field("target_format")
        .map(FormatTag::parse_lossy)
        .ok_or_else(|| bad_request("No target format provided"))?;
    let compression = parse_compression(form.field("quality"), form.field("tier"))
        .map_err(|e| conversion_error(&e))?;

    let mut request = ConversionRequest::new(file.bytes, file.filename, target_format);
    request.compression = compression;

    let artifact = state
        .converter()
        .convert(&request)
        .await
        .map_err(|e| conversion_error(&e))?;

    info!(
        handle = %artifact.handle,
        source = %artifact.source_format,
        target = %artifact.target_format,
        size_bytes = artifact.size_bytes,
        "Converted upload"
    );

    Ok(Json(ConvertResponse {
        download_handle: artifact.handle,
        output_filename: artifact.output_filename,
        source_format: artifact.source_format,
        target_format: artifact.target_format,
        size_bytes: artifact.size_bytes,
        sha256: artifact.sha256,
    }))
}
