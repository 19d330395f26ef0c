//! Batch conversion, as one aggregate response or as an NDJSON progress
//! stream.

use axum::{
    body::Body,
    extract::{Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use docshift_core::{BatchSummary, CompressionOptions, ConversionRequest, FormatTag};
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::{wrappers::ReceiverStream, StreamExt};
use tracing::{info, warn};

use super::error::{bad_request, batch_error, ApiError};
use super::multipart::UploadForm;
use crate::state::AppState;

/// One entry of the `requests` form field. Entries pair with `file` parts by
/// position.
#[derive(Debug, Deserialize)]
pub struct BatchItem {
    pub target_format: FormatTag,
    #[serde(default)]
    pub compression: Option<CompressionOptions>,
}

/// Pairs the `requests` JSON with the uploaded files.
///
/// Only structural faults are reported here; everything about the files
/// themselves is left to the per-file results.
pub fn build_requests(form: UploadForm) -> Result<Vec<ConversionRequest>, ApiError> {
    let raw = form
        .field("requests")
        .ok_or_else(|| bad_request("No requests field provided"))?;
    let items: Vec<BatchItem> = serde_json::from_str(raw)
        .map_err(|e| bad_request(format!("Malformed requests JSON: {}", e)))?;

    if items.len() != form.files.len() {
        return Err(bad_request(format!(
            "{} requests given for {} files",
            items.len(),
            form.files.len()
        )));
    }

    Ok(items
        .into_iter()
        .zip(form.files)
        .map(|(item, file)| {
            let mut request = ConversionRequest::new(file.bytes, file.filename, item.target_format);
            request.compression = item.compression;
            request
        })
        .collect())
}

/// Runs a batch to completion and returns every result at once.
pub async fn run_batch(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<BatchSummary>, ApiError> {
    let form = UploadForm::read(multipart).await?;
    let requests = build_requests(form)?;

    let summary = state
        .orchestrator()
        .run_batch(requests)
        .await
        .map_err(|e| batch_error(&e))?;

    info!(
        batch_id = %summary.batch_id,
        succeeded = summary.succeeded,
        failed = summary.failed,
        "Batch request served"
    );
    Ok(Json(summary))
}

/// Starts a batch and streams its progress events, one JSON object per line.
///
/// Dropping the connection drops the stream, which the orchestrator treats
/// as a disconnect.
pub async fn stream_batch(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let form = UploadForm::read(multipart).await?;
    let requests = build_requests(form)?;

    let handle = state
        .orchestrator()
        .start_batch(requests)
        .map_err(|e| batch_error(&e))?;
    let batch_id = handle.batch_id.clone();

    let lines = ReceiverStream::new(handle.into_receiver()).filter_map(move |event| {
        match serde_json::to_vec(&event) {
            Ok(mut line) => {
                line.push(b'\n');
                Some(Ok::<_, Infallible>(Bytes::from(line)))
            }
            Err(e) => {
                warn!(batch_id = %batch_id, error = %e, "Failed to encode progress event");
                None
            }
        }
    });

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/x-ndjson")],
        Body::from_stream(lines),
    )
        .into_response())
}
