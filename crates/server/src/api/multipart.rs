//! Multipart form collection.

use axum::extract::{multipart::MultipartError, Multipart};
use axum::Json;
use bytes::Bytes;
use std::collections::HashMap;

use super::error::{bad_request, ApiError, ErrorResponse};

/// Keeps the status axum assigns, so an oversized upload is a 413.
fn multipart_error(err: MultipartError) -> ApiError {
    (
        err.status(),
        Json(ErrorResponse {
            error: "invalid_request".to_string(),
            detail: err.body_text(),
        }),
    )
}

/// One uploaded `file` part.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Bytes,
}

/// A fully-read multipart form.
///
/// `file` parts keep their upload order; any other part is read as text and
/// the last value for a name wins.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub files: Vec<UploadedFile>,
    pub fields: HashMap<String, String>,
}

impl UploadForm {
    /// Reads every part of the form.
    pub async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();

        loop {
            let field = match multipart.next_field().await {
                Ok(Some(field)) => field,
                Ok(None) => break,
                Err(e) => return Err(multipart_error(e)),
            };

            let name = field.name().unwrap_or("").to_string();
            if name == "file" {
                let filename = field.file_name().unwrap_or("").to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                form.files.push(UploadedFile { filename, bytes });
            } else {
                let value = field.text().await.map_err(multipart_error)?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    /// The single uploaded file of a one-file endpoint.
    ///
    /// A missing part and a part without a filename are both rejected.
    pub fn single_file(&mut self) -> Result<UploadedFile, ApiError> {
        if self.files.is_empty() {
            return Err(bad_request("No file provided"));
        }
        let file = self.files.remove(0);
        if file.filename.trim().is_empty() {
            return Err(bad_request("No file selected"));
        }
        Ok(file)
    }

    /// Trimmed, non-empty value of a text field.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}
