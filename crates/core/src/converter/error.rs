//! Error types for the converter module.

use thiserror::Error;

use crate::format::FormatTag;

/// Per-file conversion failures.
///
/// None of these abort a batch: each is captured into the failing file's
/// `ConversionResult`.
#[derive(Debug, Clone, Error)]
pub enum ConversionError {
    /// Neither content nor filename identified the source format.
    #[error("Format not recognized for '{filename}'")]
    UnrecognizedFormat { filename: String },

    /// No strategy registered for the requested pair.
    #[error("Conversion from {source_format} to {target_format} is not supported")]
    UnsupportedConversion {
        source_format: FormatTag,
        target_format: FormatTag,
    },

    /// Compression option does not match the strategy's declared shape.
    #[error("Invalid compression option: {reason}")]
    InvalidCompressionOption { reason: String },

    /// Underlying codec or document library failed.
    #[error("Conversion failed: {reason}")]
    ConversionFailed { reason: String },

    /// Conversion exceeded its execution budget.
    #[error("Conversion timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// Converted bytes could not be stored.
    #[error("Failed to store artifact: {reason}")]
    StoreFailed { reason: String },
}

impl ConversionError {
    /// Creates a new conversion failed error.
    pub fn conversion_failed(reason: impl Into<String>) -> Self {
        Self::ConversionFailed {
            reason: reason.into(),
        }
    }

    /// Creates a new invalid compression option error.
    pub fn invalid_option(reason: impl Into<String>) -> Self {
        Self::InvalidCompressionOption {
            reason: reason.into(),
        }
    }

    /// Wire name of the error category.
    ///
    /// Timeouts and storage failures are reported as conversion failures;
    /// their detail text tells them apart.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnrecognizedFormat { .. } => "unrecognized_format",
            Self::UnsupportedConversion { .. } => "unsupported_conversion",
            Self::InvalidCompressionOption { .. } => "invalid_compression_option",
            Self::ConversionFailed { .. } | Self::Timeout { .. } | Self::StoreFailed { .. } => {
                "conversion_failure"
            }
        }
    }

    /// Whether this error is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

impl From<image::ImageError> for ConversionError {
    fn from(err: image::ImageError) -> Self {
        Self::conversion_failed(format!("image codec error: {}", err))
    }
}

impl From<lopdf::Error> for ConversionError {
    fn from(err: lopdf::Error) -> Self {
        Self::conversion_failed(format!("PDF error: {}", err))
    }
}

impl From<zip::result::ZipError> for ConversionError {
    fn from(err: zip::result::ZipError) -> Self {
        Self::conversion_failed(format!("DOCX packaging error: {}", err))
    }
}

impl From<std::io::Error> for ConversionError {
    fn from(err: std::io::Error) -> Self {
        Self::conversion_failed(format!("I/O error: {}", err))
    }
}
