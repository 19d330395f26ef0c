//! Types for the converter module.

use bytes::Bytes;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use super::error::ConversionError;
use crate::format::FormatTag;
use crate::store::ArtifactHandle;

/// Lowest accepted numeric quality.
pub const MIN_QUALITY: u8 = 1;
/// Highest accepted numeric quality.
pub const MAX_QUALITY: u8 = 100;

/// Named compression tier for document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompressionTier {
    Low,
    Medium,
    High,
}

impl CompressionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Parses a tier name, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

impl fmt::Display for CompressionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-supplied compression options, as received on the wire.
///
/// Serialized externally tagged: `{"quality": 80}` or `{"tier": "medium"}`.
/// Quality is signed so out-of-range values survive until clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompressionOptions {
    Quality(i64),
    Tier(CompressionTier),
}

/// Compression parameters a strategy accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OptionShape {
    /// Numeric quality in `[min, max]`.
    Quality { min: u8, max: u8, default: u8 },
    /// One of the named tiers.
    Tier { default: CompressionTier },
    /// No tunable compression.
    None,
}

/// Options after validation against a strategy's shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvedOptions {
    Quality(u8),
    Tier(CompressionTier),
    None,
}

impl OptionShape {
    /// Numeric quality shape over the full `[1, 100]` range.
    pub fn quality(default: u8) -> Self {
        Self::Quality {
            min: MIN_QUALITY,
            max: MAX_QUALITY,
            default: clamp_quality(default as i64),
        }
    }

    /// Validates caller options against this shape.
    ///
    /// Out-of-range quality is clamped, a tier where a quality is expected
    /// (or vice versa) is rejected, and options given to a shape-less
    /// strategy are ignored.
    pub fn resolve(
        &self,
        options: Option<&CompressionOptions>,
    ) -> Result<ResolvedOptions, ConversionError> {
        match (self, options) {
            (Self::None, _) => Ok(ResolvedOptions::None),
            (Self::Quality { default, .. }, None) => Ok(ResolvedOptions::Quality(*default)),
            (Self::Quality { min, max, .. }, Some(CompressionOptions::Quality(q))) => {
                Ok(ResolvedOptions::Quality((*q).clamp(*min as i64, *max as i64) as u8))
            }
            (Self::Quality { .. }, Some(CompressionOptions::Tier(tier))) => {
                Err(ConversionError::invalid_option(format!(
                    "expected a numeric quality, got tier '{}'",
                    tier
                )))
            }
            (Self::Tier { default }, None) => Ok(ResolvedOptions::Tier(*default)),
            (Self::Tier { .. }, Some(CompressionOptions::Tier(tier))) => {
                Ok(ResolvedOptions::Tier(*tier))
            }
            (Self::Tier { .. }, Some(CompressionOptions::Quality(q))) => {
                Err(ConversionError::invalid_option(format!(
                    "expected a tier (low, medium, high), got quality {}",
                    q
                )))
            }
        }
    }
}

/// Clamps a numeric quality into `[MIN_QUALITY, MAX_QUALITY]`.
pub fn clamp_quality(quality: i64) -> u8 {
    quality.clamp(MIN_QUALITY as i64, MAX_QUALITY as i64) as u8
}

/// A single-file conversion request. Immutable once created.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    /// Opaque source payload.
    pub source_bytes: Bytes,
    /// Name the caller uploaded the file under.
    pub source_filename: String,
    /// Requested output format.
    pub target_format: FormatTag,
    /// Format-dependent compression options.
    pub compression: Option<CompressionOptions>,
}

impl ConversionRequest {
    pub fn new(
        source_bytes: impl Into<Bytes>,
        source_filename: impl Into<String>,
        target_format: FormatTag,
    ) -> Self {
        Self {
            source_bytes: source_bytes.into(),
            source_filename: source_filename.into(),
            target_format,
            compression: None,
        }
    }

    /// Sets the compression options.
    pub fn with_compression(mut self, compression: CompressionOptions) -> Self {
        self.compression = Some(compression);
        self
    }

    /// Sets a numeric quality.
    pub fn with_quality(self, quality: i64) -> Self {
        self.with_compression(CompressionOptions::Quality(quality))
    }

    /// Sets a compression tier.
    pub fn with_tier(self, tier: CompressionTier) -> Self {
        self.with_compression(CompressionOptions::Tier(tier))
    }
}

/// Output of a successful single-file conversion.
#[derive(Debug, Clone, Serialize)]
pub struct ConvertedArtifact {
    /// Handle to download the converted bytes.
    pub handle: ArtifactHandle,
    /// Suggested download filename.
    pub output_filename: String,
    /// Detected source format.
    pub source_format: FormatTag,
    /// Produced format.
    pub target_format: FormatTag,
    /// Size of the converted bytes.
    pub size_bytes: u64,
    /// Hex SHA-256 of the converted bytes.
    pub sha256: String,
    /// Options the strategy ran with.
    pub options: ResolvedOptions,
}

static UNSAFE_FILENAME_CHARS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^A-Za-z0-9._-]+").expect("filename sanitizer regex is valid")
});

/// Builds the download filename: sanitized source stem plus target extension.
pub fn output_filename(source_filename: &str, target: FormatTag) -> String {
    let stem = Path::new(source_filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let stem = UNSAFE_FILENAME_CHARS.replace_all(stem, "_");
    let stem = stem.trim_matches(|c| c == '_' || c == '.');
    let stem = if stem.is_empty() { "converted" } else { stem };
    format!("{}.{}", stem, target.extension())
}
