//! Canonical format tags.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Canonical identifier for a recognized file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", from = "String")]
pub enum FormatTag {
    /// Portable Document Format
    Pdf,
    /// Portable Network Graphics
    Png,
    /// JPEG / JFIF
    Jpeg,
    /// Windows bitmap
    Bmp,
    /// Office Open XML word-processing document
    Docx,
    /// Not recognized by content or filename.
    Unknown,
}

impl FormatTag {
    /// Returns the upper-case wire name of this tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Png => "PNG",
            Self::Jpeg => "JPEG",
            Self::Bmp => "BMP",
            Self::Docx => "DOCX",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Bmp => "image/bmp",
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Self::Unknown => "application/octet-stream",
        }
    }

    /// Returns the canonical file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Bmp => "bmp",
            Self::Docx => "docx",
            Self::Unknown => "bin",
        }
    }

    /// Whether this is a raster image format.
    pub fn is_raster(&self) -> bool {
        matches!(self, Self::Png | Self::Jpeg | Self::Bmp)
    }

    /// Maps a MIME type (as produced by extension guessing) to a tag.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        let subtype = mime.rsplit('/').next()?.to_ascii_lowercase();
        match subtype.as_str() {
            "pdf" => Some(Self::Pdf),
            "png" => Some(Self::Png),
            "jpeg" | "pjpeg" => Some(Self::Jpeg),
            "bmp" | "x-ms-bmp" | "x-bmp" => Some(Self::Bmp),
            "vnd.openxmlformats-officedocument.wordprocessingml.document" => Some(Self::Docx),
            _ => None,
        }
    }

    /// Lossy parse: anything unrecognized becomes `Unknown`.
    pub fn parse_lossy(value: &str) -> Self {
        match value.trim().trim_start_matches('.').to_ascii_uppercase().as_str() {
            "PDF" => Self::Pdf,
            "PNG" => Self::Png,
            "JPEG" | "JPG" | "JPE" => Self::Jpeg,
            "BMP" => Self::Bmp,
            "DOCX" => Self::Docx,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for FormatTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormatTag {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse_lossy(s))
    }
}

impl From<String> for FormatTag {
    fn from(value: String) -> Self {
        Self::parse_lossy(&value)
    }
}
