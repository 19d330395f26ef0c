//! Trait definitions for the converter module.

use async_trait::async_trait;

use super::error::ConversionError;
use super::types::{ConversionRequest, ConvertedArtifact};

/// Converts one file and stores the result.
///
/// Implementations must never panic across this boundary: every failure is
/// reported as a `ConversionError` so the orchestrator can record it against
/// the single file it belongs to.
#[async_trait]
pub trait Converter: Send + Sync {
    /// Returns the name of this converter implementation.
    fn name(&self) -> &str;

    /// Converts a single file and returns a handle to the stored output.
    async fn convert(&self, request: &ConversionRequest)
        -> Result<ConvertedArtifact, ConversionError>;
}
