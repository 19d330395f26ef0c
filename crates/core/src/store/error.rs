//! Error types for the artifact store.

use thiserror::Error;

/// Artifact store errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Unknown, evicted or expired handle.
    #[error("Artifact not found: {handle}")]
    NotFound { handle: String },

    /// A single artifact is larger than the whole store may hold.
    #[error("Artifact of {size_bytes} bytes exceeds store capacity of {capacity_bytes} bytes")]
    TooLarge {
        size_bytes: u64,
        capacity_bytes: u64,
    },
}

impl StoreError {
    pub fn not_found(handle: impl Into<String>) -> Self {
        Self::NotFound {
            handle: handle.into(),
        }
    }

    /// Wire name of the error category.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "artifact_not_found",
            Self::TooLarge { .. } => "artifact_too_large",
        }
    }
}
