//! Error types for the batch module.

use thiserror::Error;

/// Structural batch faults. These reject the whole batch before any job
/// starts; per-file failures never surface here.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BatchError {
    #[error("Batch contains no files")]
    EmptyBatch,

    #[error("Batch contains {count} files, the limit is {max}")]
    TooManyFiles { count: usize, max: usize },
}

impl BatchError {
    /// Wire name of the error category.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EmptyBatch => "empty_batch",
            Self::TooManyFiles { .. } => "too_many_files",
        }
    }
}
