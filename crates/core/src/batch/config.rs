//! Configuration for the batch module.

use serde::{Deserialize, Serialize};

/// Configuration for batch orchestration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchConfig {
    /// Size of the worker pool shared by all batches.
    #[serde(default = "default_max_parallel_jobs")]
    pub max_parallel_jobs: usize,

    /// Largest batch accepted.
    #[serde(default = "default_max_files_per_batch")]
    pub max_files_per_batch: usize,

    /// Progress events buffered per batch before the aggregator waits on
    /// the consumer.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

fn default_max_parallel_jobs() -> usize {
    4
}

fn default_max_files_per_batch() -> usize {
    100
}

fn default_event_buffer() -> usize {
    64
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_parallel_jobs: default_max_parallel_jobs(),
            max_files_per_batch: default_max_files_per_batch(),
            event_buffer: default_event_buffer(),
        }
    }
}

impl BatchConfig {
    /// Sets the worker pool size.
    pub fn with_max_parallel(mut self, max: usize) -> Self {
        self.max_parallel_jobs = max;
        self
    }

    /// Sets the largest accepted batch.
    pub fn with_max_files(mut self, max: usize) -> Self {
        self.max_files_per_batch = max;
        self
    }

    pub fn with_event_buffer(mut self, size: usize) -> Self {
        self.event_buffer = size;
        self
    }
}
