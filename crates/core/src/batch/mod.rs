//! Batch orchestration.
//!
//! A batch is an ordered list of conversion requests. The orchestrator
//! fans the jobs out over a bounded worker pool shared by all batches and
//! a per-batch aggregator task folds worker notifications into a stream
//! of progress events. One file failing never affects its siblings.
//!
//! # Example
//!
//! ```ignore
//! use docshift_core::batch::{BatchConfig, BatchOrchestrator};
//!
//! let orchestrator = BatchOrchestrator::new(BatchConfig::default(), converter, store);
//! let mut batch = orchestrator.start_batch(requests)?;
//! while let Some(event) = batch.next_event().await {
//!     println!("{}/{} ({}%)", event.completed_count, event.total_jobs, event.overall_progress);
//! }
//! ```

mod config;
mod error;
mod orchestrator;
mod types;

pub use config::BatchConfig;
pub use error::BatchError;
pub use orchestrator::{BatchHandle, BatchOrchestrator};
pub use types::{
    progress_percent, BatchState, BatchSummary, ConversionJob, ConversionResult, JobState,
    PoolStatus, ProgressEvent, ResultStatus,
};
