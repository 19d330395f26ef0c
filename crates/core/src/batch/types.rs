//! Types for the batch module.

use serde::{Deserialize, Serialize};

use crate::converter::{ConversionError, ConvertedArtifact};
use crate::format::FormatTag;
use crate::store::ArtifactHandle;

/// Lifecycle of a job inside a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// One file of a batch, as tracked by the aggregator.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionJob {
    /// Position in the submitted batch.
    pub index: usize,
    pub filename: String,
    pub target_format: FormatTag,
    pub state: JobState,
}

/// Terminal status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    Succeeded,
    Failed,
}

/// Outcome of one job. Produced exactly once per job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionResult {
    pub index: usize,
    pub filename: String,
    pub source_format: FormatTag,
    pub target_format: FormatTag,
    pub status: ResultStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_handle: Option<ArtifactHandle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_filename: Option<String>,
    pub size_bytes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    pub duration_ms: u64,
}

impl ConversionResult {
    pub fn succeeded(
        index: usize,
        filename: impl Into<String>,
        artifact: ConvertedArtifact,
        duration_ms: u64,
    ) -> Self {
        Self {
            index,
            filename: filename.into(),
            source_format: artifact.source_format,
            target_format: artifact.target_format,
            status: ResultStatus::Succeeded,
            error_kind: None,
            error_detail: None,
            artifact_handle: Some(artifact.handle),
            output_filename: Some(artifact.output_filename),
            size_bytes: artifact.size_bytes,
            sha256: Some(artifact.sha256),
            duration_ms,
        }
    }

    pub fn failed(
        index: usize,
        filename: impl Into<String>,
        source_format: FormatTag,
        target_format: FormatTag,
        error: &ConversionError,
        duration_ms: u64,
    ) -> Self {
        Self {
            index,
            filename: filename.into(),
            source_format,
            target_format,
            status: ResultStatus::Failed,
            error_kind: Some(error.kind().to_string()),
            error_detail: Some(error.to_string()),
            artifact_handle: None,
            output_filename: None,
            size_bytes: 0,
            sha256: None,
            duration_ms,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResultStatus::Succeeded
    }
}

/// Rounded percentage of `completed` over `total`, half rounding up.
pub fn progress_percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let completed = completed.min(total) as u64;
    let total = total as u64;
    ((completed * 200 + total) / (2 * total)) as u8
}

/// Per-batch state, owned by the batch's aggregator task.
///
/// `completed_count` only grows and always equals the number of terminal
/// jobs.
#[derive(Debug, Clone)]
pub struct BatchState {
    jobs: Vec<ConversionJob>,
    completed_count: usize,
}

impl BatchState {
    pub fn new(jobs: Vec<ConversionJob>) -> Self {
        Self {
            jobs,
            completed_count: 0,
        }
    }

    pub fn jobs(&self) -> &[ConversionJob] {
        &self.jobs
    }

    pub fn total_jobs(&self) -> usize {
        self.jobs.len()
    }

    pub fn completed_count(&self) -> usize {
        self.completed_count
    }

    pub fn overall_progress(&self) -> u8 {
        progress_percent(self.completed_count, self.jobs.len())
    }

    pub fn is_complete(&self) -> bool {
        self.completed_count == self.jobs.len()
    }

    /// Moves a pending job to running. Ignored for any other state.
    pub fn mark_running(&mut self, index: usize) {
        if let Some(job) = self.jobs.get_mut(index) {
            if job.state == JobState::Pending {
                job.state = JobState::Running;
            }
        }
    }

    /// Records a terminal result. Returns `false` if the job was already
    /// terminal or the index is unknown.
    pub fn record(&mut self, result: &ConversionResult) -> bool {
        let Some(job) = self.jobs.get_mut(result.index) else {
            return false;
        };
        if job.state.is_terminal() {
            return false;
        }
        job.state = match result.status {
            ResultStatus::Succeeded => JobState::Succeeded,
            ResultStatus::Failed => JobState::Failed,
        };
        self.completed_count += 1;
        true
    }

    /// Builds a progress event carrying the given newly terminal results.
    pub fn event(&self, batch_id: &str, results: Vec<ConversionResult>) -> ProgressEvent {
        ProgressEvent {
            batch_id: batch_id.to_string(),
            completed_count: self.completed_count,
            total_jobs: self.jobs.len(),
            overall_progress: self.overall_progress(),
            results,
            done: self.is_complete(),
        }
    }
}

/// One frame of the progress stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub batch_id: String,
    pub completed_count: usize,
    pub total_jobs: usize,
    pub overall_progress: u8,
    /// Results that became terminal since the previous event.
    pub results: Vec<ConversionResult>,
    /// Set on the final event only.
    pub done: bool,
}

/// Aggregate outcome of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub batch_id: String,
    pub total_jobs: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Results in submission order.
    pub results: Vec<ConversionResult>,
    pub duration_ms: u64,
}

/// Status of the shared worker pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolStatus {
    /// Pool name.
    pub name: String,
    /// Number of jobs holding a worker slot.
    pub active_jobs: usize,
    /// Maximum concurrent jobs.
    pub max_concurrent: usize,
    /// Jobs waiting for a worker slot.
    pub queued_jobs: usize,
    /// Jobs that finished successfully since startup.
    pub total_processed: u64,
    /// Jobs that failed since startup.
    pub total_failed: u64,
    /// Batches accepted since startup.
    pub total_batches: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(index: usize) -> ConversionJob {
        ConversionJob {
            index,
            filename: format!("{}.png", index),
            target_format: FormatTag::Jpeg,
            state: JobState::Pending,
        }
    }

    fn failed(index: usize) -> ConversionResult {
        ConversionResult::failed(
            index,
            format!("{}.png", index),
            FormatTag::Png,
            FormatTag::Jpeg,
            &ConversionError::conversion_failed("boom"),
            1,
        )
    }

    #[test]
    fn test_progress_percent_rounding() {
        assert_eq!(progress_percent(0, 3), 0);
        assert_eq!(progress_percent(1, 3), 33);
        assert_eq!(progress_percent(2, 3), 67);
        assert_eq!(progress_percent(3, 3), 100);
        assert_eq!(progress_percent(1, 8), 13);
        assert_eq!(progress_percent(1, 200), 1);
        assert_eq!(progress_percent(0, 0), 100);
    }

    #[test]
    fn test_record_counts_each_job_once() {
        let mut state = BatchState::new(vec![job(0), job(1)]);
        state.mark_running(0);
        assert_eq!(state.jobs()[0].state, JobState::Running);

        assert!(state.record(&failed(0)));
        assert!(!state.record(&failed(0)));
        assert!(!state.record(&failed(7)));
        assert_eq!(state.completed_count(), 1);
        assert_eq!(state.overall_progress(), 50);
        assert!(!state.is_complete());

        assert!(state.record(&failed(1)));
        assert!(state.is_complete());

        let event = state.event("b1", vec![]);
        assert!(event.done);
        assert_eq!(event.overall_progress, 100);
        assert_eq!(event.completed_count, 2);
    }

    #[test]
    fn test_mark_running_ignores_terminal_jobs() {
        let mut state = BatchState::new(vec![job(0)]);
        state.record(&failed(0));
        state.mark_running(0);
        assert_eq!(state.jobs()[0].state, JobState::Failed);
    }

    #[test]
    fn test_failed_result_wire_form() {
        let json = serde_json::to_value(failed(2)).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["error_kind"], "conversion_failure");
        assert_eq!(json["source_format"], "PNG");
        assert!(json.get("artifact_handle").is_none());
    }
}
