//! Batch orchestrator implementation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::{self, error::SendError};
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::converter::{ConversionError, ConversionRequest, Converter};
use crate::format::detect;
use crate::metrics;
use crate::store::{ArtifactStore, EvictionReason};

use super::config::BatchConfig;
use super::error::BatchError;
use super::types::{
    BatchState, BatchSummary, ConversionJob, ConversionResult, JobState, PoolStatus,
    ProgressEvent,
};

/// Tracks statistics for the worker pool.
#[derive(Default)]
struct PoolStats {
    active: AtomicU64,
    queued: AtomicU64,
    total_processed: AtomicU64,
    total_failed: AtomicU64,
    total_batches: AtomicU64,
}

impl PoolStats {
    fn to_status(&self, name: &str, max_concurrent: usize) -> PoolStatus {
        PoolStatus {
            name: name.to_string(),
            active_jobs: self.active.load(Ordering::Relaxed) as usize,
            max_concurrent,
            queued_jobs: self.queued.load(Ordering::Relaxed) as usize,
            total_processed: self.total_processed.load(Ordering::Relaxed),
            total_failed: self.total_failed.load(Ordering::Relaxed),
            total_batches: self.total_batches.load(Ordering::Relaxed),
        }
    }
}

/// Worker notifications, drained by the batch aggregator.
enum WorkerMessage {
    Started(usize),
    Finished(ConversionResult),
}

/// A running batch: its id and the progress stream.
///
/// Dropping the handle before the final event counts as a disconnect:
/// jobs still run to completion, but artifacts whose results can no longer
/// be delivered are evicted.
#[derive(Debug)]
pub struct BatchHandle {
    pub batch_id: String,
    pub total_jobs: usize,
    events: mpsc::Receiver<ProgressEvent>,
}

impl BatchHandle {
    /// Waits for the next progress event. `None` after the final event.
    pub async fn next_event(&mut self) -> Option<ProgressEvent> {
        self.events.recv().await
    }

    /// Gives up the handle for the raw event receiver.
    pub fn into_receiver(self) -> mpsc::Receiver<ProgressEvent> {
        self.events
    }
}

/// Runs batches of conversions on a bounded worker pool shared across
/// batches.
pub struct BatchOrchestrator<C: Converter> {
    config: BatchConfig,
    converter: Arc<C>,
    store: Arc<ArtifactStore>,
    semaphore: Arc<Semaphore>,
    stats: Arc<PoolStats>,
}

impl<C: Converter + 'static> BatchOrchestrator<C> {
    /// Creates a new orchestrator.
    pub fn new(config: BatchConfig, converter: C, store: Arc<ArtifactStore>) -> Self {
        Self::with_shared_converter(config, Arc::new(converter), store)
    }

    /// Creates an orchestrator around a converter that is also used
    /// elsewhere.
    pub fn with_shared_converter(
        config: BatchConfig,
        converter: Arc<C>,
        store: Arc<ArtifactStore>,
    ) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_parallel_jobs));
        Self {
            config,
            converter,
            store,
            semaphore,
            stats: Arc::new(PoolStats::default()),
        }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    pub fn converter(&self) -> &Arc<C> {
        &self.converter
    }

    /// Returns the current worker pool status.
    pub fn status(&self) -> PoolStatus {
        self.stats.to_status("conversion", self.config.max_parallel_jobs)
    }

    fn validate(&self, requests: &[ConversionRequest]) -> Result<(), BatchError> {
        if requests.is_empty() {
            return Err(BatchError::EmptyBatch);
        }
        if requests.len() > self.config.max_files_per_batch {
            return Err(BatchError::TooManyFiles {
                count: requests.len(),
                max: self.config.max_files_per_batch,
            });
        }
        Ok(())
    }

    /// Starts a batch and returns its progress stream.
    ///
    /// The first event has `completed_count == 0`; the last has `done` set
    /// and `completed_count == total_jobs`. Every job yields exactly one
    /// result across the stream.
    pub fn start_batch(&self, requests: Vec<ConversionRequest>) -> Result<BatchHandle, BatchError> {
        self.validate(&requests)?;

        let batch_id = Uuid::new_v4().to_string();
        let total_jobs = requests.len();

        let jobs = requests
            .iter()
            .enumerate()
            .map(|(index, request)| ConversionJob {
                index,
                filename: request.source_filename.clone(),
                target_format: request.target_format,
                state: JobState::Pending,
            })
            .collect();

        self.stats.total_batches.fetch_add(1, Ordering::Relaxed);
        metrics::BATCHES_STARTED.inc();
        metrics::BATCH_SIZE.observe(total_jobs as f64);
        info!(batch_id = %batch_id, total_jobs, "Starting batch");

        // Each worker sends at most two messages, so workers never wait here.
        let (worker_tx, worker_rx) = mpsc::channel(total_jobs * 2);
        let (events_tx, events_rx) = mpsc::channel(self.config.event_buffer.max(1));

        for (index, request) in requests.into_iter().enumerate() {
            self.spawn_worker(index, request, worker_tx.clone());
        }
        drop(worker_tx);

        tokio::spawn(aggregate(
            batch_id.clone(),
            BatchState::new(jobs),
            worker_rx,
            events_tx,
            Arc::clone(&self.store),
        ));

        Ok(BatchHandle {
            batch_id,
            total_jobs,
            events: events_rx,
        })
    }

    fn spawn_worker(
        &self,
        index: usize,
        request: ConversionRequest,
        worker_tx: mpsc::Sender<WorkerMessage>,
    ) {
        let converter = Arc::clone(&self.converter);
        let semaphore = Arc::clone(&self.semaphore);
        let stats = Arc::clone(&self.stats);

        stats.queued.fetch_add(1, Ordering::Relaxed);
        tokio::spawn(async move {
            let permit = semaphore.acquire_owned().await;
            stats.queued.fetch_sub(1, Ordering::Relaxed);
            stats.active.fetch_add(1, Ordering::Relaxed);
            let _ = worker_tx.send(WorkerMessage::Started(index)).await;

            let start = Instant::now();
            let filename = request.source_filename.clone();
            let target_format = request.target_format;
            let source_format = detect(&request.source_bytes, &request.source_filename);

            let outcome = if permit.is_err() {
                Err(ConversionError::conversion_failed("worker pool is closed"))
            } else {
                // A panicking converter must still produce a result.
                match tokio::spawn(async move { converter.convert(&request).await }).await {
                    Ok(outcome) => outcome,
                    Err(join_err) => Err(ConversionError::conversion_failed(format!(
                        "converter task failed: {}",
                        join_err
                    ))),
                }
            };
            let duration_ms = start.elapsed().as_millis() as u64;

            let result = match outcome {
                Ok(artifact) => {
                    stats.total_processed.fetch_add(1, Ordering::Relaxed);
                    ConversionResult::succeeded(index, filename, artifact, duration_ms)
                }
                Err(e) => {
                    stats.total_failed.fetch_add(1, Ordering::Relaxed);
                    ConversionResult::failed(
                        index,
                        filename,
                        source_format,
                        target_format,
                        &e,
                        duration_ms,
                    )
                }
            };
            stats.active.fetch_sub(1, Ordering::Relaxed);
            drop(permit);

            let _ = worker_tx.send(WorkerMessage::Finished(result)).await;
        });
    }

    /// Runs a batch to completion and returns the aggregate summary.
    ///
    /// Drives the same state machine as `start_batch`; dropping the future
    /// is a disconnect.
    pub async fn run_batch(
        &self,
        requests: Vec<ConversionRequest>,
    ) -> Result<BatchSummary, BatchError> {
        let start = Instant::now();
        let mut handle = self.start_batch(requests)?;
        let mut results = Vec::with_capacity(handle.total_jobs);

        while let Some(event) = handle.next_event().await {
            results.extend(event.results);
            if event.done {
                break;
            }
        }
        results.sort_by_key(|r| r.index);

        let succeeded = results.iter().filter(|r| r.is_success()).count();
        Ok(BatchSummary {
            batch_id: handle.batch_id,
            total_jobs: handle.total_jobs,
            succeeded,
            failed: results.len() - succeeded,
            results,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}

fn apply(
    state: &mut BatchState,
    message: WorkerMessage,
    newly_terminal: &mut Vec<ConversionResult>,
) {
    match message {
        WorkerMessage::Started(index) => state.mark_running(index),
        WorkerMessage::Finished(result) => {
            if state.record(&result) {
                newly_terminal.push(result);
            }
        }
    }
}

async fn evict_undelivered(store: &ArtifactStore, results: &[ConversionResult]) {
    for handle in results.iter().filter_map(|r| r.artifact_handle.as_ref()) {
        if store
            .evict_with_reason(handle, EvictionReason::Undelivered)
            .await
            .is_ok()
        {
            debug!(handle = %handle, "Evicted undelivered artifact");
        }
    }
}

/// Sole writer of the batch state. Turns worker notifications into
/// progress events, coalescing completions that are already queued.
async fn aggregate(
    batch_id: String,
    mut state: BatchState,
    mut worker_rx: mpsc::Receiver<WorkerMessage>,
    events_tx: mpsc::Sender<ProgressEvent>,
    store: Arc<ArtifactStore>,
) {
    let mut abandoned = events_tx.send(state.event(&batch_id, Vec::new())).await.is_err();

    while !state.is_complete() {
        let Some(message) = worker_rx.recv().await else {
            error!(
                batch_id = %batch_id,
                completed = state.completed_count(),
                total = state.total_jobs(),
                "Workers exited before the batch completed"
            );
            return;
        };

        let mut newly_terminal = Vec::new();
        apply(&mut state, message, &mut newly_terminal);
        while let Ok(message) = worker_rx.try_recv() {
            apply(&mut state, message, &mut newly_terminal);
        }
        if newly_terminal.is_empty() {
            continue;
        }

        if abandoned {
            evict_undelivered(&store, &newly_terminal).await;
            continue;
        }

        let event = state.event(&batch_id, newly_terminal);
        debug!(
            batch_id = %batch_id,
            completed = event.completed_count,
            total = event.total_jobs,
            progress = event.overall_progress,
            "Batch progress"
        );
        if let Err(SendError(event)) = events_tx.send(event).await {
            warn!(
                batch_id = %batch_id,
                "Progress consumer went away, remaining artifacts will be evicted"
            );
            abandoned = true;
            evict_undelivered(&store, &event.results).await;
        }
    }

    let failed = state
        .jobs()
        .iter()
        .filter(|j| j.state == JobState::Failed)
        .count();
    info!(
        batch_id = %batch_id,
        total_jobs = state.total_jobs(),
        failed,
        abandoned,
        "Batch complete"
    );
}
