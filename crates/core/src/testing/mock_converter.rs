//! Mock converter for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::converter::{
    output_filename, CompressionOptions, ConversionError, ConversionRequest, ConvertedArtifact,
    Converter, ResolvedOptions,
};
use crate::format::{detect, FormatTag};
use crate::store::{ArtifactHandle, ArtifactStore};

/// A recorded conversion for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedConversion {
    pub filename: String,
    pub target_format: FormatTag,
    pub compression: Option<CompressionOptions>,
    /// Whether the conversion succeeded.
    pub success: bool,
}

/// Mock implementation of the Converter trait.
///
/// Provides controllable behavior for testing:
/// - Track conversions for assertions
/// - Fail specific files by name
/// - Delay specific files (or all of them)
/// - Observe peak concurrency
///
/// Successful conversions echo the source bytes. With a store attached the
/// echo is stored like a real artifact; otherwise only a handle is minted.
///
/// Clones share all state.
#[derive(Debug, Clone)]
pub struct MockConverter {
    /// Recorded conversions.
    conversions: Arc<RwLock<Vec<RecordedConversion>>>,
    /// Scripted failures by source filename.
    failures: Arc<RwLock<HashMap<String, ConversionError>>>,
    /// Simulated durations by source filename.
    delays: Arc<RwLock<HashMap<String, Duration>>>,
    /// Simulated duration for files without their own delay.
    default_delay: Arc<RwLock<Duration>>,
    store: Option<Arc<ArtifactStore>>,
    active: Arc<AtomicUsize>,
    max_active: Arc<AtomicUsize>,
}

impl Default for MockConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl MockConverter {
    /// Create a new mock converter.
    pub fn new() -> Self {
        Self {
            conversions: Arc::new(RwLock::new(Vec::new())),
            failures: Arc::new(RwLock::new(HashMap::new())),
            delays: Arc::new(RwLock::new(HashMap::new())),
            default_delay: Arc::new(RwLock::new(Duration::ZERO)),
            store: None,
            active: Arc::new(AtomicUsize::new(0)),
            max_active: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a mock that puts its output into `store`.
    pub fn with_store(store: Arc<ArtifactStore>) -> Self {
        Self {
            store: Some(store),
            ..Self::new()
        }
    }

    /// Get all recorded conversions.
    pub async fn recorded_conversions(&self) -> Vec<RecordedConversion> {
        self.conversions.read().await.clone()
    }

    /// Get the number of conversions performed.
    pub async fn conversion_count(&self) -> usize {
        self.conversions.read().await.len()
    }

    /// Make every conversion of `filename` fail with `error`.
    pub async fn set_failure(&self, filename: impl Into<String>, error: ConversionError) {
        self.failures.write().await.insert(filename.into(), error);
    }

    /// Set the simulated duration for `filename`.
    pub async fn set_delay(&self, filename: impl Into<String>, delay: Duration) {
        self.delays.write().await.insert(filename.into(), delay);
    }

    /// Set the simulated duration for files without their own delay.
    pub async fn set_default_delay(&self, delay: Duration) {
        *self.default_delay.write().await = delay;
    }

    /// Highest number of conversions that ran at the same time.
    pub fn max_concurrent(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    async fn delay_for(&self, filename: &str) -> Duration {
        match self.delays.read().await.get(filename) {
            Some(delay) => *delay,
            None => *self.default_delay.read().await,
        }
    }

    async fn run(&self, request: &ConversionRequest) -> Result<ConvertedArtifact, ConversionError> {
        let delay = self.delay_for(&request.source_filename).await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.failures.read().await.get(&request.source_filename) {
            return Err(error.clone());
        }

        let source_format = detect(&request.source_bytes, &request.source_filename);
        let output_filename = output_filename(&request.source_filename, request.target_format);
        let (handle, sha256) = match &self.store {
            Some(store) => {
                let meta = store
                    .put(
                        request.source_bytes.clone(),
                        output_filename.clone(),
                        request.target_format,
                    )
                    .await
                    .map_err(|e| ConversionError::StoreFailed {
                        reason: e.to_string(),
                    })?;
                (meta.handle, meta.sha256)
            }
            None => (ArtifactHandle::new(), String::new()),
        };

        Ok(ConvertedArtifact {
            handle,
            output_filename,
            source_format,
            target_format: request.target_format,
            size_bytes: request.source_bytes.len() as u64,
            sha256,
            options: ResolvedOptions::None,
        })
    }
}

#[async_trait]
impl Converter for MockConverter {
    fn name(&self) -> &str {
        "mock"
    }

    async fn convert(
        &self,
        request: &ConversionRequest,
    ) -> Result<ConvertedArtifact, ConversionError> {
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now_active, Ordering::SeqCst);

        let result = self.run(request).await;

        self.active.fetch_sub(1, Ordering::SeqCst);
        self.conversions.write().await.push(RecordedConversion {
            filename: request.source_filename.clone(),
            target_format: request.target_format,
            compression: request.compression,
            success: result.is_ok(),
        });
        result
    }
}
