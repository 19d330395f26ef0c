//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Conversions (per format pair, durations)
//! - Batches (started, sizes)
//! - Artifact store (stored, evicted, resident bytes)

use once_cell::sync::Lazy;
use prometheus::{
    Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts,
};

// =============================================================================
// Conversion Metrics
// =============================================================================

/// Conversions total by source format, target format and status.
pub static CONVERSIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("docshift_conversions_total", "Total file conversions"),
        &["source", "target", "status"], // status: "succeeded", "failed"
    )
    .unwrap()
});

/// Conversion duration in seconds by target format.
pub static CONVERSION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "docshift_conversion_duration_seconds",
            "Duration of single-file conversions",
        )
        .buckets(vec![0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 15.0, 60.0]),
        &["target"],
    )
    .unwrap()
});

// =============================================================================
// Batch Metrics
// =============================================================================

/// Batches accepted by the orchestrator.
pub static BATCHES_STARTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("docshift_batches_started_total", "Total batches started").unwrap()
});

/// Files per batch.
pub static BATCH_SIZE: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new("docshift_batch_size", "Number of files per batch")
            .buckets(vec![1.0, 2.0, 5.0, 10.0, 25.0, 50.0, 100.0]),
    )
    .unwrap()
});

// =============================================================================
// Artifact Store Metrics
// =============================================================================

/// Artifacts written to the store.
pub static ARTIFACTS_STORED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("docshift_artifacts_stored_total", "Total artifacts stored").unwrap()
});

/// Artifacts removed from the store by reason.
pub static ARTIFACTS_EVICTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("docshift_artifacts_evicted_total", "Total artifacts evicted"),
        &["reason"], // "explicit", "expired", "capacity", "undelivered"
    )
    .unwrap()
});

/// Bytes currently held by the store.
pub static STORE_BYTES: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("docshift_store_bytes", "Bytes currently held by the artifact store")
        .unwrap()
});

/// Returns all core metrics for registration with a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Conversions
        Box::new(CONVERSIONS_TOTAL.clone()),
        Box::new(CONVERSION_DURATION.clone()),
        // Batches
        Box::new(BATCHES_STARTED.clone()),
        Box::new(BATCH_SIZE.clone()),
        // Store
        Box::new(ARTIFACTS_STORED.clone()),
        Box::new(ARTIFACTS_EVICTED.clone()),
        Box::new(STORE_BYTES.clone()),
    ]
}
