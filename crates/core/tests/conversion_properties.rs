//! End-to-end properties of the built-in strategies.
//!
//! Everything here runs the real codecs through `FileConverter` and the
//! in-memory store; no mocks.

use std::sync::Arc;

use tokio_test::assert_err;

use docshift_core::{
    detect,
    testing::fixtures,
    ArtifactStore, BatchConfig, BatchOrchestrator, CompressionTier, ConversionRequest, Converter,
    FileConverter, FormatTag, ResultStatus, StoreError, StrategyRegistry,
};

fn sample_for(format: FormatTag) -> (Vec<u8>, &'static str) {
    match format {
        FormatTag::Png => (fixtures::sample_png(), "sample.png"),
        FormatTag::Jpeg => (fixtures::sample_jpeg(), "sample.jpg"),
        FormatTag::Bmp => (fixtures::sample_bmp(), "sample.bmp"),
        FormatTag::Pdf => (fixtures::sample_pdf("Sample document"), "sample.pdf"),
        other => panic!("no sample for {}", other),
    }
}

fn converter() -> (FileConverter, Arc<ArtifactStore>) {
    let store = Arc::new(ArtifactStore::default());
    (FileConverter::with_defaults(Arc::clone(&store)), store)
}

async fn converted_bytes(
    converter: &FileConverter,
    store: &ArtifactStore,
    request: ConversionRequest,
) -> Vec<u8> {
    let artifact = converter
        .convert(&request)
        .await
        .unwrap_or_else(|e| panic!("{} failed: {}", request.source_filename, e));
    store.get(&artifact.handle).await.unwrap().bytes.to_vec()
}

#[tokio::test]
async fn test_every_registered_pair_produces_its_target() {
    let (converter, store) = converter();
    let pairs = StrategyRegistry::with_defaults().list();
    assert!(!pairs.is_empty());

    for info in pairs {
        let (bytes, name) = sample_for(info.source_format);
        let request = ConversionRequest::new(bytes, name, info.target_format);
        let output = converted_bytes(&converter, &store, request).await;

        assert_eq!(
            detect(&output, "output"),
            info.target_format,
            "{} -> {} produced something else",
            info.source_format,
            info.target_format
        );
    }
}

#[tokio::test]
async fn test_sample_pdf_to_docx_is_downloadable() {
    let (converter, store) = converter();
    let request = ConversionRequest::new(
        fixtures::sample_pdf("Hello from a PDF"),
        "sample.pdf",
        FormatTag::Docx,
    );

    let artifact = converter.convert(&request).await.unwrap();
    assert_eq!(artifact.source_format, FormatTag::Pdf);
    assert_eq!(artifact.output_filename, "sample.docx");

    let stored = store.get(&artifact.handle).await.unwrap();
    assert_eq!(stored.meta.format, FormatTag::Docx);
    assert_eq!(stored.meta.sha256, artifact.sha256);
    assert_eq!(detect(&stored.bytes, "anything"), FormatTag::Docx);
}

#[tokio::test]
async fn test_quality_clamping_is_equivalent() {
    let (converter, store) = converter();

    let at = |quality: i64| {
        ConversionRequest::new(fixtures::sample_png(), "photo.png", FormatTag::Jpeg)
            .with_quality(quality)
    };

    let over = converted_bytes(&converter, &store, at(150)).await;
    let max = converted_bytes(&converter, &store, at(100)).await;
    assert_eq!(over, max);

    let zero = converted_bytes(&converter, &store, at(0)).await;
    let min = converted_bytes(&converter, &store, at(1)).await;
    assert_eq!(zero, min);

    assert_ne!(max, min);
}

#[tokio::test]
async fn test_detection_is_idempotent() {
    let samples = [
        (fixtures::sample_png(), "a.png"),
        (fixtures::sample_jpeg(), "b.jpg"),
        (fixtures::sample_bmp(), "c.bmp"),
        (fixtures::sample_pdf("x"), "d.pdf"),
        (fixtures::plain_text(), "e.txt"),
        (fixtures::truncated_jpeg(), "f.jpg"),
    ];

    for (bytes, name) in samples {
        assert_eq!(detect(&bytes, name), detect(&bytes, name), "{}", name);
    }
}

#[tokio::test]
async fn test_corrupt_jpeg_fails_but_batch_completes() {
    let store = Arc::new(ArtifactStore::default());
    let orch = BatchOrchestrator::new(
        BatchConfig::default(),
        FileConverter::with_defaults(Arc::clone(&store)),
        Arc::clone(&store),
    );

    let mut handle = orch
        .start_batch(vec![ConversionRequest::new(
            fixtures::truncated_jpeg(),
            "corrupt.jpg",
            FormatTag::Png,
        )])
        .unwrap();

    let mut results = Vec::new();
    let mut last = None;
    while let Some(event) = handle.next_event().await {
        results.extend(event.results.clone());
        last = Some(event);
    }

    let last = last.unwrap();
    assert!(last.done);
    assert_eq!(last.completed_count, 1);
    assert_eq!(last.total_jobs, 1);
    assert_eq!(last.overall_progress, 100);

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].status, ResultStatus::Failed);
    assert_eq!(results[0].error_kind.as_deref(), Some("conversion_failure"));
    assert!(!results[0].error_detail.as_deref().unwrap_or("").is_empty());
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_mixed_batch_yields_independent_results() {
    let store = Arc::new(ArtifactStore::default());
    let orch = BatchOrchestrator::new(
        BatchConfig::default(),
        FileConverter::with_defaults(Arc::clone(&store)),
        Arc::clone(&store),
    );

    let summary = orch
        .run_batch(vec![
            ConversionRequest::new(fixtures::sample_png(), "a.png", FormatTag::Jpeg)
                .with_quality(80),
            ConversionRequest::new(fixtures::sample_pdf("b"), "b.pdf", FormatTag::Docx)
                .with_tier(CompressionTier::Medium),
        ])
        .await
        .unwrap();

    assert_eq!(summary.total_jobs, 2);
    assert_eq!(summary.succeeded, 2);

    let a = &summary.results[0];
    let b = &summary.results[1];
    assert_eq!((a.filename.as_str(), a.target_format), ("a.png", FormatTag::Jpeg));
    assert_eq!((b.filename.as_str(), b.target_format), ("b.pdf", FormatTag::Docx));
    assert_ne!(a.artifact_handle, b.artifact_handle);

    for result in &summary.results {
        let handle = result.artifact_handle.as_ref().unwrap();
        let stored = store.get(handle).await.unwrap();
        assert_eq!(detect(&stored.bytes, "x"), result.target_format);
    }
}

#[tokio::test]
async fn test_download_round_trip_until_evicted() {
    let (converter, store) = converter();
    let request = ConversionRequest::new(fixtures::sample_bmp(), "pic.bmp", FormatTag::Png);
    let artifact = converter.convert(&request).await.unwrap();

    let first = store.get(&artifact.handle).await.unwrap();
    let second = store.get(&artifact.handle).await.unwrap();
    assert_eq!(first.bytes, second.bytes);

    store.evict(&artifact.handle).await.unwrap();
    let err = assert_err!(store.get(&artifact.handle).await);
    assert!(matches!(err, StoreError::NotFound { .. }));
}
