//! Registry-backed converter implementation.

use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use super::config::ConverterConfig;
use super::error::ConversionError;
use super::registry::StrategyRegistry;
use super::traits::Converter;
use super::types::{output_filename, ConversionRequest, ConvertedArtifact};
use crate::format::{detect, FormatTag};
use crate::metrics;
use crate::store::ArtifactStore;

/// Converts files with the strategies of a `StrategyRegistry` and keeps the
/// output in an `ArtifactStore`.
pub struct FileConverter {
    registry: Arc<StrategyRegistry>,
    store: Arc<ArtifactStore>,
    config: ConverterConfig,
}

impl FileConverter {
    pub fn new(
        registry: Arc<StrategyRegistry>,
        store: Arc<ArtifactStore>,
        config: ConverterConfig,
    ) -> Self {
        Self {
            registry,
            store,
            config,
        }
    }

    /// Creates a converter with the built-in strategies and default config.
    pub fn with_defaults(store: Arc<ArtifactStore>) -> Self {
        Self::new(
            Arc::new(StrategyRegistry::with_defaults()),
            store,
            ConverterConfig::default(),
        )
    }

    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    pub fn store(&self) -> &Arc<ArtifactStore> {
        &self.store
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    async fn convert_detected(
        &self,
        request: &ConversionRequest,
        source_format: FormatTag,
    ) -> Result<ConvertedArtifact, ConversionError> {
        if source_format == FormatTag::Unknown {
            return Err(ConversionError::UnrecognizedFormat {
                filename: request.source_filename.clone(),
            });
        }

        let target_format = request.target_format;
        let strategy = self.registry.resolve(source_format, target_format)?;
        let options = strategy
            .option_shape()
            .resolve(request.compression.as_ref())?;

        debug!(
            filename = %request.source_filename,
            strategy = strategy.name(),
            options = ?options,
            "Running conversion strategy"
        );

        let source = request.source_bytes.clone();
        let task = tokio::task::spawn_blocking(move || strategy.convert(&source, &options));

        // A timed-out strategy keeps its blocking thread until it returns;
        // its output is discarded.
        let output = match tokio::time::timeout(self.config.timeout(), task).await {
            Err(_) => {
                return Err(ConversionError::Timeout {
                    timeout_secs: self.config.timeout_secs,
                })
            }
            Ok(Err(join_err)) => {
                let reason = if join_err.is_panic() {
                    format!("converter panicked: {}", panic_message(join_err.into_panic()))
                } else {
                    "conversion task was cancelled".to_string()
                };
                return Err(ConversionError::conversion_failed(reason));
            }
            Ok(Ok(result)) => result?,
        };

        let output_filename = output_filename(&request.source_filename, target_format);
        let meta = self
            .store
            .put(output, output_filename.clone(), target_format)
            .await
            .map_err(|e| ConversionError::StoreFailed {
                reason: e.to_string(),
            })?;

        Ok(ConvertedArtifact {
            handle: meta.handle,
            output_filename,
            source_format,
            target_format,
            size_bytes: meta.size_bytes,
            sha256: meta.sha256,
            options,
        })
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[async_trait]
impl Converter for FileConverter {
    fn name(&self) -> &str {
        "file"
    }

    async fn convert(
        &self,
        request: &ConversionRequest,
    ) -> Result<ConvertedArtifact, ConversionError> {
        let start = Instant::now();
        let source_format = detect(&request.source_bytes, &request.source_filename);
        let result = self.convert_detected(request, source_format).await;

        let status = if result.is_ok() { "succeeded" } else { "failed" };
        metrics::CONVERSIONS_TOTAL
            .with_label_values(&[
                source_format.as_str(),
                request.target_format.as_str(),
                status,
            ])
            .inc();
        metrics::CONVERSION_DURATION
            .with_label_values(&[request.target_format.as_str()])
            .observe(start.elapsed().as_secs_f64());

        match &result {
            Ok(artifact) => debug!(
                filename = %request.source_filename,
                handle = %artifact.handle,
                size_bytes = artifact.size_bytes,
                duration_ms = start.elapsed().as_millis() as u64,
                "Converted {} to {}",
                source_format,
                request.target_format
            ),
            Err(e) => warn!(
                filename = %request.source_filename,
                error_kind = e.kind(),
                "Conversion failed: {}",
                e
            ),
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::{
        CompressionTier, ConversionStrategy, OptionShape, ResolvedOptions,
    };
    use crate::testing::fixtures;
    use std::time::Duration;

    fn converter() -> FileConverter {
        FileConverter::with_defaults(Arc::new(ArtifactStore::default()))
    }

    struct SlowStrategy;

    impl ConversionStrategy for SlowStrategy {
        fn name(&self) -> &str {
            "slow"
        }
        fn source_format(&self) -> FormatTag {
            FormatTag::Png
        }
        fn target_format(&self) -> FormatTag {
            FormatTag::Bmp
        }
        fn option_shape(&self) -> OptionShape {
            OptionShape::None
        }
        fn convert(&self, bytes: &[u8], _: &ResolvedOptions) -> Result<Vec<u8>, ConversionError> {
            std::thread::sleep(Duration::from_secs(2));
            Ok(bytes.to_vec())
        }
    }

    struct PanickingStrategy;

    impl ConversionStrategy for PanickingStrategy {
        fn name(&self) -> &str {
            "panicking"
        }
        fn source_format(&self) -> FormatTag {
            FormatTag::Png
        }
        fn target_format(&self) -> FormatTag {
            FormatTag::Jpeg
        }
        fn option_shape(&self) -> OptionShape {
            OptionShape::None
        }
        fn convert(&self, _: &[u8], _: &ResolvedOptions) -> Result<Vec<u8>, ConversionError> {
            panic!("codec exploded")
        }
    }

    #[tokio::test]
    async fn test_png_to_jpeg_is_stored() {
        let converter = converter();
        let request = ConversionRequest::new(fixtures::sample_png(), "photo.png", FormatTag::Jpeg)
            .with_quality(80);

        let artifact = converter.convert(&request).await.unwrap();
        assert_eq!(artifact.source_format, FormatTag::Png);
        assert_eq!(artifact.output_filename, "photo.jpg");
        assert_eq!(artifact.options, ResolvedOptions::Quality(80));

        let stored = converter.store().get(&artifact.handle).await.unwrap();
        assert_eq!(stored.bytes.len() as u64, artifact.size_bytes);
        assert_eq!(detect(&stored.bytes, "out"), FormatTag::Jpeg);
    }

    #[tokio::test]
    async fn test_unrecognized_format() {
        let request = ConversionRequest::new(b"plain text".to_vec(), "notes.txt", FormatTag::Png);
        let err = converter().convert(&request).await.unwrap_err();
        assert_eq!(err.kind(), "unrecognized_format");
    }

    #[tokio::test]
    async fn test_unsupported_pair() {
        let request = ConversionRequest::new(fixtures::sample_png(), "a.png", FormatTag::Docx);
        let err = converter().convert(&request).await.unwrap_err();
        assert_eq!(err.kind(), "unsupported_conversion");
    }

    #[tokio::test]
    async fn test_tier_for_jpeg_rejected() {
        let request = ConversionRequest::new(fixtures::sample_png(), "a.png", FormatTag::Jpeg)
            .with_tier(CompressionTier::High);
        let err = converter().convert(&request).await.unwrap_err();
        assert_eq!(err.kind(), "invalid_compression_option");
    }

    #[tokio::test]
    async fn test_timeout_reported_as_conversion_failure() {
        let mut registry = StrategyRegistry::with_defaults();
        registry.register(SlowStrategy);
        let converter = FileConverter::new(
            Arc::new(registry),
            Arc::new(ArtifactStore::default()),
            ConverterConfig::default().with_timeout(1),
        );

        let request = ConversionRequest::new(fixtures::sample_png(), "a.png", FormatTag::Bmp);
        let err = converter.convert(&request).await.unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(err.kind(), "conversion_failure");
        assert!(converter.store().is_empty().await);
    }

    #[tokio::test]
    async fn test_panic_is_contained() {
        let mut registry = StrategyRegistry::with_defaults();
        registry.register(PanickingStrategy);
        let converter = FileConverter::new(
            Arc::new(registry),
            Arc::new(ArtifactStore::default()),
            ConverterConfig::default(),
        );

        let request = ConversionRequest::new(fixtures::sample_png(), "a.png", FormatTag::Jpeg);
        let err = converter.convert(&request).await.unwrap_err();
        assert_eq!(err.kind(), "conversion_failure");
        assert!(err.to_string().contains("codec exploded"));
    }
}
