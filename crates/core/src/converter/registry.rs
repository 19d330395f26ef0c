//! Conversion strategy registry.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::document::PdfToDocxStrategy;
use super::error::ConversionError;
use super::raster::RasterStrategy;
use super::types::{OptionShape, ResolvedOptions};
use crate::format::FormatTag;

/// A conversion routine for one (source, target) format pair.
///
/// `convert` must be pure and synchronous: it runs on a blocking worker
/// thread under the per-job timeout.
pub trait ConversionStrategy: Send + Sync {
    /// Short name for logs and the capabilities listing.
    fn name(&self) -> &str;

    /// Format this strategy reads.
    fn source_format(&self) -> FormatTag;

    /// Format this strategy produces.
    fn target_format(&self) -> FormatTag;

    /// Compression options this strategy accepts.
    fn option_shape(&self) -> OptionShape;

    /// Converts `bytes` with already-validated options.
    fn convert(&self, bytes: &[u8], options: &ResolvedOptions) -> Result<Vec<u8>, ConversionError>;
}

/// One entry of the registry listing.
#[derive(Debug, Clone, Serialize)]
pub struct StrategyInfo {
    pub source_format: FormatTag,
    pub target_format: FormatTag,
    pub strategy: String,
    pub options: OptionShape,
}

/// Maps (source, target) pairs to strategies.
#[derive(Clone, Default)]
pub struct StrategyRegistry {
    strategies: BTreeMap<(FormatTag, FormatTag), Arc<dyn ConversionStrategy>>,
}

impl StrategyRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in strategies: PNG, JPEG and BMP
    /// interconvertible (including same-format re-encoding) and PDF to DOCX.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        let raster = [FormatTag::Png, FormatTag::Jpeg, FormatTag::Bmp];
        for source in raster {
            for target in raster {
                // Every source/target here is raster, so construction cannot fail.
                if let Some(strategy) = RasterStrategy::new(source, target) {
                    registry.register(strategy);
                }
            }
        }
        registry.register(PdfToDocxStrategy::new());
        registry
    }

    /// Registers a strategy, replacing any existing one for the same pair.
    pub fn register<S: ConversionStrategy + 'static>(&mut self, strategy: S) -> &mut Self {
        self.register_arc(Arc::new(strategy))
    }

    /// Registers an already shared strategy.
    pub fn register_arc(&mut self, strategy: Arc<dyn ConversionStrategy>) -> &mut Self {
        let key = (strategy.source_format(), strategy.target_format());
        self.strategies.insert(key, strategy);
        self
    }

    /// Looks up the strategy for a pair.
    pub fn resolve(
        &self,
        source: FormatTag,
        target: FormatTag,
    ) -> Result<Arc<dyn ConversionStrategy>, ConversionError> {
        self.strategies
            .get(&(source, target))
            .cloned()
            .ok_or(ConversionError::UnsupportedConversion {
                source_format: source,
                target_format: target,
            })
    }

    /// Whether a strategy exists for the pair.
    pub fn supports(&self, source: FormatTag, target: FormatTag) -> bool {
        self.strategies.contains_key(&(source, target))
    }

    /// Lists all registrations, ordered by (source, target).
    pub fn list(&self) -> Vec<StrategyInfo> {
        self.strategies
            .values()
            .map(|s| StrategyInfo {
                source_format: s.source_format(),
                target_format: s.target_format(),
                strategy: s.name().to_string(),
                options: s.option_shape(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl std::fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.strategies.keys().map(|(s, t)| format!("{}->{}", s, t)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoStrategy;

    impl ConversionStrategy for EchoStrategy {
        fn name(&self) -> &str {
            "echo"
        }

        fn source_format(&self) -> FormatTag {
            FormatTag::Docx
        }

        fn target_format(&self) -> FormatTag {
            FormatTag::Pdf
        }

        fn option_shape(&self) -> OptionShape {
            OptionShape::None
        }

        fn convert(
            &self,
            bytes: &[u8],
            _options: &ResolvedOptions,
        ) -> Result<Vec<u8>, ConversionError> {
            Ok(bytes.to_vec())
        }
    }

    #[test]
    fn test_default_registrations() {
        let registry = StrategyRegistry::with_defaults();
        assert_eq!(registry.len(), 10);
        assert!(registry.supports(FormatTag::Png, FormatTag::Jpeg));
        assert!(registry.supports(FormatTag::Jpeg, FormatTag::Jpeg));
        assert!(registry.supports(FormatTag::Bmp, FormatTag::Png));
        assert!(registry.supports(FormatTag::Pdf, FormatTag::Docx));
        assert!(!registry.supports(FormatTag::Docx, FormatTag::Pdf));
        assert!(!registry.supports(FormatTag::Png, FormatTag::Docx));
    }

    #[test]
    fn test_resolve_unsupported() {
        let registry = StrategyRegistry::with_defaults();
        let err = registry
            .resolve(FormatTag::Docx, FormatTag::Pdf)
            .err()
            .unwrap();
        assert_eq!(err.kind(), "unsupported_conversion");
    }

    #[test]
    fn test_register_custom_strategy() {
        let mut registry = StrategyRegistry::with_defaults();
        registry.register(EchoStrategy);
        let strategy = registry.resolve(FormatTag::Docx, FormatTag::Pdf).unwrap();
        assert_eq!(strategy.name(), "echo");
        assert_eq!(strategy.convert(b"abc", &ResolvedOptions::None).unwrap(), b"abc");
    }

    #[test]
    fn test_list_shapes() {
        let registry = StrategyRegistry::with_defaults();
        let listing = registry.list();
        let to_docx = listing
            .iter()
            .find(|i| i.target_format == FormatTag::Docx)
            .unwrap();
        assert!(matches!(to_docx.options, OptionShape::Tier { .. }));
        let to_bmp = listing
            .iter()
            .find(|i| i.target_format == FormatTag::Bmp)
            .unwrap();
        assert_eq!(to_bmp.options, OptionShape::None);
        let to_jpeg = listing
            .iter()
            .find(|i| i.target_format == FormatTag::Jpeg)
            .unwrap();
        assert!(matches!(to_jpeg.options, OptionShape::Quality { min: 1, max: 100, .. }));
    }
}
