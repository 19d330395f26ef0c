pub mod batch;
pub mod config;
pub mod converter;
pub mod format;
pub mod metrics;
pub mod store;
pub mod testing;

pub use batch::{
    BatchConfig, BatchError, BatchHandle, BatchOrchestrator, BatchSummary, ConversionResult,
    PoolStatus, ProgressEvent, ResultStatus,
};
pub use config::{
    load_config, load_config_from_str, load_default_config, validate_config, Config,
    ConfigError, ServerConfig,
};
pub use converter::{
    CompressionOptions, CompressionTier, ConversionError, ConversionRequest, ConversionStrategy,
    ConvertedArtifact, Converter, ConverterConfig, FileConverter, OptionShape, StrategyInfo,
    StrategyRegistry,
};
pub use format::{detect, FormatTag};
pub use store::{ArtifactHandle, ArtifactMeta, ArtifactStore, StoreConfig, StoreError};
