//! Converter module for transforming files between formats.
//!
//! Conversions are carried out by `ConversionStrategy` implementations held
//! in a `StrategyRegistry`, keyed by (source, target) format pair. The
//! `FileConverter` ties detection, option validation, the per-job timeout
//! and the artifact store together behind the async `Converter` trait.
//!
//! # Built-in strategies
//!
//! - PNG, JPEG and BMP, all nine pairs (numeric quality for JPEG and PNG)
//! - PDF to DOCX, text only (compression tier)
//!
//! # Example
//!
//! ```ignore
//! use docshift_core::converter::{Converter, ConversionRequest, FileConverter};
//! use docshift_core::format::FormatTag;
//!
//! let converter = FileConverter::with_defaults(store);
//! let request = ConversionRequest::new(bytes, "photo.png", FormatTag::Jpeg).with_quality(80);
//! let artifact = converter.convert(&request).await?;
//! println!("Stored {} as {}", artifact.output_filename, artifact.handle);
//! ```

mod config;
mod document;
mod error;
mod file_converter;
mod raster;
mod registry;
mod traits;
mod types;

pub use config::ConverterConfig;
pub use document::{deflate_level, PdfToDocxStrategy};
pub use error::ConversionError;
pub use file_converter::FileConverter;
pub use raster::{RasterStrategy, DEFAULT_JPEG_QUALITY, DEFAULT_PNG_QUALITY};
pub use registry::{ConversionStrategy, StrategyInfo, StrategyRegistry};
pub use traits::Converter;
pub use types::{
    clamp_quality, output_filename, CompressionOptions, CompressionTier, ConversionRequest,
    ConvertedArtifact, OptionShape, ResolvedOptions, MAX_QUALITY, MIN_QUALITY,
};
