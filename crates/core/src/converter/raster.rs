//! Raster image transcoding (PNG, JPEG, BMP).

use image::codecs::bmp::BmpEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, ImageFormat};
use tracing::debug;

use super::error::ConversionError;
use super::registry::ConversionStrategy;
use super::types::{OptionShape, ResolvedOptions};
use crate::format::FormatTag;

/// Default JPEG encoder quality.
pub const DEFAULT_JPEG_QUALITY: u8 = 85;

/// Default PNG quality; lands in the "default effort" band.
pub const DEFAULT_PNG_QUALITY: u8 = 50;

/// Decodes one raster format and re-encodes it as another.
#[derive(Debug, Clone)]
pub struct RasterStrategy {
    source: FormatTag,
    target: FormatTag,
    name: String,
}

impl RasterStrategy {
    /// Returns `None` unless both formats are raster formats.
    pub fn new(source: FormatTag, target: FormatTag) -> Option<Self> {
        if !source.is_raster() || !target.is_raster() {
            return None;
        }
        Some(Self {
            source,
            target,
            name: format!("raster:{}->{}", source.extension(), target.extension()),
        })
    }
}

fn image_format(tag: FormatTag) -> Result<ImageFormat, ConversionError> {
    match tag {
        FormatTag::Png => Ok(ImageFormat::Png),
        FormatTag::Jpeg => Ok(ImageFormat::Jpeg),
        FormatTag::Bmp => Ok(ImageFormat::Bmp),
        other => Err(ConversionError::conversion_failed(format!(
            "{} is not a raster format",
            other
        ))),
    }
}

/// PNG is lossless: quality only trades encode speed for output size.
/// Low quality asks for the smallest file.
fn png_compression(quality: u8) -> CompressionType {
    match quality {
        0..=33 => CompressionType::Best,
        34..=66 => CompressionType::Default,
        _ => CompressionType::Fast,
    }
}

fn quality_or(options: &ResolvedOptions, default: u8) -> u8 {
    match options {
        ResolvedOptions::Quality(q) => *q,
        _ => default,
    }
}

impl ConversionStrategy for RasterStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn source_format(&self) -> FormatTag {
        self.source
    }

    fn target_format(&self) -> FormatTag {
        self.target
    }

    fn option_shape(&self) -> OptionShape {
        match self.target {
            FormatTag::Jpeg => OptionShape::quality(DEFAULT_JPEG_QUALITY),
            FormatTag::Png => OptionShape::quality(DEFAULT_PNG_QUALITY),
            _ => OptionShape::None,
        }
    }

    fn convert(&self, bytes: &[u8], options: &ResolvedOptions) -> Result<Vec<u8>, ConversionError> {
        let img = image::load_from_memory_with_format(bytes, image_format(self.source)?)?;
        debug!(
            width = img.width(),
            height = img.height(),
            color = ?img.color(),
            "Decoded {} image",
            self.source
        );

        let mut out = Vec::new();
        match self.target {
            FormatTag::Jpeg => {
                // JPEG carries no alpha channel.
                let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
                let quality = quality_or(options, DEFAULT_JPEG_QUALITY);
                rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut out, quality))?;
            }
            FormatTag::Png => {
                let compression = png_compression(quality_or(options, DEFAULT_PNG_QUALITY));
                img.write_with_encoder(PngEncoder::new_with_quality(
                    &mut out,
                    compression,
                    FilterType::Adaptive,
                ))?;
            }
            FormatTag::Bmp => {
                let img = if img.color().has_alpha() {
                    DynamicImage::ImageRgba8(img.to_rgba8())
                } else {
                    DynamicImage::ImageRgb8(img.to_rgb8())
                };
                img.write_with_encoder(BmpEncoder::new(&mut out))?;
            }
            other => {
                return Err(ConversionError::conversion_failed(format!(
                    "{} is not a raster format",
                    other
                )))
            }
        }

        Ok(out)
    }
}
