//! Testing utilities and mock implementations.
//!
//! This module provides a scriptable `MockConverter` and sample payloads for
//! every supported format, so batch behaviour can be exercised without
//! real codecs and codec strategies can be exercised without files on disk.
//!
//! # Example
//!
//! ```rust,ignore
//! use docshift_core::testing::{fixtures, MockConverter};
//!
//! let converter = MockConverter::new();
//! converter.set_failure("bad.png", ConversionError::conversion_failed("boom")).await;
//! converter.set_default_delay(Duration::from_millis(20)).await;
//!
//! let png = fixtures::sample_png();
//! ```

mod mock_converter;

pub use mock_converter::{MockConverter, RecordedConversion};

/// Test fixtures and helper functions.
pub mod fixtures {
    use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb, Rgba};
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};
    use std::io::Cursor;

    const SIDE: u32 = 64;

    fn textured_rgb() -> DynamicImage {
        DynamicImage::ImageRgb8(ImageBuffer::from_fn(SIDE, SIDE, |x, y| {
            Rgb([
                (x * 4) as u8,
                (y * 4) as u8,
                (((x * 7 + y * 13) % 17) * 15) as u8,
            ])
        }))
    }

    fn encode(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, format)
            .expect("fixture image encodes");
        out.into_inner()
    }

    /// A 64x64 RGB PNG with enough texture for lossy sizes to differ.
    pub fn sample_png() -> Vec<u8> {
        encode(&textured_rgb(), ImageFormat::Png)
    }

    /// A 64x64 PNG with a horizontal alpha ramp.
    pub fn sample_rgba_png() -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(ImageBuffer::from_fn(SIDE, SIDE, |x, y| {
            Rgba([(x * 4) as u8, (y * 4) as u8, 128, (x * 4) as u8])
        }));
        encode(&img, ImageFormat::Png)
    }

    /// A 64x64 baseline JPEG.
    pub fn sample_jpeg() -> Vec<u8> {
        encode(&textured_rgb(), ImageFormat::Jpeg)
    }

    /// A 64x64 24-bit BMP.
    pub fn sample_bmp() -> Vec<u8> {
        encode(&textured_rgb(), ImageFormat::Bmp)
    }

    /// A JPEG cut off inside its header: sniffs as JPEG, never decodes.
    pub fn truncated_jpeg() -> Vec<u8> {
        let mut bytes = sample_jpeg();
        bytes.truncate(64);
        bytes
    }

    /// A one-page PDF showing `text` in Courier.
    pub fn sample_pdf(text: &str) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        });
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("fixture content encodes"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        doc.save_to(&mut out).expect("fixture PDF saves");
        out
    }

    /// Bytes that match no known signature.
    pub fn plain_text() -> Vec<u8> {
        b"just some notes, nothing to convert".to_vec()
    }
}
