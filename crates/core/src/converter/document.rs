//! PDF to DOCX conversion.
//!
//! Text is extracted page by page and written as a minimal Office Open XML
//! word-processing package: one paragraph per extracted line, with a page
//! break between source pages. Layout, fonts and images are not carried
//! over.

use lopdf::Document;
use std::io::{Cursor, Write};
use tracing::{debug, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::error::ConversionError;
use super::registry::ConversionStrategy;
use super::types::{CompressionTier, OptionShape, ResolvedOptions};
use crate::format::FormatTag;

const CONTENT_TYPES_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    r#"<Default Extension="xml" ContentType="application/xml"/>"#,
    r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
    r#"<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>"#,
    r#"</Types>"#,
);

const ROOT_RELS_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>"#,
    r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>"#,
    r#"</Relationships>"#,
);

const PAGE_BREAK: &str = r#"<w:p><w:r><w:br w:type="page"/></w:r></w:p>"#;

/// Converts PDF documents to DOCX.
#[derive(Debug, Clone, Default)]
pub struct PdfToDocxStrategy;

impl PdfToDocxStrategy {
    pub fn new() -> Self {
        Self
    }
}

/// Deflate level used for the DOCX package.
pub fn deflate_level(tier: CompressionTier) -> i64 {
    match tier {
        CompressionTier::Low => 1,
        CompressionTier::Medium => 6,
        CompressionTier::High => 9,
    }
}

impl ConversionStrategy for PdfToDocxStrategy {
    fn name(&self) -> &str {
        "document:pdf->docx"
    }

    fn source_format(&self) -> FormatTag {
        FormatTag::Pdf
    }

    fn target_format(&self) -> FormatTag {
        FormatTag::Docx
    }

    fn option_shape(&self) -> OptionShape {
        OptionShape::Tier {
            default: CompressionTier::Medium,
        }
    }

    fn convert(&self, bytes: &[u8], options: &ResolvedOptions) -> Result<Vec<u8>, ConversionError> {
        let tier = match options {
            ResolvedOptions::Tier(tier) => *tier,
            _ => CompressionTier::Medium,
        };

        let doc = Document::load_mem(bytes)?;
        if doc.is_encrypted() {
            return Err(ConversionError::conversion_failed(
                "PDF is encrypted and cannot be read",
            ));
        }

        let pages = doc.get_pages();
        let mut page_texts = Vec::with_capacity(pages.len());
        for page_number in pages.keys() {
            match doc.extract_text(&[*page_number]) {
                Ok(text) => page_texts.push(text),
                Err(e) => {
                    // Image-only or oddly encoded pages still get a slot.
                    warn!(page = page_number, "Failed to extract page text: {}", e);
                    page_texts.push(String::new());
                }
            }
        }
        debug!(pages = page_texts.len(), tier = %tier, "Extracted PDF text");

        build_docx(&page_texts, document_title(&doc).as_deref(), deflate_level(tier))
    }
}

fn document_title(doc: &Document) -> Option<String> {
    let info_ref = doc.trailer.get(b"Info").ok()?.as_reference().ok()?;
    let info = doc.get_dictionary(info_ref).ok()?;
    let raw = info.get(b"Title").ok()?.as_str().ok()?;
    let title = decode_pdf_string(raw);
    let title = title.trim();
    (!title.is_empty()).then(|| title.to_string())
}

/// PDF text strings are either UTF-16BE with a BOM or byte strings.
fn decode_pdf_string(raw: &[u8]) -> String {
    if let Some(utf16) = raw.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        String::from_utf8_lossy(raw).into_owned()
    }
}

fn entry_options(level: i64) -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(level))
}

/// Writes the DOCX package for the given page texts.
pub fn build_docx(
    pages: &[String],
    title: Option<&str>,
    level: i64,
) -> Result<Vec<u8>, ConversionError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    zip.start_file("[Content_Types].xml", entry_options(level))?;
    zip.write_all(CONTENT_TYPES_XML.as_bytes())?;

    zip.start_file("_rels/.rels", entry_options(level))?;
    zip.write_all(ROOT_RELS_XML.as_bytes())?;

    zip.start_file("docProps/core.xml", entry_options(level))?;
    zip.write_all(core_properties_xml(title).as_bytes())?;

    zip.start_file("word/document.xml", entry_options(level))?;
    zip.write_all(document_xml(pages).as_bytes())?;

    Ok(zip.finish()?.into_inner())
}

fn core_properties_xml(title: Option<&str>) -> String {
    let mut xml = String::from(concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" "#,
        r#"xmlns:dc="http://purl.org/dc/elements/1.1/">"#,
    ));
    if let Some(title) = title {
        xml.push_str("<dc:title>");
        xml.push_str(&escape_xml(title));
        xml.push_str("</dc:title>");
    }
    xml.push_str("<dc:creator>docshift</dc:creator></cp:coreProperties>");
    xml
}

fn document_xml(pages: &[String]) -> String {
    let mut body = String::new();
    for (idx, text) in pages.iter().enumerate() {
        if idx > 0 {
            body.push_str(PAGE_BREAK);
        }
        for line in text.lines() {
            let line = line.trim_end();
            if line.is_empty() {
                body.push_str("<w:p/>");
            } else {
                body.push_str(r#"<w:p><w:r><w:t xml:space="preserve">"#);
                body.push_str(&escape_xml(line));
                body.push_str("</w:t></w:r></w:p>");
            }
        }
    }
    if body.is_empty() {
        body.push_str("<w:p/>");
    }

    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
            r#"<w:body>{}<w:sectPr><w:pgSz w:w="11906" w:h="16838"/></w:sectPr></w:body></w:document>"#,
        ),
        body
    )
}

/// Escapes XML markup and drops characters XML 1.0 cannot carry.
fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\t' | '\n' | '\r' => out.push(c),
            c if (c as u32) < 0x20 || c == '\u{FFFE}' || c == '\u{FFFF}' => {}
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::detect;
    use crate::testing::fixtures;
    use std::io::Read;

    fn read_part(docx: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(docx)).unwrap();
        let mut part = archive.by_name(name).unwrap();
        let mut content = String::new();
        part.read_to_string(&mut content).unwrap();
        content
    }

    #[test]
    fn test_pdf_to_docx_extracts_text() {
        let pdf = fixtures::sample_pdf("Hello docshift");
        let out = PdfToDocxStrategy::new()
            .convert(&pdf, &ResolvedOptions::Tier(CompressionTier::Medium))
            .unwrap();

        assert_eq!(detect(&out, "out"), FormatTag::Docx);
        let document = read_part(&out, "word/document.xml");
        assert!(document.contains("Hello docshift"));
    }

    #[test]
    fn test_corrupt_pdf_fails() {
        let err = PdfToDocxStrategy::new()
            .convert(b"%PDF-1.5\nnot really a pdf", &ResolvedOptions::None)
            .unwrap_err();
        assert_eq!(err.kind(), "conversion_failure");
    }

    #[test]
    fn test_multi_page_inserts_page_breaks() {
        let pages = vec!["first".to_string(), "second".to_string()];
        let out = build_docx(&pages, Some("Title & Co"), 6).unwrap();
        let document = read_part(&out, "word/document.xml");
        assert_eq!(document.matches(PAGE_BREAK).count(), 1);
        let core = read_part(&out, "docProps/core.xml");
        assert!(core.contains("<dc:title>Title &amp; Co</dc:title>"));
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a<b>&\"c'"), "a&lt;b&gt;&amp;&quot;c&apos;");
        assert_eq!(escape_xml("bell\u{7}"), "bell");
    }

    #[test]
    fn test_decode_utf16_title() {
        let raw = [0xFE, 0xFF, 0x00, b'H', 0x00, b'i'];
        assert_eq!(decode_pdf_string(&raw), "Hi");
    }

    #[test]
    fn test_deflate_levels() {
        assert_eq!(deflate_level(CompressionTier::Low), 1);
        assert_eq!(deflate_level(CompressionTier::Medium), 6);
        assert_eq!(deflate_level(CompressionTier::High), 9);
    }
}
