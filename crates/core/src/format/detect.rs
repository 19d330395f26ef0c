//! Content-signature and filename based format detection.

use std::io::Cursor;
use std::path::Path;
use tracing::debug;

use super::types::FormatTag;

const PDF_MAGIC: &[u8] = b"%PDF-";
const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];
const BMP_MAGIC: &[u8] = b"BM";
const ZIP_MAGIC: &[u8] = &[b'P', b'K', 0x03, 0x04];

/// Valid sizes of the DIB header that follows the 14-byte BMP file header.
const DIB_HEADER_SIZES: [u32; 7] = [12, 40, 52, 56, 64, 108, 124];

/// Main part every word-processing package carries.
const DOCX_MAIN_PART: &str = "word/document.xml";

/// Detects the format of a file from its bytes, falling back to its name.
///
/// Never fails: `FormatTag::Unknown` is returned when neither the content
/// signature nor the filename yields a match.
pub fn detect(bytes: &[u8], filename: &str) -> FormatTag {
    if let Some(tag) = sniff_content(bytes) {
        debug!(filename, format = %tag, "Detected format from content");
        return tag;
    }

    let tag = detect_from_filename(filename);
    debug!(filename, format = %tag, "Detected format from filename");
    tag
}

/// Inspects magic bytes. Returns `None` when the content is inconclusive.
pub fn sniff_content(bytes: &[u8]) -> Option<FormatTag> {
    if bytes.starts_with(PDF_MAGIC) {
        return Some(FormatTag::Pdf);
    }
    if bytes.starts_with(PNG_MAGIC) {
        return Some(FormatTag::Png);
    }
    if bytes.starts_with(JPEG_MAGIC) {
        return Some(FormatTag::Jpeg);
    }
    if is_bitmap(bytes) {
        return Some(FormatTag::Bmp);
    }
    if bytes.starts_with(ZIP_MAGIC) && is_word_package(bytes) {
        return Some(FormatTag::Docx);
    }
    None
}

/// Guesses the format from the filename: MIME guess first, then the bare
/// upper-cased extension.
pub fn detect_from_filename(filename: &str) -> FormatTag {
    let guessed = mime_guess::from_path(filename)
        .iter()
        .find_map(|mime| FormatTag::from_mime_type(mime.essence_str()));
    if let Some(tag) = guessed {
        return tag;
    }

    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(FormatTag::parse_lossy)
        .unwrap_or(FormatTag::Unknown)
}

/// "BM" alone matches ordinary text, so the DIB header size must be valid too.
fn is_bitmap(bytes: &[u8]) -> bool {
    if !bytes.starts_with(BMP_MAGIC) {
        return false;
    }
    match bytes.get(14..18).and_then(|raw| <[u8; 4]>::try_from(raw).ok()) {
        Some(raw) => DIB_HEADER_SIZES.contains(&u32::from_le_bytes(raw)),
        None => false,
    }
}

fn is_word_package(bytes: &[u8]) -> bool {
    match zip::ZipArchive::new(Cursor::new(bytes)) {
        Ok(archive) => archive.file_names().any(|name| name == DOCX_MAIN_PART),
        Err(_) => false,
    }
}
