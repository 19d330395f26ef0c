//! Format detection.
//!
//! Detection inspects the content signature first and falls back to the
//! filename (guessed MIME type, then the bare extension). It never fails:
//! unrecognized input yields [`FormatTag::Unknown`].

mod detect;
mod types;

pub use detect::{detect, detect_from_filename, sniff_content};
pub use types::FormatTag;
