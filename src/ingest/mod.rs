//! Reading-list ingestion.
//!
//! Loads a user-supplied reading list and flattens it to plain text for the
//! citation extractor. `.docx` and `.pdf` are supported; `.doc` is rejected
//! up front with a hint to convert, before any extraction is attempted.

mod docx;
mod pdf;

use std::path::Path;
use thiserror::Error;

pub use docx::extract_docx_text;
pub use pdf::extract_pdf_text;

/// Errors loading a reading list.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("unsupported file format '{0}': please supply a .docx or .pdf reading list")]
    UnsupportedFormat(String),

    #[error("failed to read DOCX file: {0}")]
    Docx(String),

    #[error("failed to extract PDF text: {0}")]
    Pdf(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Load a reading list and flatten it to extraction-ready text.
///
/// DOCX paragraphs and table cells become newline-separated lines; PDF text
/// has its embedded newlines replaced with spaces so citations broken across
/// lines still match.
pub fn load_reading_list(path: &Path) -> Result<String, IngestError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "docx" => extract_docx_text(path),
        "pdf" => Ok(extract_pdf_text(path)?.replace('\n', " ")),
        other => Err(IngestError::UnsupportedFormat(other.to_string())),
    }
}
