//! PDF text extraction for reading lists.
//!
//! Thin wrapper over the pdf-extract crate. Extraction quality depends on the
//! PDF's text layer; scanned reading lists without OCR yield nothing, which
//! surfaces downstream as an empty citation set rather than an error here.

use std::path::Path;

use super::IngestError;

/// Extract the full text layer of a PDF.
pub fn extract_pdf_text(path: &Path) -> Result<String, IngestError> {
    pdf_extract::extract_text(path).map_err(|e| IngestError::Pdf(e.to_string()))
}
