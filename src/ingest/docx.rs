//! DOCX text extraction.
//!
//! A `.docx` file is a zip archive; the document body lives in
//! `word/document.xml`. Text runs (`w:t`) are concatenated, paragraph ends
//! (`w:p`) emit newlines. Table-cell text falls out of the same traversal
//! since cells contain ordinary paragraphs.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;

use super::IngestError;

/// Extract the full text of a DOCX document, one line per paragraph.
pub fn extract_docx_text(path: &Path) -> Result<String, IngestError> {
    let file = File::open(path)?;
    let mut archive =
        zip::ZipArchive::new(BufReader::new(file)).map_err(|e| IngestError::Docx(e.to_string()))?;
    let mut document = archive
        .by_name("word/document.xml")
        .map_err(|e| IngestError::Docx(format!("missing word/document.xml: {}", e)))?;
    let mut xml = String::new();
    document.read_to_string(&mut xml)?;

    document_text(&xml)
}

/// Walk the document XML collecting run text and paragraph boundaries.
fn document_text(xml: &str) -> Result<String, IngestError> {
    let mut reader = Reader::from_str(xml);
    let mut out = String::new();
    let mut in_run_text = false;

    loop {
        match reader
            .read_event()
            .map_err(|e| IngestError::Docx(e.to_string()))?
        {
            Event::Start(ref e) if e.name().as_ref() == b"w:t" => in_run_text = true,
            Event::End(ref e) => match e.name().as_ref() {
                b"w:t" => in_run_text = false,
                b"w:p" => out.push('\n'),
                _ => {}
            },
            Event::Text(ref t) if in_run_text => {
                let text = t
                    .unescape()
                    .map_err(|e| IngestError::Docx(e.to_string()))?;
                // Word uses non-breaking spaces liberally in citations.
                out.push_str(&text.replace('\u{a0}', " "));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paragraphs_become_lines() {
        let xml = r#"<w:document xmlns:w="ns"><w:body>
            <w:p><w:r><w:t>Company Law</w:t></w:r></w:p>
            <w:p><w:r><w:t>* [2017] 1 SLR 1</w:t></w:r></w:p>
        </w:body></w:document>"#;
        let text = document_text(xml).expect("extract");
        let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
        assert_eq!(lines, vec!["Company Law", "* [2017] 1 SLR 1"]);
    }

    #[test]
    fn split_runs_concatenate_within_a_paragraph() {
        let xml = r#"<w:document xmlns:w="ns"><w:body>
            <w:p><w:r><w:t>[2016] 3 </w:t></w:r><w:r><w:t>SLR 621</w:t></w:r></w:p>
        </w:body></w:document>"#;
        let text = document_text(xml).expect("extract");
        assert!(text.contains("[2016] 3 SLR 621"));
    }

    #[test]
    fn non_breaking_spaces_become_plain_spaces() {
        let xml = "<w:document xmlns:w=\"ns\"><w:body><w:p><w:r><w:t>[2016]\u{a0}3\u{a0}SLR\u{a0}621</w:t></w:r></w:p></w:body></w:document>";
        let text = document_text(xml).expect("extract");
        assert!(text.contains("[2016] 3 SLR 621"));
    }

    #[test]
    fn table_cell_text_is_included() {
        let xml = r#"<w:document xmlns:w="ns"><w:body>
            <w:tbl><w:tr><w:tc><w:p><w:r><w:t>[2019] SGCA 45</w:t></w:r></w:p></w:tc></w:tr></w:tbl>
        </w:body></w:document>"#;
        let text = document_text(xml).expect("extract");
        assert!(text.contains("[2019] SGCA 45"));
    }
}
