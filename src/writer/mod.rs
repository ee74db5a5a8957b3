//! Artifact persistence: PDF bytes, raw HTML, and HTML rendered to PDF.
//!
//! Writes are single-shot: either the whole payload lands on disk or the
//! error propagates. Filenames are reduced to a safe allow-list before use.

use std::path::{Path, PathBuf};

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use scraper::Html;
use thiserror::Error;

/// Case pages put the judgment body after this divider; everything before it
/// is portal chrome not worth rendering.
const CONTENT_MARKER: &str = r#"class="divider""#;

/// Letter-page layout for rendered case text.
const PAGE_WIDTH: i64 = 612;
const PAGE_HEIGHT: i64 = 792;
const LINES_PER_PAGE: usize = 52;
const WRAP_COLUMNS: usize = 95;

/// Errors writing artifacts to disk.
#[derive(Debug, Error)]
pub enum WriteError {
    /// HTML-to-PDF rendering failed; the caller falls back to raw HTML.
    #[error("failed to render HTML to PDF: {0}")]
    Render(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Persists resolved artifacts under one download directory.
#[derive(Debug)]
pub struct ArtifactWriter {
    directory: PathBuf,
}

impl ArtifactWriter {
    /// Create a writer, creating the download directory if needed.
    pub fn new(directory: impl Into<PathBuf>) -> Result<Self, WriteError> {
        let directory = directory.into();
        std::fs::create_dir_all(&directory)?;
        Ok(Self { directory })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Drop every character outside letters, digits and `_-.()[] `.
    /// Dropped, not replaced: `A/B` becomes `AB`.
    pub fn sanitize(name: &str) -> String {
        name.chars()
            .filter(|c| c.is_ascii_alphanumeric() || "_-.()[] ".contains(*c))
            .collect()
    }

    /// Write PDF bytes as `<name>.pdf`.
    pub fn save_pdf(&self, name: &str, bytes: &[u8]) -> Result<PathBuf, WriteError> {
        let path = self.path_for(name, "pdf");
        std::fs::write(&path, bytes)?;
        Ok(path)
    }

    /// Write page source as `<name>.html`.
    pub fn save_html(&self, name: &str, html: &str) -> Result<PathBuf, WriteError> {
        let path = self.path_for(name, "html");
        std::fs::write(&path, html)?;
        Ok(path)
    }

    /// Render the content region of a case page to a text PDF.
    ///
    /// Everything before the divider marker is stripped; a page without the
    /// marker fails with [`WriteError::Render`] so the caller can fall back
    /// to [`ArtifactWriter::save_html`].
    pub fn save_html_as_pdf(&self, name: &str, html: &str) -> Result<PathBuf, WriteError> {
        let lines = content_lines(html)
            .ok_or_else(|| WriteError::Render("content marker not found".to_string()))?;
        if lines.is_empty() {
            return Err(WriteError::Render("no text after content marker".to_string()));
        }

        let path = self.path_for(name, "pdf");
        let mut document = render_text_pdf(&lines)?;
        document
            .save(&path)
            .map_err(|e| WriteError::Render(e.to_string()))?;
        Ok(path)
    }

    fn path_for(&self, name: &str, extension: &str) -> PathBuf {
        self.directory
            .join(format!("{}.{}", Self::sanitize(name), extension))
    }
}

/// Extract wrapped text lines from the region after the divider marker.
fn content_lines(html: &str) -> Option<Vec<String>> {
    let marker = html.find(CONTENT_MARKER)?;
    // Back up to the opening tag so the fragment parses cleanly.
    let start = html[..marker].rfind('<').unwrap_or(marker);
    let fragment = Html::parse_fragment(&html[start..]);

    let mut lines = Vec::new();
    for chunk in fragment.root_element().text() {
        let text = chunk.split_whitespace().collect::<Vec<_>>().join(" ");
        if text.is_empty() {
            continue;
        }
        for line in wrap(&text, WRAP_COLUMNS) {
            lines.push(line);
        }
    }
    Some(lines)
}

/// Greedy word wrap; single words longer than the width get their own line.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split(' ') {
        if !current.is_empty() && current.len() + 1 + word.len() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Lay text lines out into a multi-page Helvetica PDF.
fn render_text_pdf(lines: &[String]) -> Result<Document, WriteError> {
    let mut document = Document::with_version("1.5");
    let pages_id = document.new_object_id();
    let font_id = document.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = document.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut page_ids: Vec<Object> = Vec::new();
    for page_lines in lines.chunks(LINES_PER_PAGE) {
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 10.into()]),
            Operation::new("TL", vec![13.into()]),
            Operation::new("Td", vec![40.into(), (PAGE_HEIGHT - 40).into()]),
        ];
        for line in page_lines {
            operations.push(Operation::new(
                "Tj",
                vec![Object::string_literal(printable(line))],
            ));
            operations.push(Operation::new("T*", vec![]));
        }
        operations.push(Operation::new("ET", vec![]));

        let content = Content { operations };
        let encoded = content
            .encode()
            .map_err(|e| WriteError::Render(e.to_string()))?;
        let content_id = document.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = document.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        page_ids.push(page_id.into());
    }

    let page_count = page_ids.len() as i64;
    document.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids,
            "Count" => page_count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        }),
    );
    let catalog_id = document.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    document.trailer.set("Root", catalog_id);

    Ok(document)
}

/// Helvetica has no glyphs beyond Latin-1; anything else becomes `?`.
fn printable(line: &str) -> String {
    line.chars()
        .map(|c| if (c as u32) < 256 { c } else { '?' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn sanitize_drops_disallowed_characters() {
        assert_eq!(
            ArtifactWriter::sanitize("Tan v Lee - [2016] 3 SLR 621"),
            "Tan v Lee - [2016] 3 SLR 621"
        );
        assert_eq!(ArtifactWriter::sanitize("A/B\\C:D*E?F"), "ABCDEF");
        assert_eq!(
            ArtifactWriter::sanitize("Stonegate Securities Ltd. V. Gregory"),
            "Stonegate Securities Ltd. V. Gregory"
        );
    }

    #[test]
    fn save_pdf_writes_the_full_payload() {
        let dir = tempdir().expect("tempdir");
        let writer = ArtifactWriter::new(dir.path()).expect("writer");
        let path = writer
            .save_pdf("[2016] 3 SLR 621", b"%PDF-1.5 test")
            .expect("save");
        assert_eq!(std::fs::read(&path).expect("read"), b"%PDF-1.5 test");
        assert!(path.file_name().unwrap().to_str().unwrap().ends_with(".pdf"));
    }

    #[test]
    fn save_html_round_trips_text() {
        let dir = tempdir().expect("tempdir");
        let writer = ArtifactWriter::new(dir.path()).expect("writer");
        let path = writer
            .save_html("case", "<html><body>judgment</body></html>")
            .expect("save");
        let text = std::fs::read_to_string(&path).expect("read");
        assert!(text.contains("judgment"));
    }

    #[test]
    fn html_render_requires_the_content_marker() {
        let dir = tempdir().expect("tempdir");
        let writer = ArtifactWriter::new(dir.path()).expect("writer");
        let err = writer
            .save_html_as_pdf("case", "<html><body>no marker here</body></html>")
            .unwrap_err();
        assert!(matches!(err, WriteError::Render(_)));
    }

    #[test]
    fn html_render_produces_a_pdf_after_the_marker() {
        let dir = tempdir().expect("tempdir");
        let writer = ArtifactWriter::new(dir.path()).expect("writer");
        let html = r#"<html><body>
            <nav>portal chrome to ignore</nav>
            <div class="divider"></div>
            <p>The plaintiff commenced proceedings in 2016.</p>
        </body></html>"#;
        let path = writer.save_html_as_pdf("case", html).expect("render");
        let bytes = std::fs::read(&path).expect("read");
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn wrap_respects_width_and_long_words() {
        let lines = wrap("a bb ccc dddd", 5);
        assert_eq!(lines, vec!["a bb", "ccc", "dddd"]);
        let lines = wrap("supercalifragilistic", 5);
        assert_eq!(lines, vec!["supercalifragilistic"]);
    }
}
