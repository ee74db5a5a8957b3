//! Search hits and per-citation download outcomes.

use std::fmt;
use std::path::PathBuf;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::Citation;

/// The portal renders result links as a pseudo-JavaScript call whose single
/// quoted argument is the internal document id.
static QUOTED_ARG: Lazy<Regex> = Lazy::new(|| Regex::new(r"'([^']+)'").expect("doc id regex"));

/// One row of portal search results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    /// The raw `onclick` action string carrying the document id.
    pub onclick: String,
    /// Display title, e.g. `"Living the Link Pte Ltd ... - [2016] 3 SLR 621"`.
    pub title: String,
}

impl SearchHit {
    /// Extract the internal document id from the onclick action.
    pub fn doc_id(&self) -> Option<&str> {
        QUOTED_ARG
            .captures(&self.onclick)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
    }
}

/// Final state of one citation's download attempt.
///
/// Exactly one of these is produced per citation in a run, except
/// authentication failure which aborts the run as a whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The case PDF was written to disk.
    PdfSaved(PathBuf),
    /// No PDF was available; the case page was written instead (rendered to
    /// PDF where possible, raw HTML otherwise).
    HtmlSaved(PathBuf),
    /// The case is already scheduled in this run under a parallel citation.
    DuplicateOf(Citation),
    /// The portal search returned nothing matching the citation.
    NotFound,
    /// Login to the portal failed.
    AuthFailed,
}

/// A citation paired with how its download ended.
#[derive(Debug)]
pub struct CaseReport {
    pub citation: Citation,
    pub outcome: Result<DownloadOutcome, crate::portal::PortalError>,
}

impl fmt::Display for CaseReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            Ok(DownloadOutcome::PdfSaved(_)) => {
                write!(f, "PDF downloaded for {}.", self.citation)
            }
            Ok(DownloadOutcome::HtmlSaved(_)) => write!(
                f,
                "PDF not available for {}. HTML version downloaded.",
                self.citation
            ),
            Ok(DownloadOutcome::DuplicateOf(other)) => {
                write!(f, "Skipped {}: same case as {}.", self.citation, other)
            }
            Ok(DownloadOutcome::NotFound) => write!(f, "Unable to find {}.", self.citation),
            Ok(DownloadOutcome::AuthFailed) => write!(f, "Login failed."),
            Err(e) => write!(f, "Failed to download {}: {}", self.citation, e),
        }
    }
}
