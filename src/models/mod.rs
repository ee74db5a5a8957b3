//! Core data types shared across extraction, resolution and orchestration.

mod citation;
mod outcome;

pub use citation::{Citation, CitationKind, CitationSet};
pub use outcome::{CaseReport, DownloadOutcome, SearchHit};
