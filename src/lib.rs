//! lawlist: download legal case documents for every citation in a reading list.
//!
//! The pipeline: a reading list (`.docx` or `.pdf`) is flattened to text,
//! the [`extract::CitationExtractor`] pulls out law-report and neutral
//! citations, [`portal::SessionAuthenticator`] performs the federated
//! sign-on once, and the [`orchestrator::DownloadOrchestrator`] fans the
//! citations across a bounded worker pool where each
//! [`portal::CaseResolver`] searches the portal, picks the matching case,
//! and saves its PDF (or, failing that, the case page) through the
//! [`writer::ArtifactWriter`].

pub mod config;
pub mod extract;
pub mod ingest;
pub mod models;
pub mod orchestrator;
pub mod portal;
pub mod writer;

pub use config::Config;
pub use extract::CitationExtractor;
pub use models::{CaseReport, Citation, CitationSet, DownloadOutcome};
