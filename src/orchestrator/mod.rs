//! Fan-out of a citation list across a bounded worker pool.
//!
//! Each worker runs the full resolve pipeline for one citation against the
//! shared session. The pool is bounded by a semaphore; the resolver's own
//! search lock serializes the one operation the portal cannot take
//! concurrently. Status events flow through a channel so interleaved worker
//! output stays readable. The run has no mid-flight cancellation: it ends
//! when every citation has an outcome.

use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

use crate::models::{CaseReport, Citation, CitationSet, DownloadOutcome};
use crate::portal::CaseResolver;

/// One serialized status update from a worker.
#[derive(Debug, Clone)]
pub struct RunEvent {
    pub citation: Citation,
    pub line: String,
    pub kind: EventKind,
}

/// Coarse outcome class for progress display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    PdfSaved,
    HtmlSaved,
    Duplicate,
    NotFound,
    Failed,
}

/// Schedules citation downloads over a bounded pool.
#[derive(Debug)]
pub struct DownloadOrchestrator {
    workers: usize,
}

impl DownloadOrchestrator {
    pub fn new(workers: usize) -> Self {
        // A zero-sized pool would deadlock the semaphore.
        Self {
            workers: workers.max(1),
        }
    }

    /// Download every citation in the set; returns one report per citation,
    /// sorted by citation for stable output. Completion order among workers
    /// is unspecified.
    pub async fn run(
        &self,
        resolver: Arc<CaseResolver>,
        citations: CitationSet,
        events: Option<mpsc::UnboundedSender<RunEvent>>,
    ) -> Vec<CaseReport> {
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut join_set = JoinSet::new();

        for citation in citations {
            let resolver = Arc::clone(&resolver);
            let semaphore = Arc::clone(&semaphore);
            let events = events.clone();

            join_set.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("semaphore never closed");
                let outcome = resolver.resolve(&citation).await;
                let report = CaseReport {
                    citation: citation.clone(),
                    outcome,
                };
                if let Some(events) = events {
                    // Receiver may be gone; workers keep going regardless.
                    let _ = events.send(RunEvent {
                        citation,
                        line: report.to_string(),
                        kind: event_kind(&report),
                    });
                }
                report
            });
        }

        let mut reports = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(report) => reports.push(report),
                Err(e) => tracing::error!(error = %e, "download worker panicked"),
            }
        }
        reports.sort_by(|a, b| a.citation.cmp(&b.citation));
        reports
    }
}

fn event_kind(report: &CaseReport) -> EventKind {
    match &report.outcome {
        Ok(DownloadOutcome::PdfSaved(_)) => EventKind::PdfSaved,
        Ok(DownloadOutcome::HtmlSaved(_)) => EventKind::HtmlSaved,
        Ok(DownloadOutcome::DuplicateOf(_)) => EventKind::Duplicate,
        Ok(DownloadOutcome::NotFound) => EventKind::NotFound,
        Ok(DownloadOutcome::AuthFailed) | Err(_) => EventKind::Failed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_count_is_never_zero() {
        let orchestrator = DownloadOrchestrator::new(0);
        assert_eq!(orchestrator.workers, 1);
    }

    #[test]
    fn event_kind_classifies_outcomes() {
        let report = CaseReport {
            citation: Citation::new("[2016] 3 SLR 621"),
            outcome: Ok(DownloadOutcome::NotFound),
        };
        assert_eq!(event_kind(&report), EventKind::NotFound);

        let report = CaseReport {
            citation: Citation::new("[2016] 3 SLR 621"),
            outcome: Err(crate::portal::PortalError::FormatChanged("x".to_string())),
        };
        assert_eq!(event_kind(&report), EventKind::Failed);
    }
}
