//! Citation extraction from flattened reading-list text.
//!
//! Two citation grammars are matched over the whole text:
//!
//! 1. Law-report form: a bracketed or parenthesized year (or year range),
//!    optional volume, a report abbreviation, and a page number, with a
//!    sub-grammar for series that carry a trailing part token (Eq/Ch/P).
//! 2. Neutral form: a bracketed year, an alphabetic court code, and a
//!    judgment number, e.g. `[2019] SGCA 45`.
//!
//! The law-report character classes deliberately over-match; the whitelist
//! filter afterwards keeps only citations carrying a recognized abbreviation.
//! In starred mode only citations preceded by a `*` marker are captured; the
//! marker itself is never part of the returned citation.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::ExtractorConfig;
use crate::models::{Citation, CitationSet};

/// All citation forms, unanchored, for unstarred extraction.
static CITATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"[\[(][1-2]\d{3}(?:-[1-2]\d{3})?[\])]\s[\d\s]*[LR]+\s\d+\s[EqCP]+\s+\d+|[\[(][1-2]\d{3}(?:-[1-2]\d{3})?[\])]\s[\d\s]*[SLR()WLRMLJChACFQBStra.]+\s\d+|\[[1-2]\d{3}(?:-[1-2]\d{3})?\]\s[A-Za-z()]+\s\d+",
    )
    .expect("citation regex")
});

/// The same forms, each preceded by a `*` marker, capturing the citation
/// without the marker. Group 1 is the part-token series form, group 2 the
/// general law-report form, group 3 the neutral form.
static STARRED_CITATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\*[^\[\]]*([\[(][1-2]\d{3}(?:-[1-2]\d{3})?[\])]\s[\d\s]*[LR]+\s\d+\s[EqCP]+\s+\d+)|\*[^\[\]]*([\[(][1-2]\d{3}(?:-[1-2]\d{3})?[\])]\s[\d\s]*[SLR()WMJChAFQBtra.]+\s\d+)|\*[^\[\]]*(\[[1-2]\d{3}(?:-[1-2]\d{3})?\]\s[A-Za-z()]+\s\d+)",
    )
    .expect("starred citation regex")
});

/// Recognizes citation strings in unstructured legal-document text.
#[derive(Debug, Clone)]
pub struct CitationExtractor {
    whitelist: Vec<String>,
}

impl CitationExtractor {
    pub fn new(config: &ExtractorConfig) -> Self {
        Self {
            whitelist: config.whitelist.clone(),
        }
    }

    /// Extract the deduplicated, whitespace-normalized citation set.
    ///
    /// With `starred_only`, only citations flagged with a `*` marker in the
    /// source are returned.
    pub fn extract(&self, text: &str, starred_only: bool) -> CitationSet {
        let raw: Vec<&str> = if starred_only {
            STARRED_CITATION
                .captures_iter(text)
                .filter_map(|caps| {
                    // The general law-report group is preferred; the other
                    // alternatives only fire when it is absent.
                    caps.get(2)
                        .or_else(|| caps.get(1))
                        .or_else(|| caps.get(3))
                        .map(|m| m.as_str())
                })
                .collect()
        } else {
            CITATION.find_iter(text).map(|m| m.as_str()).collect()
        };

        raw.into_iter()
            .map(Citation::new)
            .filter(|c| self.is_recognized(c))
            .collect()
    }

    /// Whitelist filter over report/court abbreviations.
    fn is_recognized(&self, citation: &Citation) -> bool {
        self.whitelist
            .iter()
            .any(|abbr| citation.as_str().contains(abbr))
    }
}
