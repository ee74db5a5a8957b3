//! Citation model for law-report and neutral citations.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

/// First bracketed or parenthesized year in a citation, e.g. `[2016]` or `(1998)`.
static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\[(]([1-2]\d{3})").expect("year regex"));

/// How a citation identifies its case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CitationKind {
    /// Published law-report series citation, e.g. `[2016] 3 SLR 621`.
    LawReport,
    /// Court-and-judgment-number citation, e.g. `[2019] SGCA 45`.
    Neutral,
}

/// A whitespace-normalized legal citation.
///
/// The inner string is collapsed to single spaces on construction; no other
/// normalization happens automatically. The `Ch ` / `Ch. ` indexing quirk is
/// handled at search time via [`Citation::search_key`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Citation(String);

impl Citation {
    /// Create a citation, collapsing all whitespace runs to single spaces.
    pub fn new(raw: &str) -> Self {
        Citation(raw.split_whitespace().collect::<Vec<_>>().join(" "))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Classify against a list of recognized report-series abbreviations.
    ///
    /// Anything that does not carry a known report abbreviation is treated as
    /// a neutral citation and resolved via its parallel citations.
    pub fn kind<S: AsRef<str>>(&self, report_series: &[S]) -> CitationKind {
        if report_series.iter().any(|s| self.0.contains(s.as_ref())) {
            CitationKind::LawReport
        } else {
            CitationKind::Neutral
        }
    }

    /// The string submitted to the portal search box.
    ///
    /// The portal indexes the Chancery series as `Ch.`, so a bare `Ch ` is
    /// rewritten before searching. Both spellings must map to the same case.
    pub fn search_key(&self) -> String {
        self.0.replace("Ch ", "Ch. ")
    }

    /// First four-digit year in the citation, if any.
    pub fn year(&self) -> Option<u16> {
        YEAR.captures(&self.0)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }
}

impl fmt::Display for Citation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Citation {
    fn from(raw: &str) -> Self {
        Citation::new(raw)
    }
}

/// A deduplicated set of citations from one reading list.
///
/// Backed by a `BTreeSet` so CLI output and download scheduling are
/// deterministic across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CitationSet(BTreeSet<Citation>);

impl CitationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, citation: Citation) -> bool {
        self.0.insert(citation)
    }

    pub fn contains(&self, citation: &Citation) -> bool {
        self.0.contains(citation)
    }

    /// Whether any citation in the set has the given text.
    pub fn contains_str(&self, text: &str) -> bool {
        self.0.iter().any(|c| c.as_str() == text)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Citation> {
        self.0.iter()
    }
}

impl FromIterator<Citation> for CitationSet {
    fn from_iter<I: IntoIterator<Item = Citation>>(iter: I) -> Self {
        CitationSet(iter.into_iter().collect())
    }
}

impl IntoIterator for CitationSet {
    type Item = Citation;
    type IntoIter = std::collections::btree_set::IntoIter<Citation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
