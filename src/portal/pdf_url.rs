//! Backend PDF-resource URL construction.
//!
//! For law-report citations the portal's case page does not always expose a
//! PDF link, but the backend serves PDFs under a resource name derived from
//! the citation. The derivation is not algorithmic; it is a byte-for-byte
//! reproduction of the portal's internal storage naming, one rule per report
//! series, evaluated in priority order. Pure function, no network I/O.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::InstitutionConfig;
use crate::models::Citation;

static TRAILING_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)$").expect("page regex"));
static YEAR_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\[(][1-2]\d{3}(?:-[1-2]\d{3})?[\])]").expect("year token regex"));

/// Report families the backend exposes through this naming convention.
const SYNTHESIZABLE: &[&str] = &["SLR", "SSAR", "WLR", "AC", "A.C.", "Ch"];

/// Whether a synthesized URL can exist for this citation at all.
pub fn synthesizable(citation: &Citation) -> bool {
    SYNTHESIZABLE.iter().any(|s| citation.as_str().contains(s))
}

/// Construct the backend PDF URL for a citation and its document id.
///
/// Deterministic: repeated calls with the same inputs yield identical URLs.
pub fn synthesize_pdf_url(
    institution: &InstitutionConfig,
    citation: &Citation,
    doc_id: &str,
) -> String {
    let resource = resource_name(citation);
    format!(
        "{}?contentDocID={}&pdfFileName={}&pdfFileUri={}.pdf",
        institution.pdf_resource_url,
        urlencoding::encode(doc_id),
        urlencoding::encode(citation.as_str()),
        urlencoding::encode(&resource),
    )
}

/// The portal's storage name for a citation, rule per report series.
fn resource_name(citation: &Citation) -> String {
    let text = citation.as_str();
    let year = citation.year();

    if text.contains("SLR") {
        zero_pad_page(text)
    } else if text.contains("SSAR") {
        // Volumes from 1985 to 2010 are stored under a literal range token
        // instead of the individual year.
        if matches!(year, Some(y) if (1985..=2010).contains(&y)) {
            zero_pad_page(&YEAR_TOKEN.replace(text, "(1985-2010)"))
        } else {
            zero_pad_page(text)
        }
    } else if text.contains("WLR") && matches!(year, Some(y) if (2008..=2020).contains(&y)) {
        text.replace(' ', "-").replace(['[', ']'], "")
    } else if text.contains("AC") {
        text.replace(' ', "-")
    } else if text.contains("A.C.") {
        text.replace("A.C.", "AC")
    } else if text.contains("Ch.") {
        text.replace("Ch.", "Ch")
    } else {
        text.to_string()
    }
}

/// Zero-pad the trailing page number to four digits.
fn zero_pad_page(text: &str) -> String {
    TRAILING_NUMBER
        .replace(text, |caps: &regex::Captures<'_>| {
            format!("{:0>4}", &caps[1])
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InstitutionConfig;

    fn url_for(citation: &str) -> String {
        synthesize_pdf_url(
            &InstitutionConfig::default(),
            &Citation::new(citation),
            "12345",
        )
    }

    #[test]
    fn slr_zero_pads_the_page_number() {
        assert_eq!(
            resource_name(&Citation::new("[1994] 1 SLR 513")),
            "[1994] 1 SLR 0513"
        );
    }

    #[test]
    fn slr_leaves_four_digit_pages_alone() {
        assert_eq!(
            resource_name(&Citation::new("[2016] 3 SLR 1621")),
            "[2016] 3 SLR 1621"
        );
    }

    #[test]
    fn ssar_in_range_uses_the_range_token() {
        assert_eq!(
            resource_name(&Citation::new("[1998] 2 SSAR 41")),
            "(1985-2010) 2 SSAR 0041"
        );
    }

    #[test]
    fn ssar_out_of_range_only_pads() {
        assert_eq!(
            resource_name(&Citation::new("[2015] 1 SSAR 7")),
            "[2015] 1 SSAR 0007"
        );
    }

    #[test]
    fn wlr_in_range_hyphenates_and_strips_brackets() {
        assert_eq!(
            resource_name(&Citation::new("[2012] 2 WLR 367")),
            "2012-2-WLR-367"
        );
    }

    #[test]
    fn wlr_out_of_range_is_untouched() {
        assert_eq!(
            resource_name(&Citation::new("[1992] 2 WLR 367")),
            "[1992] 2 WLR 367"
        );
    }

    #[test]
    fn ac_hyphenates() {
        assert_eq!(
            resource_name(&Citation::new("[1967] 2 AC 134")),
            "[1967]-2-AC-134"
        );
    }

    #[test]
    fn dotted_ac_rewrites_without_hyphenation() {
        assert_eq!(
            resource_name(&Citation::new("[1951] 1 A.C. 850")),
            "[1951] 1 AC 850"
        );
    }

    #[test]
    fn dotted_chancery_rewrites_to_plain_form() {
        assert_eq!(
            resource_name(&Citation::new("[1980] 1 Ch. 576")),
            "[1980] 1 Ch 576"
        );
    }

    #[test]
    fn unknown_series_uses_citation_verbatim() {
        assert_eq!(
            resource_name(&Citation::new("[1989] 3 MLJ 385")),
            "[1989] 3 MLJ 385"
        );
    }

    #[test]
    fn synthesis_is_byte_identical_across_calls() {
        let first = url_for("[1994] 1 SLR 513");
        let second = url_for("[1994] 1 SLR 513");
        assert_eq!(first, second);
        assert!(first.contains("contentDocID=12345"));
        assert!(first.contains(&urlencoding::encode("[1994] 1 SLR 0513").into_owned()));
    }

    #[test]
    fn synthesizable_covers_backend_series_only() {
        assert!(synthesizable(&Citation::new("[1994] 1 SLR 513")));
        assert!(synthesizable(&Citation::new("[1980] 1 Ch. 576")));
        assert!(!synthesizable(&Citation::new("[1989] 3 MLJ 385")));
        assert!(!synthesizable(&Citation::new("[2019] SGCA 45")));
    }
}
