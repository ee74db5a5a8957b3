//! Case resolution: search the portal, pick the right result, fetch the
//! artifact, and hand it to the writer.
//!
//! The search POST is the only portal operation that must not run
//! concurrently: search state is per session and interleaved submissions
//! corrupt each other's results. A shared lock serializes the search-page GET
//! and the POST as one unit; everything after (case page, PDF fetch) runs
//! unsynchronized because the portal tolerates concurrent reads.

use std::sync::Arc;

use scraper::{Html, Selector};
use tokio::sync::Mutex;
use url::Url;

use crate::models::{Citation, CitationKind, CitationSet, DownloadOutcome, SearchHit};
use crate::portal::{synthesizable, synthesize_pdf_url, PortalError, Session};
use crate::writer::{ArtifactWriter, WriteError};

/// Liferay portlet form name on the basic-search page.
const SEARCH_FORM_NAME: &str = "_searchbasicformportlet_WAR_lawnet3legalresearchportlet_bsfm";

/// Hidden anti-replay token that must be POSTed with every search.
const FORM_DATE_FIELD: &str = "_searchbasicformportlet_WAR_lawnet3legalresearchportlet_formDate";

/// Legal-document category ids submitted with every search, as the browser
/// sends them.
const SEARCH_CATEGORIES: &[&str] = &["1", "2", "4", "5", "6", "7", "8", "27"];

/// Resolves one citation to a downloaded artifact using a shared [`Session`].
#[derive(Debug)]
pub struct CaseResolver {
    session: Session,
    /// The run's full input citation set, for parallel-citation duplicate
    /// detection on neutral citations.
    run_set: Arc<CitationSet>,
    writer: Arc<ArtifactWriter>,
    search_lock: Arc<Mutex<()>>,
}

#[derive(Debug)]
struct SearchForm {
    action: String,
    form_date: String,
}

impl CaseResolver {
    pub fn new(
        session: Session,
        run_set: Arc<CitationSet>,
        writer: Arc<ArtifactWriter>,
        search_lock: Arc<Mutex<()>>,
    ) -> Self {
        Self {
            session,
            run_set,
            writer,
            search_lock,
        }
    }

    /// Full pipeline for one citation: search, disambiguate, locate the
    /// artifact, write it to disk.
    pub async fn resolve(&self, citation: &Citation) -> Result<DownloadOutcome, PortalError> {
        let institution = self.session.institution();
        let search_key = citation.search_key();

        let results_html = self.submit_search(&search_key).await?;
        let hits = parse_search_hits(&results_html);
        if hits.is_empty() {
            return Ok(DownloadOutcome::NotFound);
        }

        let hit = match citation.kind(&institution.report_series) {
            CitationKind::LawReport => {
                // First result whose display title carries the citation.
                let wanted = search_key.to_lowercase();
                match hits
                    .into_iter()
                    .find(|hit| hit.title.to_lowercase().contains(&wanted))
                {
                    Some(hit) => hit,
                    None => return Ok(DownloadOutcome::NotFound),
                }
            }
            // Neutral citations take the first result unconditionally and are
            // verified against the case page's parallel citations below.
            CitationKind::Neutral => match hits.into_iter().next() {
                Some(hit) => hit,
                None => return Ok(DownloadOutcome::NotFound),
            },
        };

        let doc_id = hit
            .doc_id()
            .ok_or_else(|| {
                PortalError::FormatChanged("result link carries no document id".to_string())
            })?
            .to_string();
        let case_url = format!("{}{}", institution.content_url, doc_id);
        let case_html = self
            .session
            .client()
            .get(&case_url)
            .send()
            .await?
            .text()
            .await?;

        if citation.kind(&institution.report_series) == CitationKind::Neutral {
            let parallels = parse_parallel_citations(&case_html);
            if !parallels.iter().any(|p| p == citation.as_str()) {
                return Ok(DownloadOutcome::NotFound);
            }
            // A case already scheduled under its report citation is not
            // fetched a second time under the neutral one.
            if let Some(dup) = parallels
                .iter()
                .find(|p| p.contains("SLR") && self.run_set.contains_str(p))
            {
                return Ok(DownloadOutcome::DuplicateOf(Citation::new(dup)));
            }
        }

        self.fetch_artifact(citation, &hit, &doc_id, &case_url, &case_html)
            .await
    }

    /// Serialized search submission: load the form, then POST the key.
    async fn submit_search(&self, search_key: &str) -> Result<String, PortalError> {
        let institution = self.session.institution();
        let client = self.session.client();

        let _guard = self.search_lock.lock().await;

        let page = client
            .get(&institution.search_url)
            .send()
            .await?
            .text()
            .await?;
        let form = parse_search_form(&page)?;
        let action = absolutize(&institution.search_url, &form.action)?;

        let mut payload: Vec<(&str, &str)> = vec![("grouping", "1")];
        for category in SEARCH_CATEGORIES {
            payload.push(("category", category));
        }
        payload.push((FORM_DATE_FIELD, &form.form_date));
        payload.push(("basicSearchKey", search_key));

        Ok(client
            .post(action)
            .form(&payload)
            .send()
            .await?
            .text()
            .await?)
    }

    /// Artifact location: direct PDF link, synthesized PDF URL, then the
    /// rendered case page.
    async fn fetch_artifact(
        &self,
        citation: &Citation,
        hit: &SearchHit,
        doc_id: &str,
        case_url: &str,
        case_html: &str,
    ) -> Result<DownloadOutcome, PortalError> {
        let institution = self.session.institution();
        let client = self.session.client();
        let filename = if hit.title.is_empty() {
            citation.as_str().to_string()
        } else {
            hit.title.clone()
        };

        if let Some(href) = parse_pdf_href(case_html) {
            let pdf_url = absolutize(case_url, &href)?;
            let response = client.get(pdf_url).send().await?.error_for_status()?;
            let bytes = response.bytes().await?;
            let path = self.writer.save_pdf(&filename, &bytes)?;
            return Ok(DownloadOutcome::PdfSaved(path));
        }

        if synthesizable(citation) {
            let url = synthesize_pdf_url(institution, citation, doc_id);
            tracing::debug!(citation = %citation, url = %url, "trying synthesized PDF URL");
            let response = client.get(&url).send().await?;
            if response.status().is_success() {
                let bytes = response.bytes().await?;
                if bytes.starts_with(b"%PDF") {
                    let path = self.writer.save_pdf(&filename, &bytes)?;
                    return Ok(DownloadOutcome::PdfSaved(path));
                }
                tracing::debug!(citation = %citation, "synthesized URL returned non-PDF content");
            }
        }

        // Last resort: keep the case page itself, rendered to PDF when the
        // content region can be found, raw HTML otherwise.
        match self.writer.save_html_as_pdf(&filename, case_html) {
            Ok(path) => Ok(DownloadOutcome::HtmlSaved(path)),
            Err(WriteError::Render(reason)) => {
                tracing::warn!(citation = %citation, reason = %reason, "HTML render failed, saving raw HTML");
                let path = self.writer.save_html(&filename, case_html)?;
                Ok(DownloadOutcome::HtmlSaved(path))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Resolve a possibly-relative href against the page it appeared on.
fn absolutize(base: &str, href: &str) -> Result<Url, PortalError> {
    let parse = if href.starts_with("http://") || href.starts_with("https://") {
        Url::parse(href)
    } else {
        Url::parse(base).and_then(|b| b.join(href))
    };
    parse.map_err(|e| PortalError::FormatChanged(format!("bad URL '{}': {}", href, e)))
}

fn parse_search_form(html: &str) -> Result<SearchForm, PortalError> {
    let document = Html::parse_document(html);
    let form_selector = Selector::parse(&format!(r#"form[name="{}"]"#, SEARCH_FORM_NAME))
        .expect("form selector");
    let token_selector =
        Selector::parse(&format!(r#"input[name="{}"]"#, FORM_DATE_FIELD)).expect("token selector");

    let form = document
        .select(&form_selector)
        .next()
        .ok_or_else(|| PortalError::FormatChanged("basic-search form not found".to_string()))?;
    let action = form
        .value()
        .attr("action")
        .ok_or_else(|| PortalError::FormatChanged("search form has no action".to_string()))?
        .to_string();
    let form_date = document
        .select(&token_selector)
        .next()
        .and_then(|input| input.value().attr("value"))
        .ok_or_else(|| PortalError::FormatChanged("formDate token not found".to_string()))?
        .to_string();

    Ok(SearchForm { action, form_date })
}

/// Result rows: elements with the `document-title` class, document id inside
/// the pseudo-onclick action.
fn parse_search_hits(html: &str) -> Vec<SearchHit> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(".document-title").expect("hit selector");
    document
        .select(&selector)
        .map(|element| SearchHit {
            onclick: element.value().attr("onclick").unwrap_or_default().to_string(),
            title: element
                .text()
                .collect::<String>()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" "),
        })
        .collect()
}

/// First real PDF anchor: text mentions PDF and the href is not the `#`
/// placeholder the portal renders when no PDF exists.
fn parse_pdf_href(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("a").expect("anchor selector");
    document.select(&selector).find_map(|anchor| {
        let text: String = anchor.text().collect();
        let href = anchor.value().attr("href")?;
        if text.contains("PDF") && href != "#" && !href.is_empty() {
            Some(href.to_string())
        } else {
            None
        }
    })
}

/// Parallel citations listed on a case page, whitespace-normalized.
fn parse_parallel_citations(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(".Citation.offhyperlink").expect("citation selector");
    document
        .select(&selector)
        .map(|element| {
            element
                .text()
                .collect::<String>()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_form_parses_action_and_token() {
        let html = format!(
            r#"<form name="{}" action="/search-submit">
                <input name="{}" value="1693200000000"/>
            </form>"#,
            SEARCH_FORM_NAME, FORM_DATE_FIELD
        );
        let form = parse_search_form(&html).expect("form");
        assert_eq!(form.action, "/search-submit");
        assert_eq!(form.form_date, "1693200000000");
    }

    #[test]
    fn missing_token_is_a_format_error() {
        let html = format!(r#"<form name="{}" action="/x"></form>"#, SEARCH_FORM_NAME);
        let err = parse_search_form(&html).unwrap_err();
        assert!(matches!(err, PortalError::FormatChanged(_)));
    }

    #[test]
    fn hits_parse_onclick_and_title() {
        let html = r#"
            <a class="document-title" onclick="viewContent('99-SSP.xml')">
                Living the Link Pte Ltd - [2016] 3 SLR 621
            </a>
            <a class="document-title" onclick="viewContent('100-SSP.xml')">Other Case - [2019] SGCA 45</a>
        "#;
        let hits = parse_search_hits(html);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].doc_id(), Some("99-SSP.xml"));
        assert_eq!(hits[0].title, "Living the Link Pte Ltd - [2016] 3 SLR 621");
    }

    #[test]
    fn placeholder_pdf_anchor_is_ignored() {
        let html = r##"<a href="#">PDF</a><a href="/real.pdf">Download PDF</a>"##;
        assert_eq!(parse_pdf_href(html), Some("/real.pdf".to_string()));
    }

    #[test]
    fn no_pdf_anchor_yields_none() {
        let html = r#"<a href="/case.html">HTML only</a>"#;
        assert_eq!(parse_pdf_href(html), None);
    }

    #[test]
    fn parallel_citations_are_normalized() {
        let html = r#"
            <span class="Citation offhyperlink">[2016]  3 SLR  621</span>
            <span class="Citation offhyperlink">[2019] SGCA 45</span>
        "#;
        assert_eq!(
            parse_parallel_citations(html),
            vec!["[2016] 3 SLR 621", "[2019] SGCA 45"]
        );
    }

    #[test]
    fn absolutize_joins_relative_hrefs() {
        let url = absolutize("https://portal.example/a/b", "/pdf/1.pdf").expect("join");
        assert_eq!(url.as_str(), "https://portal.example/pdf/1.pdf");
        let url = absolutize("https://portal.example/a/b", "https://other.example/x").expect("abs");
        assert_eq!(url.as_str(), "https://other.example/x");
    }
}
