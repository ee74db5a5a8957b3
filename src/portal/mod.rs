//! Portal access: authentication, case resolution and PDF URL synthesis.
//!
//! Everything that talks to the legal-research portal lives here. The portal
//! has no API; searches go through the same Liferay form a browser would
//! submit, and results come back as server-rendered HTML. The parsing in this
//! module depends on three portal contracts: result rows carry the
//! `document-title` CSS class with the document id in a pseudo-onclick
//! action, case pages link their PDF through an anchor whose text contains
//! `PDF`, and parallel citations render under the `Citation offhyperlink`
//! class pair.

mod auth;
mod pdf_url;
mod resolver;
mod session;

pub use auth::{AuthError, Credentials, SessionAuthenticator};
pub use pdf_url::{synthesizable, synthesize_pdf_url};
pub use resolver::CaseResolver;
pub use session::Session;

use thiserror::Error;

/// Per-citation portal failures. None of these abort the run; each is
/// reported against the citation it belongs to.
#[derive(Debug, Error)]
pub enum PortalError {
    /// An expected page element (search form, hidden token) was missing.
    /// Usually means the portal layout changed.
    #[error("portal page format changed: {0}")]
    FormatChanged(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Write(#[from] crate::writer::WriteError),
}
