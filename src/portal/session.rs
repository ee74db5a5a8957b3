//! Authenticated portal session.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::config::InstitutionConfig;

/// Browser-like user agent; the IdP serves a different (script-hostile) login
/// flow to unknown agents.
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_12_6) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/67.0.3396.87 Safari/537.36";

/// An authenticated portal session.
///
/// Wraps the HTTP client whose cookie jar holds the proxy and portal cookies
/// established during login. The jar is never mutated after authentication,
/// so the session is shared read-only across all download workers. Cookies
/// live only in memory and are discarded with the run.
#[derive(Debug, Clone)]
pub struct Session {
    client: Arc<Client>,
    institution: Arc<InstitutionConfig>,
}

impl Session {
    pub(crate) fn new(client: Arc<Client>, institution: Arc<InstitutionConfig>) -> Self {
        Self {
            client,
            institution,
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn institution(&self) -> &InstitutionConfig {
        &self.institution
    }
}

/// Build the cookie-carrying client every request in a run goes through.
pub(crate) fn build_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(USER_AGENT)
        .cookie_store(true)
        .timeout(Duration::from_secs(60))
        .connect_timeout(Duration::from_secs(10))
        .build()
}
