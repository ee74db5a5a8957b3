//! Federated single-sign-on against the institution's IdP and the portal proxy.
//!
//! The handshake is a scripted SAML/Shibboleth exchange: probe the proxy for
//! an existing session, otherwise relay the `SAMLRequest` to the IdP, submit
//! forms credentials, and post the signed `SAMLResponse` back to the proxy's
//! assertion-consumer endpoint. There are no retries; any failure is terminal
//! for the run and the caller decides whether to prompt for new credentials.

use std::sync::Arc;

use scraper::{Html, Selector};
use thiserror::Error;

use crate::config::{InstitutionConfig, UserType};
use crate::portal::session::{build_client, Session};

/// Login failures. All of these abort the run before any citation is
/// processed.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The proxy's response carried no SAMLRequest/RelayState pair.
    #[error("malformed identity-provider redirect: no SAML request found")]
    MalformedIdpRedirect,

    /// Relaying the SAML request did not land on the IdP login form.
    #[error("identity provider did not present the expected login form")]
    UnexpectedLoginPage,

    /// The credential POST produced no SAMLResponse: wrong password or an
    /// IdP-side error page.
    #[error("login rejected: bad credentials or identity-provider error")]
    BadCredentials,

    /// The assertion was consumed but the portal still refused access.
    #[error("portal did not grant access after sign-on")]
    AccessDenied,

    #[error("HTTP error during login: {0}")]
    Http(#[from] reqwest::Error),
}

/// Login details for one run.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub user_type: UserType,
}

/// Performs the SSO handshake and produces a reusable [`Session`].
#[derive(Debug)]
pub struct SessionAuthenticator {
    institution: Arc<InstitutionConfig>,
    client: Arc<reqwest::Client>,
}

impl SessionAuthenticator {
    pub fn new(institution: InstitutionConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            institution: Arc::new(institution),
            client: Arc::new(build_client()?),
        })
    }

    /// Run the sign-on state machine.
    ///
    /// If the client's cookie jar already holds a live session, the probe
    /// short-circuits and no credentials are sent.
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        let inst = &*self.institution;

        // ProbeExisting: an authenticated jar lands straight on the search page.
        let probe = self.client.get(&inst.auth_init_url).send().await?;
        if self.landed_on_search(probe.url().as_str()) {
            tracing::info!("existing session still valid, skipping credential exchange");
            return Ok(self.session());
        }

        // ExtractSamlRequest from the proxy's redirect page.
        let body = probe.text().await?;
        let (saml_request, relay_state) =
            saml_fields(&body, "SAMLRequest").ok_or(AuthError::MalformedIdpRedirect)?;

        // PostToIdentityProvider: relay the request; we must end up on the
        // IdP's forms-login page.
        let idp_page = self
            .client
            .post(&inst.idp_login_url)
            .form(&[
                ("SAMLRequest", saml_request.as_str()),
                ("RelayState", relay_state.as_str()),
            ])
            .send()
            .await?;
        if !idp_page.url().as_str().starts_with(&inst.idp_login_url) {
            return Err(AuthError::UnexpectedLoginPage);
        }
        let login_form_url = idp_page.url().clone();

        // SubmitCredentials with the institution's domain prefix.
        let login = format!(
            "{}\\{}",
            inst.login_prefix(credentials.user_type),
            credentials.username
        );
        let response_page = self
            .client
            .post(login_form_url)
            .form(&[
                ("UserName", login.as_str()),
                ("Password", credentials.password.as_str()),
                ("AuthMethod", "FormsAuthentication"),
            ])
            .send()
            .await?
            .text()
            .await?;

        // ExtractSamlResponse: absent on bad credentials or IdP error pages.
        let (saml_response, relay_state) =
            saml_fields(&response_page, "SAMLResponse").ok_or(AuthError::BadCredentials)?;

        // PostAssertion to the proxy's assertion-consumer endpoint.
        self.client
            .post(&inst.acs_url)
            .form(&[
                ("SAMLResponse", saml_response.as_str()),
                ("RelayState", relay_state.as_str()),
            ])
            .send()
            .await?;

        // ConfirmAccess: the jar must now carry us to the search page.
        let confirm = self.client.get(&inst.auth_init_url).send().await?;
        if self.landed_on_search(confirm.url().as_str()) {
            tracing::info!("portal sign-on complete");
            Ok(self.session())
        } else {
            Err(AuthError::AccessDenied)
        }
    }

    fn landed_on_search(&self, url: &str) -> bool {
        url.starts_with(&self.institution.search_url)
    }

    fn session(&self) -> Session {
        Session::new(Arc::clone(&self.client), Arc::clone(&self.institution))
    }
}

/// Pull a `(field, RelayState)` hidden-input pair out of an HTML page.
fn saml_fields(html: &str, field: &str) -> Option<(String, String)> {
    let document = Html::parse_document(html);
    let value_of = |name: &str| {
        let selector = Selector::parse(&format!(r#"input[name="{}"]"#, name)).ok()?;
        document
            .select(&selector)
            .next()
            .and_then(|input| input.value().attr("value"))
            .map(|v| v.to_string())
    };
    Some((value_of(field)?, value_of("RelayState")?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saml_fields_extracts_hidden_inputs() {
        let html = r#"<html><body><form>
            <input type="hidden" name="SAMLRequest" value="req-token"/>
            <input type="hidden" name="RelayState" value="relay-token"/>
        </form></body></html>"#;
        assert_eq!(
            saml_fields(html, "SAMLRequest"),
            Some(("req-token".to_string(), "relay-token".to_string()))
        );
    }

    #[test]
    fn saml_fields_missing_relay_state_is_none() {
        let html = r#"<input name="SAMLResponse" value="resp"/>"#;
        assert_eq!(saml_fields(html, "SAMLResponse"), None);
    }

    #[test]
    fn saml_fields_missing_field_is_none() {
        let html = r#"<input name="RelayState" value="relay"/>"#;
        assert_eq!(saml_fields(html, "SAMLRequest"), None);
    }
}
