//! Configuration management.
//!
//! All institution-specific endpoints and lists live here rather than in code
//! so that a different proxy/IdP pairing only needs a different TOML file.
//!
//! # Configuration File Format
//!
//! ```toml
//! [institution]
//! auth_init_url = "https://login.libproxy.smu.edu.sg/login?qurl=..."
//! search_url = "https://www-lawnet-sg.libproxy.smu.edu.sg/lawnet/group/lawnet/legal-research/basic-search"
//! idp_login_url = "https://login.smu.edu.sg/adfs/ls/"
//! acs_url = "https://login.libproxy.smu.edu.sg/Shibboleth.sso/SAML2/POST"
//! content_url = "https://www-lawnet-sg.libproxy.smu.edu.sg/lawnet/group/lawnet/page-content?...contentDocID="
//! pdf_resource_url = "https://www-lawnet-sg.libproxy.smu.edu.sg/lawnet/delegate/services/getPdf"
//! student_prefix = "smustu"
//! faculty_prefix = "smustf"
//! report_series = ["SLR", "WLR", "MLJ", "AC", "A.C.", "Ch", "Ch.", "SSAR", "QB"]
//!
//! [extractor]
//! whitelist = ["SLR", "SGCA", "SGHC", "WLR", "MLJ", "Ch"]
//!
//! [download]
//! directory = "/home/me/CaseFiles"
//! workers = 10
//! ```
//!
//! Environment overrides: `LAWLIST_DOWNLOAD_DIR`, `LAWLIST_WORKERS`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Portal and identity-provider endpoints
    #[serde(default)]
    pub institution: InstitutionConfig,

    /// Citation extraction settings
    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// Download run settings
    #[serde(default)]
    pub download: DownloadConfig,
}

/// Endpoints and identity details for one institution's portal access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstitutionConfig {
    /// Proxy auth-initiation URL. Landing back on `search_url` from here
    /// means the session is already authenticated.
    #[serde(default = "default_auth_init_url")]
    pub auth_init_url: String,

    /// The portal's authenticated basic-search page.
    #[serde(default = "default_search_url")]
    pub search_url: String,

    /// The institution's ADFS forms-login endpoint.
    #[serde(default = "default_idp_login_url")]
    pub idp_login_url: String,

    /// The proxy's Shibboleth assertion-consumer endpoint.
    #[serde(default = "default_acs_url")]
    pub acs_url: String,

    /// Case-content page URL prefix; the document id is appended.
    #[serde(default = "default_content_url")]
    pub content_url: String,

    /// Backend PDF-resource endpoint for synthesized PDF URLs.
    #[serde(default = "default_pdf_resource_url")]
    pub pdf_resource_url: String,

    /// Domain prefix for student logins, e.g. `smustu`.
    #[serde(default = "default_student_prefix")]
    pub student_prefix: String,

    /// Domain prefix for faculty logins, e.g. `smustf`.
    #[serde(default = "default_faculty_prefix")]
    pub faculty_prefix: String,

    /// Report-series abbreviations the portal indexes as law reports.
    /// Citations without one of these are treated as neutral citations.
    #[serde(default = "default_report_series")]
    pub report_series: Vec<String>,
}

impl Default for InstitutionConfig {
    fn default() -> Self {
        Self {
            auth_init_url: default_auth_init_url(),
            search_url: default_search_url(),
            idp_login_url: default_idp_login_url(),
            acs_url: default_acs_url(),
            content_url: default_content_url(),
            pdf_resource_url: default_pdf_resource_url(),
            student_prefix: default_student_prefix(),
            faculty_prefix: default_faculty_prefix(),
            report_series: default_report_series(),
        }
    }
}

impl InstitutionConfig {
    /// The domain prefix for the given user type.
    pub fn login_prefix(&self, user_type: UserType) -> &str {
        match user_type {
            UserType::Student => &self.student_prefix,
            UserType::Faculty => &self.faculty_prefix,
        }
    }
}

/// Which login prefix to authenticate with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Student,
    Faculty,
}

/// Citation extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// A citation is kept only if it contains one of these abbreviations.
    /// Guards against the law-report grammar over-matching generic
    /// bracketed-year text.
    #[serde(default = "default_whitelist")]
    pub whitelist: Vec<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            whitelist: default_whitelist(),
        }
    }
}

/// Download run settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Where case files are written. Defaults to `~/CaseFiles`.
    #[serde(default = "default_download_dir")]
    pub directory: PathBuf,

    /// Bounded worker pool size for concurrent case downloads.
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            directory: default_download_dir(),
            workers: default_workers(),
        }
    }
}

fn default_auth_init_url() -> String {
    "https://login.libproxy.smu.edu.sg/login?qurl=https%3a%2f%2fwww.lawnet.sg%2flawnet%2fweb%2flawnet%2fip-access".to_string()
}

fn default_search_url() -> String {
    "https://www-lawnet-sg.libproxy.smu.edu.sg/lawnet/group/lawnet/legal-research/basic-search"
        .to_string()
}

fn default_idp_login_url() -> String {
    "https://login.smu.edu.sg/adfs/ls/".to_string()
}

fn default_acs_url() -> String {
    "https://login.libproxy.smu.edu.sg/Shibboleth.sso/SAML2/POST".to_string()
}

fn default_content_url() -> String {
    "https://www-lawnet-sg.libproxy.smu.edu.sg/lawnet/group/lawnet/page-content?p_p_id=legalresearchpagecontent_WAR_lawnet3legalresearchportlet&p_p_lifecycle=1&p_p_state=normal&p_p_mode=view&p_p_col_id=column-2&p_p_col_count=1&_legalresearchpagecontent_WAR_lawnet3legalresearchportlet_action=openContentPage&contentDocID=".to_string()
}

fn default_pdf_resource_url() -> String {
    "https://www-lawnet-sg.libproxy.smu.edu.sg/lawnet/delegate/services/getPdf".to_string()
}

fn default_student_prefix() -> String {
    "smustu".to_string()
}

fn default_faculty_prefix() -> String {
    "smustf".to_string()
}

fn default_report_series() -> Vec<String> {
    ["SLR", "WLR", "MLJ", "AC", "A.C.", "Ch", "Ch.", "SSAR", "QB"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_whitelist() -> Vec<String> {
    ["SLR", "SGCA", "SGHC", "WLR", "MLJ", "Ch"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_download_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("CaseFiles")
}

fn default_workers() -> usize {
    10
}

/// Errors loading or parsing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid {name} override: {value}")]
    InvalidOverride { name: String, value: String },
}

impl Config {
    /// Load configuration: defaults, then the TOML file if given, then
    /// `LAWLIST_*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => toml::from_str(&std::fs::read_to_string(p)?)?,
            None => Config::default(),
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(dir) = std::env::var("LAWLIST_DOWNLOAD_DIR") {
            self.download.directory = PathBuf::from(dir);
        }
        if let Ok(workers) = std::env::var("LAWLIST_WORKERS") {
            self.download.workers =
                workers
                    .parse()
                    .map_err(|_| ConfigError::InvalidOverride {
                        name: "LAWLIST_WORKERS".to_string(),
                        value: workers,
                    })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_all_sections() {
        let config = Config::default();
        assert_eq!(config.download.workers, 10);
        assert!(config.institution.search_url.contains("basic-search"));
        assert!(config
            .extractor
            .whitelist
            .iter()
            .any(|abbr| abbr == "SGCA"));
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: Config = toml::from_str(
            r#"
            [download]
            workers = 3
            "#,
        )
        .expect("parse");
        assert_eq!(config.download.workers, 3);
        assert_eq!(config.institution.student_prefix, "smustu");
    }

    #[test]
    fn login_prefix_follows_user_type() {
        let institution = InstitutionConfig::default();
        assert_eq!(institution.login_prefix(UserType::Student), "smustu");
        assert_eq!(institution.login_prefix(UserType::Faculty), "smustf");
    }
}
