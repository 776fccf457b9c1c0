//! HTTP utilities shared by the authentication handlers and the Superset client.
//!
//! Every outgoing request in the application is issued by a `reqwest::Client`
//! built from [`HttpRequestConfig`], so one timeout governs token, CSRF and API
//! calls alike.

use crate::configuration::Configuration;
use reqwest::Client;
use std::time::Duration;
use tracing::warn;
use url::Url;

pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Longest error body kept for diagnostics.
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Settings applied to every HTTP client the application builds
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequestConfig {
    /// Value of the `User-Agent` header
    pub user_agent: String,
    /// Total request timeout
    pub timeout: Duration,
}

impl Default for HttpRequestConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("sup/{}", env!("CARGO_PKG_VERSION")),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl HttpRequestConfig {
    pub fn from_configuration(configuration: &Configuration) -> Self {
        Self {
            timeout: Duration::from_secs(configuration.timeout_secs()),
            ..Self::default()
        }
    }

    pub fn build_client(&self) -> Result<Client, reqwest::Error> {
        Client::builder()
            .user_agent(self.user_agent.as_str())
            .timeout(self.timeout)
            .build()
    }
}

/// Resolve `path` relative to `base`, tolerating a base without trailing slash.
///
/// `https://host/superset` + `api/v1/chart/` gives
/// `https://host/superset/api/v1/chart/`.
pub fn endpoint(base: &Url, path: &str) -> Result<Url, url::ParseError> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path_with_slash = format!("{}/", base.path());
        base.set_path(&path_with_slash);
    }
    base.join(path.trim_start_matches('/'))
}

/// Read a failed response body for an error message, truncated.
pub async fn read_error_body(response: reqwest::Response) -> String {
    match response.text().await {
        Ok(text) => text.chars().take(MAX_ERROR_BODY_CHARS).collect(),
        Err(e) => {
            warn!("Failed to read error response body: {}", e);
            "Unable to read error response body".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_client_config_default() {
        let config = HttpRequestConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert!(config.user_agent.starts_with("sup/"));
    }

    #[test]
    fn test_endpoint_joins_root_url() {
        let base = Url::parse("https://superset.example.com").unwrap();
        let url = endpoint(&base, "api/v1/security/csrf_token/").unwrap();
        assert_eq!(
            url.as_str(),
            "https://superset.example.com/api/v1/security/csrf_token/"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let base = Url::parse("https://example.com/superset").unwrap();
        let url = endpoint(&base, "/api/v1/chart/").unwrap();
        assert_eq!(url.as_str(), "https://example.com/superset/api/v1/chart/");

        let base = Url::parse("https://example.com/superset/").unwrap();
        let url = endpoint(&base, "api/v1/chart/").unwrap();
        assert_eq!(url.as_str(), "https://example.com/superset/api/v1/chart/");
    }
}
