//! CSRF token retrieval shared by the session based handlers.

use crate::auth::{AuthError, AUTHORIZATION_HEADER};
use crate::http_utils::{endpoint, read_error_body};
use serde::Deserialize;
use tracing::debug;
use url::Url;

pub const CSRF_TOKEN_PATH: &str = "api/v1/security/csrf_token/";

#[derive(Debug, Deserialize)]
struct CsrfResponse {
    result: Option<String>,
}

/// GET the anti-forgery token using an already valid `Authorization` value.
pub async fn fetch_csrf_token(
    http: &reqwest::Client,
    base_url: &Url,
    authorization: &str,
) -> Result<String, AuthError> {
    let url = endpoint(base_url, CSRF_TOKEN_PATH)?;
    debug!("Fetching CSRF token from {}", url);

    let response = http
        .get(url.clone())
        .header(AUTHORIZATION_HEADER, authorization)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(AuthError::Authentication {
            url: url.to_string(),
            status,
            body: read_error_body(response).await,
        });
    }

    let body = response.text().await?;
    let malformed = || AuthError::MalformedResponse {
        url: url.to_string(),
        field: "result",
    };
    let parsed: CsrfResponse = serde_json::from_str(&body).map_err(|_| malformed())?;
    let token = parsed.result.ok_or_else(malformed)?;

    debug!("Successfully fetched CSRF token");
    Ok(token)
}
