//! OAuth2 authentication for Superset instances behind an external OIDC provider.
//!
//! Implements the resource owner password grant (RFC 6749 section 4.3) for
//! service accounts. The access token is refreshed on demand once it is within
//! [`REFRESH_BUFFER_SECS`] of its advertised expiry.
//!
//! The CSRF token is cached independently of the access token: refreshing the
//! access token keeps the CSRF token that was issued with the previous one.
//! Whether Superset keeps honouring it across a token refresh depends on the
//! deployment. Callers that start getting 403 responses on long sessions can
//! drop it with [`OAuthSupersetAuth::invalidate_csrf`].

use crate::auth::csrf::fetch_csrf_token;
use crate::auth::{
    authorization_value, Auth, AuthError, AuthHeaders, AuthMethod, Clock, SystemClock,
    AUTHORIZATION_HEADER, CSRF_HEADER,
};
use crate::http_utils::read_error_body;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;
use url::Url;

pub const DEFAULT_SCOPE: &str = "openid profile email roles";
pub const DEFAULT_TOKEN_TYPE: &str = "Bearer";

/// Tokens are considered stale this many seconds before they nominally expire.
pub const REFRESH_BUFFER_SECS: i64 = 300;

/// Long lived credentials of one OAuth2 session. Never mutated after construction.
#[derive(Clone, PartialEq)]
pub struct OAuthCredentials {
    base_url: Url,
    token_url: Url,
    client_id: String,
    client_secret: String,
    username: String,
    password: String,
    scope: String,
    token_type: String,
}

impl OAuthCredentials {
    pub fn new(
        base_url: Url,
        token_url: Url,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url,
            token_url,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            username: username.into(),
            password: password.into(),
            scope: DEFAULT_SCOPE.to_string(),
            token_type: DEFAULT_TOKEN_TYPE.to_string(),
        }
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    pub fn with_token_type(mut self, token_type: impl Into<String>) -> Self {
        self.token_type = token_type.into();
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn token_url(&self) -> &Url {
        &self.token_url
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn token_type(&self) -> &str {
        &self.token_type
    }
}

impl std::fmt::Debug for OAuthCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthCredentials")
            .field("base_url", &self.base_url.as_str())
            .field("token_url", &self.token_url.as_str())
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("scope", &self.scope)
            .field("token_type", &self.token_type)
            .finish()
    }
}

/// Cached session tokens. Only the current values are kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenState {
    pub access_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub csrf_token: Option<String>,
}

/// Expiry policy: unknown expiry counts as expired, and so does anything
/// inside the refresh buffer.
pub fn is_expired(state: &TokenState, now: DateTime<Utc>) -> bool {
    match state.expires_at {
        None => true,
        Some(expires_at) => now >= expires_at - Duration::seconds(REFRESH_BUFFER_SECS),
    }
}

/// `now + expires_in`, or `None` when the instant is not representable.
fn expiry_after(now: DateTime<Utc>, expires_in: i64) -> Option<DateTime<Utc>> {
    Duration::try_seconds(expires_in).and_then(|lifetime| now.checked_add_signed(lifetime))
}

/// A validated token endpoint answer, not yet committed to the state.
struct IssuedToken {
    access_token: String,
    expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<i64>,
}

/// OAuth2 credential facade: hands out authorization headers, refreshing the
/// access token when the expiry policy says so.
///
/// Each instance owns its token state. Check-then-fetch sequences hold the
/// state lock for their whole duration, so concurrent callers wait for one
/// refresh instead of issuing their own.
pub struct OAuthSupersetAuth {
    credentials: OAuthCredentials,
    http: reqwest::Client,
    clock: Arc<dyn Clock>,
    state: Mutex<TokenState>,
}

impl OAuthSupersetAuth {
    /// Store the credentials. No network traffic happens until
    /// [`OAuthSupersetAuth::authenticate`] or a getter is called.
    pub fn new(credentials: OAuthCredentials, http: reqwest::Client) -> Self {
        Self {
            credentials,
            http,
            clock: Arc::new(SystemClock),
            state: Mutex::new(TokenState::default()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn credentials(&self) -> &OAuthCredentials {
        &self.credentials
    }

    /// Snapshot of the cached tokens.
    pub async fn token_state(&self) -> TokenState {
        self.state.lock().await.clone()
    }

    /// Fetch a new access token and a new CSRF token, regardless of the cache.
    ///
    /// Both are committed together: if either request fails the cached state
    /// is left as it was.
    pub async fn authenticate(&self) -> Result<(), AuthError> {
        debug!("Initializing OAuth2 authentication");
        let mut state = self.state.lock().await;
        let issued = self.fetch_access_token().await?;
        let csrf_token = self.fetch_csrf_token(&issued.access_token).await?;

        *state = TokenState {
            access_token: Some(issued.access_token),
            expires_at: issued.expires_at,
            csrf_token: Some(csrf_token),
        };
        Ok(())
    }

    /// Cached access token, or a freshly fetched one if it is missing or stale.
    pub async fn get_access_token(&self) -> Result<String, AuthError> {
        let mut state = self.state.lock().await;
        self.ensure_access_token(&mut state).await
    }

    /// Cached CSRF token, fetched with a valid access token when absent.
    pub async fn get_csrf_token(&self) -> Result<String, AuthError> {
        let mut state = self.state.lock().await;
        self.ensure_csrf_token(&mut state).await
    }

    /// `Authorization` and `X-CSRFToken` headers. The access token is resolved
    /// before the CSRF token.
    pub async fn get_headers(&self) -> Result<AuthHeaders, AuthError> {
        let mut state = self.state.lock().await;
        let access_token = self.ensure_access_token(&mut state).await?;
        let csrf_token = self.ensure_csrf_token(&mut state).await?;

        let mut headers = AuthHeaders::new();
        headers.insert(
            AUTHORIZATION_HEADER.to_string(),
            authorization_value(&self.credentials.token_type, &access_token),
        );
        headers.insert(CSRF_HEADER.to_string(), csrf_token);
        Ok(headers)
    }

    /// Forget the CSRF token so the next request fetches a new one.
    pub async fn invalidate_csrf(&self) {
        debug!("Invalidating cached CSRF token");
        self.state.lock().await.csrf_token = None;
    }

    async fn ensure_access_token(&self, state: &mut TokenState) -> Result<String, AuthError> {
        if let Some(token) = &state.access_token {
            if !is_expired(state, self.clock.now()) {
                return Ok(token.clone());
            }
        }
        debug!("Access token expired or not set, refreshing...");
        let issued = self.fetch_access_token().await?;
        state.access_token = Some(issued.access_token.clone());
        state.expires_at = issued.expires_at;
        Ok(issued.access_token)
    }

    async fn ensure_csrf_token(&self, state: &mut TokenState) -> Result<String, AuthError> {
        if let Some(csrf_token) = &state.csrf_token {
            return Ok(csrf_token.clone());
        }
        let access_token = self.ensure_access_token(state).await?;
        let csrf_token = self.fetch_csrf_token(&access_token).await?;
        state.csrf_token = Some(csrf_token.clone());
        Ok(csrf_token)
    }

    /// Password grant exchange. Only returns a token once the whole response,
    /// expiry included, has been validated.
    async fn fetch_access_token(&self) -> Result<IssuedToken, AuthError> {
        let credentials = &self.credentials;
        let params = [
            ("grant_type", "password"),
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
            ("username", credentials.username.as_str()),
            ("password", credentials.password.as_str()),
            ("scope", credentials.scope.as_str()),
        ];

        debug!(
            "Fetching access token from {} for user {}",
            credentials.token_url, credentials.username
        );

        let response = self
            .http
            .post(credentials.token_url.clone())
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        debug!("Token endpoint response status: {}", status);
        if !status.is_success() {
            return Err(AuthError::Authentication {
                url: credentials.token_url.to_string(),
                status,
                body: read_error_body(response).await,
            });
        }

        let body = response.text().await?;
        let malformed = |field: &'static str| AuthError::MalformedResponse {
            url: credentials.token_url.to_string(),
            field,
        };
        let token: TokenResponse =
            serde_json::from_str(&body).map_err(|_| malformed("access_token"))?;
        let access_token = token
            .access_token
            .ok_or_else(|| malformed("access_token"))?;

        let expires_at = match token.expires_in {
            None => None,
            Some(expires_in) => {
                let expires_at = expiry_after(self.clock.now(), expires_in)
                    .ok_or_else(|| malformed("expires_in"))?;
                debug!(
                    "Access token will expire in {} seconds ({})",
                    expires_in, expires_at
                );
                Some(expires_at)
            }
        };

        Ok(IssuedToken {
            access_token,
            expires_at,
        })
    }

    async fn fetch_csrf_token(&self, access_token: &str) -> Result<String, AuthError> {
        let authorization = authorization_value(&self.credentials.token_type, access_token);
        fetch_csrf_token(&self.http, &self.credentials.base_url, &authorization).await
    }
}

#[async_trait]
impl Auth for OAuthSupersetAuth {
    fn method(&self) -> AuthMethod {
        AuthMethod::Oauth
    }

    async fn authenticate(&self) -> Result<(), AuthError> {
        OAuthSupersetAuth::authenticate(self).await
    }

    async fn headers(&self) -> Result<AuthHeaders, AuthError> {
        self.get_headers().await
    }
}
