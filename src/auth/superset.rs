//! Authentication against Superset's own security API.

use crate::auth::csrf::fetch_csrf_token;
use crate::auth::{
    authorization_value, Auth, AuthError, AuthHeaders, AuthMethod, AUTHORIZATION_HEADER,
    CSRF_HEADER,
};
use crate::http_utils::{endpoint, read_error_body};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;
use url::Url;

pub const LOGIN_PATH: &str = "api/v1/security/login";
const BEARER: &str = "Bearer";

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
    provider: &'a str,
    refresh: bool,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    access_token: Option<String>,
}

#[derive(Debug, Default, Clone)]
struct SessionState {
    access_token: Option<String>,
    csrf_token: Option<String>,
}

/// Database login with a Superset username and password.
///
/// The token returned by the login endpoint is kept for the whole session; an
/// expired token surfaces as a 401 from the API, on which the client calls
/// [`Auth::authenticate`] again.
pub struct UsernamePasswordAuth {
    base_url: Url,
    username: String,
    password: String,
    http: reqwest::Client,
    state: Mutex<SessionState>,
}

impl UsernamePasswordAuth {
    pub fn new(
        base_url: Url,
        username: impl Into<String>,
        password: impl Into<String>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            base_url,
            username: username.into(),
            password: password.into(),
            http,
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    async fn login(&self) -> Result<String, AuthError> {
        let url = endpoint(&self.base_url, LOGIN_PATH)?;
        debug!("Logging in to {} as {}", url, self.username);

        let request = LoginRequest {
            username: &self.username,
            password: &self.password,
            provider: "db",
            refresh: true,
        };
        let response = self.http.post(url.clone()).json(&request).send().await?;

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
            field: "access_token",
        };
        let login: LoginResponse = serde_json::from_str(&body).map_err(|_| malformed())?;
        login.access_token.ok_or_else(malformed)
    }

    async fn establish(&self, state: &mut SessionState) -> Result<(), AuthError> {
        let access_token = self.login().await?;
        let csrf_token = fetch_csrf_token(
            &self.http,
            &self.base_url,
            &authorization_value(BEARER, &access_token),
        )
        .await?;

        *state = SessionState {
            access_token: Some(access_token),
            csrf_token: Some(csrf_token),
        };
        Ok(())
    }
}

#[async_trait]
impl Auth for UsernamePasswordAuth {
    fn method(&self) -> AuthMethod {
        AuthMethod::UsernamePassword
    }

    async fn authenticate(&self) -> Result<(), AuthError> {
        let mut state = self.state.lock().await;
        self.establish(&mut state).await
    }

    async fn headers(&self) -> Result<AuthHeaders, AuthError> {
        let mut state = self.state.lock().await;
        if state.access_token.is_none() || state.csrf_token.is_none() {
            self.establish(&mut state).await?;
        }

        let mut headers = AuthHeaders::new();
        if let Some(access_token) = &state.access_token {
            headers.insert(
                AUTHORIZATION_HEADER.to_string(),
                authorization_value(BEARER, access_token),
            );
        }
        if let Some(csrf_token) = &state.csrf_token {
            headers.insert(CSRF_HEADER.to_string(), csrf_token.clone());
        }
        Ok(headers)
    }
}

/// A pre-issued JWT sent as a bearer token.
pub struct JwtAuth {
    token: String,
}

impl JwtAuth {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl Auth for JwtAuth {
    fn method(&self) -> AuthMethod {
        AuthMethod::Jwt
    }

    async fn authenticate(&self) -> Result<(), AuthError> {
        // Nothing to exchange; the API rejects a bad token on first use.
        Ok(())
    }

    async fn headers(&self) -> Result<AuthHeaders, AuthError> {
        let mut headers = AuthHeaders::new();
        headers.insert(
            AUTHORIZATION_HEADER.to_string(),
            authorization_value(BEARER, &self.token),
        );
        Ok(headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_username_password_login_flow() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/security/login"))
            .and(body_json(json!({
                "username": "admin",
                "password": "secret",
                "provider": "db",
                "refresh": true
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "access_token": "A" })),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/security/csrf_token/"))
            .and(header("Authorization", "Bearer A"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": "C" })))
            .expect(1)
            .mount(&server)
            .await;

        let auth = UsernamePasswordAuth::new(
            Url::parse(&server.uri()).unwrap(),
            "admin",
            "secret",
            reqwest::Client::new(),
        );
        auth.authenticate().await.unwrap();

        let headers = auth.headers().await.unwrap();
        assert_eq!(headers.get("Authorization").unwrap(), "Bearer A");
        assert_eq!(headers.get("X-CSRFToken").unwrap(), "C");
    }

    #[tokio::test]
    async fn test_username_password_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/security/login"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({ "message": "Not authorized" })),
            )
            .mount(&server)
            .await;

        let auth = UsernamePasswordAuth::new(
            Url::parse(&server.uri()).unwrap(),
            "admin",
            "wrong",
            reqwest::Client::new(),
        );
        let err = auth.authenticate().await.unwrap_err();
        assert!(matches!(err, AuthError::Authentication { .. }));
    }

    #[tokio::test]
    async fn test_jwt_headers() {
        let auth = JwtAuth::new("eyJhbGc");
        auth.authenticate().await.unwrap();
        let headers = auth.headers().await.unwrap();
        assert_eq!(headers.get("Authorization").unwrap(), "Bearer eyJhbGc");
        assert!(!headers.contains_key("X-CSRFToken"));
        assert_eq!(auth.method(), AuthMethod::Jwt);
    }
}
