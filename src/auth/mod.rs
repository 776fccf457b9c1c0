//! Authentication handlers for Superset workspaces.
//!
//! Three methods are supported, selected per workspace by `auth_method`:
//!
//! - `username_password`: Superset database login (`/api/v1/security/login`)
//! - `jwt`: a pre-issued bearer token
//! - `oauth`: OAuth2 resource owner password grant against an external
//!   identity provider
//!
//! Every handler implements [`Auth`]. Handlers are built without touching the
//! network (see [`factory::create_superset_auth`]); the caller must run
//! [`Auth::authenticate`] before the first request.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};
use thiserror::Error;

pub mod csrf;
pub mod factory;
pub mod oauth;
pub mod superset;

pub use factory::create_superset_auth;
pub use oauth::{is_expired, OAuthCredentials, OAuthSupersetAuth, TokenState};
pub use superset::{JwtAuth, UsernamePasswordAuth};

pub const AUTHORIZATION_HEADER: &str = "Authorization";
pub const CSRF_HEADER: &str = "X-CSRFToken";

/// Headers to merge into an outgoing Superset request.
pub type AuthHeaders = HashMap<String, String>;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Required settings for the selected method are missing or invalid.
    #[error("{0}")]
    Configuration(String),
    /// The token, login or CSRF endpoint answered with a non-success status.
    #[error("authentication request to {url} failed with HTTP {status}: {body}")]
    Authentication {
        url: String,
        status: StatusCode,
        body: String,
    },
    /// A success response did not carry the expected field.
    #[error("malformed response from {url}: missing '{field}'")]
    MalformedResponse { url: String, field: &'static str },
    /// No response at all (connection refused, timeout, TLS failure).
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// The `auth_method` discriminator of a workspace configuration.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AuthMethod {
    UsernamePassword,
    Jwt,
    Oauth,
}

impl AuthMethod {
    pub fn names() -> Vec<&'static str> {
        AuthMethod::iter().map(<&'static str>::from).collect()
    }
}

/// Source of the current instant, injected so expiry decisions stay testable.
pub trait Clock: Send + Sync + std::fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Common surface of all authentication handlers.
#[async_trait]
pub trait Auth: Send + Sync {
    fn method(&self) -> AuthMethod;

    /// Obtain fresh credentials, discarding anything cached.
    ///
    /// Called once before the first request and again by the client when the
    /// server answers 401.
    async fn authenticate(&self) -> Result<(), AuthError>;

    /// Headers that authorize a request, refreshing stale values first.
    async fn headers(&self) -> Result<AuthHeaders, AuthError>;
}

pub(crate) fn authorization_value(token_type: &str, token: &str) -> String {
    format!("{} {}", token_type, token)
}
