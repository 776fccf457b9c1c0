//! Selection of the authentication handler for a workspace.

use crate::auth::oauth::{OAuthCredentials, OAuthSupersetAuth};
use crate::auth::superset::{JwtAuth, UsernamePasswordAuth};
use crate::auth::{Auth, AuthError, AuthMethod};
use crate::configuration::{resolve_value, SupersetInstanceConfig};
use std::str::FromStr;
use url::Url;

/// Build the handler named by `config.auth_method`.
///
/// Validation happens here, before any network traffic: every required field
/// that is missing (or whose `${ENV:...}` reference does not resolve) is
/// reported in one error.
pub fn create_superset_auth(
    config: &SupersetInstanceConfig,
    http: reqwest::Client,
) -> Result<Box<dyn Auth>, AuthError> {
    let method = AuthMethod::from_str(&config.auth_method).map_err(|_| {
        AuthError::Configuration(format!(
            "Unknown authentication method: '{}'. Must be one of: {}",
            config.auth_method,
            AuthMethod::names().join(", ")
        ))
    })?;
    let base_url = parse_url("url", &config.url)?;

    match method {
        AuthMethod::UsernamePassword => {
            let username = resolve_value(config.username.as_deref());
            let password = resolve_value(config.password.as_deref());
            match (username, password) {
                (Some(username), Some(password)) => Ok(Box::new(UsernamePasswordAuth::new(
                    base_url, username, password, http,
                ))),
                _ => Err(AuthError::Configuration(
                    "Username/password authentication requires both 'username' and 'password' \
                     fields in configuration"
                        .to_string(),
                )),
            }
        }
        AuthMethod::Jwt => match resolve_value(config.jwt_token.as_deref()) {
            Some(token) => Ok(Box::new(JwtAuth::new(token))),
            None => Err(AuthError::Configuration(
                "JWT authentication requires 'jwt_token' field in configuration".to_string(),
            )),
        },
        AuthMethod::Oauth => {
            let credentials = oauth_credentials(config, base_url)?;
            Ok(Box::new(OAuthSupersetAuth::new(credentials, http)))
        }
    }
}

fn oauth_credentials(
    config: &SupersetInstanceConfig,
    base_url: Url,
) -> Result<OAuthCredentials, AuthError> {
    let required = [
        ("token_url", resolve_value(config.oauth_token_url.as_deref())),
        ("client_id", resolve_value(config.oauth_client_id.as_deref())),
        (
            "client_secret",
            resolve_value(config.oauth_client_secret.as_deref()),
        ),
        ("username", resolve_value(config.oauth_username.as_deref())),
        ("password", resolve_value(config.oauth_password.as_deref())),
    ];

    let missing: Vec<&str> = required
        .iter()
        .filter(|(_, value)| value.is_none())
        .map(|(name, _)| *name)
        .collect();
    if !missing.is_empty() {
        return Err(AuthError::Configuration(format!(
            "OAuth2 authentication requires all of: token_url, client_id, client_secret, \
             username, password. Missing: {}. Use environment variables for secrets: \
             oauth_client_secret: '${{ENV:SUPERSET_OAUTH_SECRET}}', \
             oauth_password: '${{ENV:SERVICE_PASSWORD}}'",
            missing.join(", ")
        )));
    }

    let [token_url, client_id, client_secret, username, password] =
        required.map(|(_, value)| value.unwrap_or_default());
    let token_url = parse_url("oauth_token_url", &token_url)?;

    let mut credentials = OAuthCredentials::new(
        base_url,
        token_url,
        client_id,
        client_secret,
        username,
        password,
    );
    if let Some(scope) = resolve_value(config.oauth_scope.as_deref()) {
        credentials = credentials.with_scope(scope);
    }
    if let Some(token_type) = resolve_value(config.oauth_token_type.as_deref()) {
        credentials = credentials.with_token_type(token_type);
    }
    Ok(credentials)
}

fn parse_url(field: &str, value: &str) -> Result<Url, AuthError> {
    Url::parse(value.trim()).map_err(|e| {
        AuthError::Configuration(format!("Invalid '{}' value {:?}: {}", field, value, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oauth_config() -> SupersetInstanceConfig {
        SupersetInstanceConfig {
            url: "https://superset.example.com".to_string(),
            auth_method: "oauth".to_string(),
            oauth_token_url: Some("https://auth.example.com/token".to_string()),
            oauth_client_id: Some("client-123".to_string()),
            oauth_client_secret: Some("secret-456".to_string()),
            oauth_username: Some("service@example.com".to_string()),
            oauth_password: Some("password".to_string()),
            ..SupersetInstanceConfig::default()
        }
    }

    fn error_message(config: &SupersetInstanceConfig) -> String {
        match create_superset_auth(config, reqwest::Client::new()) {
            Ok(_) => panic!("expected a configuration error"),
            Err(AuthError::Configuration(message)) => message,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_factory_creates_each_method() {
        let auth = create_superset_auth(&oauth_config(), reqwest::Client::new()).unwrap();
        assert_eq!(auth.method(), AuthMethod::Oauth);

        let jwt = SupersetInstanceConfig {
            url: "https://superset.example.com".to_string(),
            auth_method: "jwt".to_string(),
            jwt_token: Some("eyJhbGc".to_string()),
            ..SupersetInstanceConfig::default()
        };
        let auth = create_superset_auth(&jwt, reqwest::Client::new()).unwrap();
        assert_eq!(auth.method(), AuthMethod::Jwt);

        let basic = SupersetInstanceConfig {
            url: "https://superset.example.com".to_string(),
            auth_method: "username_password".to_string(),
            username: Some("admin".to_string()),
            password: Some("secret".to_string()),
            ..SupersetInstanceConfig::default()
        };
        let auth = create_superset_auth(&basic, reqwest::Client::new()).unwrap();
        assert_eq!(auth.method(), AuthMethod::UsernamePassword);
    }

    #[test]
    fn test_oauth_lists_every_missing_field() {
        let config = SupersetInstanceConfig {
            oauth_client_secret: None,
            oauth_password: None,
            ..oauth_config()
        };
        let message = error_message(&config);
        assert!(message.contains("Missing: client_secret, password."));
        assert!(!message.contains("Missing: client_secret, password, "));
    }

    #[test]
    fn test_oauth_unresolved_env_reference_is_missing() {
        let config = SupersetInstanceConfig {
            oauth_client_secret: Some("${ENV:SUP_TEST_FACTORY_UNSET_SECRET}".to_string()),
            ..oauth_config()
        };
        assert!(error_message(&config).contains("Missing: client_secret."));
    }

    #[test]
    fn test_oauth_custom_scope_and_token_type() {
        let config = SupersetInstanceConfig {
            oauth_scope: Some("custom scope".to_string()),
            oauth_token_type: Some("JWT".to_string()),
            ..oauth_config()
        };
        let credentials =
            oauth_credentials(&config, Url::parse(&config.url).unwrap()).unwrap();
        assert_eq!(credentials.scope(), "custom scope");
        assert_eq!(credentials.token_type(), "JWT");
        assert_eq!(credentials.client_id(), "client-123");
        assert_eq!(credentials.username(), "service@example.com");
    }

    #[test]
    fn test_username_password_validation() {
        let config = SupersetInstanceConfig {
            url: "https://superset.example.com".to_string(),
            auth_method: "username_password".to_string(),
            username: Some("admin".to_string()),
            ..SupersetInstanceConfig::default()
        };
        assert!(error_message(&config).contains("requires both 'username' and 'password'"));
    }

    #[test]
    fn test_jwt_validation() {
        let config = SupersetInstanceConfig {
            url: "https://superset.example.com".to_string(),
            auth_method: "jwt".to_string(),
            ..SupersetInstanceConfig::default()
        };
        assert!(error_message(&config).contains("requires 'jwt_token'"));
    }

    #[test]
    fn test_unknown_method_and_bad_url() {
        let config = SupersetInstanceConfig {
            auth_method: "kerberos".to_string(),
            ..oauth_config()
        };
        let message = error_message(&config);
        assert!(message.contains("Unknown authentication method: 'kerberos'"));
        assert!(message.contains("username_password, jwt, oauth"));

        let config = SupersetInstanceConfig {
            oauth_token_url: Some("not a url".to_string()),
            ..oauth_config()
        };
        assert!(error_message(&config).contains("oauth_token_url"));
    }
}
