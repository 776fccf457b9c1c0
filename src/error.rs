use thiserror::Error;

use crate::{
    actions::CliActionError,
    auth::AuthError,
    bundle::BundleError,
    configuration::ConfigurationError,
    exit_codes::SupExitCode,
    superset::ApiError,
};

/// Error types that can occur during CLI command execution
#[derive(Debug, Error)]
pub enum CliError {
    /// Error when an unsupported or undefined subcommand is encountered
    #[error("Undefined or unsupported subcommand: {0}")]
    UnsupportedSubcommand(String),
    /// Error related to configuration loading or management
    #[error("Configuration error: {0}")]
    ConfigurationError(#[from] ConfigurationError),
    /// Error related to data formatting
    #[error("Formatting error: {0}")]
    FormattingError(#[from] crate::format::FormattingError),
    /// Credentials could not be validated or obtained
    #[error("Authentication error: {0}")]
    AuthError(#[from] AuthError),
    #[error("API error: {0}")]
    SupersetApiError(#[from] ApiError),
    /// Error when a required command-line argument is missing
    #[error("Missing required argument: {0}")]
    MissingRequiredArgument(String),
    #[error("{0}")]
    ActionError(#[from] CliActionError),
}

fn auth_exit_code(e: &AuthError) -> SupExitCode {
    match e {
        AuthError::Configuration(_) | AuthError::InvalidUrl(_) => SupExitCode::ConfigError,
        AuthError::Transport(_) => SupExitCode::NetworkError,
        AuthError::Authentication { .. } | AuthError::MalformedResponse { .. } => {
            SupExitCode::AuthError
        }
    }
}

fn api_exit_code(e: &ApiError) -> SupExitCode {
    match e {
        ApiError::Auth(e) => auth_exit_code(e),
        ApiError::HttpError(_) => SupExitCode::NetworkError,
        ApiError::JsonError(_) => SupExitCode::DataError,
        ApiError::InvalidUrl(_) => SupExitCode::ConfigError,
        ApiError::NotFound { .. } => SupExitCode::NotFound,
        ApiError::UnexpectedStatus { status, .. } if status.as_u16() == 401 => {
            SupExitCode::AuthError
        }
        ApiError::UnexpectedStatus { .. } => SupExitCode::ApiError,
    }
}

impl CliError {
    /// Get the appropriate exit code for this error
    pub fn exit_code(&self) -> SupExitCode {
        match self {
            CliError::UnsupportedSubcommand(_) => SupExitCode::UsageError,
            CliError::MissingRequiredArgument(_) => SupExitCode::UsageError,
            CliError::ConfigurationError(ConfigurationError::WorkspaceNotFound { .. }) => {
                SupExitCode::NotFound
            }
            CliError::ConfigurationError(_) => SupExitCode::ConfigError,
            CliError::FormattingError(_) => SupExitCode::DataError,
            CliError::AuthError(e) => auth_exit_code(e),
            CliError::SupersetApiError(e) => api_exit_code(e),
            CliError::ActionError(e) => match e {
                CliActionError::ApiError(e) => api_exit_code(e),
                CliActionError::AuthError(e) => auth_exit_code(e),
                CliActionError::ConfigurationError(ConfigurationError::WorkspaceNotFound {
                    ..
                }) => SupExitCode::NotFound,
                CliActionError::ConfigurationError(_) => SupExitCode::ConfigError,
                CliActionError::FormattingError(_) | CliActionError::YamlError(_) => {
                    SupExitCode::DataError
                }
                CliActionError::BundleError(BundleError::Io(_)) => SupExitCode::CantCreate,
                CliActionError::BundleError(_) => SupExitCode::DataError,
                CliActionError::IoError(_) | CliActionError::FolderExists(_) => {
                    SupExitCode::CantCreate
                }
                CliActionError::MissingRequiredArgument(_) => SupExitCode::UsageError,
                CliActionError::SyncFailed { .. } => SupExitCode::ApiError,
            },
        }
    }
}
