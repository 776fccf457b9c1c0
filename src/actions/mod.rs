use thiserror::Error;

pub mod assets;
pub mod auth;
pub mod config;
pub mod resources;
pub mod sync;
pub mod utils;
pub mod workspaces;

#[derive(Debug, Error)]
pub enum CliActionError {
    #[error("{0}")]
    ApiError(#[from] crate::superset::ApiError),

    #[error("{0}")]
    AuthError(#[from] crate::auth::AuthError),

    #[error("{0}")]
    BundleError(#[from] crate::bundle::BundleError),

    #[error("{0}")]
    ConfigurationError(#[from] crate::configuration::ConfigurationError),

    #[error("{0}")]
    FormattingError(#[from] crate::format::FormattingError),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("{} already exists, use --force to overwrite", .0.display())]
    FolderExists(std::path::PathBuf),

    #[error("Missing required argument: {0}")]
    MissingRequiredArgument(String),

    #[error("{failed} of {total} sync target(s) failed")]
    SyncFailed { failed: usize, total: usize },
}
