//! Execution context for commands that talk to a Superset workspace.
//!
//! Loading the configuration, selecting the workspace, building the HTTP client
//! and authenticating happen here, once, before the command runs.

use crate::{
    actions::CliActionError,
    auth::create_superset_auth,
    commands::params::PARAMETER_WORKSPACE,
    configuration::Configuration,
    http_utils::HttpRequestConfig,
    superset::{ApiError, SupersetClient},
};
use clap::ArgMatches;
use tracing::debug;
use url::Url;

/// Execution context containing common resources needed by CLI commands.
pub struct ExecutionContext {
    pub configuration: Configuration,
    pub workspace: String,
    pub client: SupersetClient,
}

impl ExecutionContext {
    /// Load configuration, resolve the workspace (`--workspace` or the current
    /// one) and return an authenticated client for it.
    pub async fn from_args(sub_matches: &ArgMatches) -> Result<Self, CliActionError> {
        let configuration = Configuration::load_or_create_default()?;
        let requested = sub_matches
            .get_one::<String>(PARAMETER_WORKSPACE)
            .map(String::as_str);
        let workspace = configuration.resolve_workspace_name(requested)?;
        let client = connect_workspace(&configuration, &workspace).await?;

        Ok(ExecutionContext {
            configuration,
            workspace,
            client,
        })
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn workspace(&self) -> &str {
        &self.workspace
    }

    pub fn client(&self) -> &SupersetClient {
        &self.client
    }
}

/// Authenticated client for a named workspace.
pub async fn connect_workspace(
    configuration: &Configuration,
    name: &str,
) -> Result<SupersetClient, CliActionError> {
    let instance = configuration.workspace(name)?;
    let http = HttpRequestConfig::from_configuration(configuration)
        .build_client()
        .map_err(ApiError::from)?;
    let auth = create_superset_auth(instance, http.clone())?;
    let base_url = Url::parse(instance.url.trim()).map_err(ApiError::from)?;

    debug!("Connecting to workspace {} at {}", name, base_url);
    Ok(SupersetClient::connect(base_url, http, auth).await?)
}
