//! Workspace management: the named Superset instances kept in the
//! configuration file.

use crate::{
    actions::{
        utils::{output_format, print_formatted, report_success},
        CliActionError,
    },
    commands::params::{
        PARAMETER_AUTH_METHOD, PARAMETER_JWT_TOKEN, PARAMETER_NAME, PARAMETER_OAUTH_CLIENT_ID,
        PARAMETER_OAUTH_CLIENT_SECRET, PARAMETER_OAUTH_PASSWORD, PARAMETER_OAUTH_SCOPE,
        PARAMETER_OAUTH_TOKEN_TYPE, PARAMETER_OAUTH_TOKEN_URL, PARAMETER_OAUTH_USERNAME,
        PARAMETER_PASSWORD, PARAMETER_URL, PARAMETER_USERNAME, PARAMETER_WORKSPACE,
    },
    configuration::{Configuration, SupersetInstanceConfig},
    format::CsvRecordProducer,
};
use clap::ArgMatches;
use serde::Serialize;
use tracing::trace;

/// One row of `sup workspace list`. Secrets are never part of it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkspaceEntry {
    pub name: String,
    pub url: String,
    pub auth_method: String,
    pub current: bool,
}

impl WorkspaceEntry {
    fn new(name: &str, instance: &SupersetInstanceConfig, current: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            url: instance.url.clone(),
            auth_method: instance.auth_method.clone(),
            current: current == Some(name),
        }
    }
}

impl CsvRecordProducer for WorkspaceEntry {
    fn csv_header() -> Vec<&'static str> {
        vec!["NAME", "URL", "AUTH_METHOD", "CURRENT"]
    }

    fn as_csv_record(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.url.clone(),
            self.auth_method.clone(),
            self.current.to_string(),
        ]
    }
}

pub fn workspace_entries(configuration: &Configuration) -> Vec<WorkspaceEntry> {
    configuration
        .workspaces()
        .iter()
        .map(|(name, instance)| {
            WorkspaceEntry::new(name, instance, configuration.current_workspace())
        })
        .collect()
}

pub fn list_workspaces(sub_matches: &ArgMatches) -> Result<(), CliActionError> {
    trace!("Executing \"workspace list\"...");
    let configuration = Configuration::load_or_create_default()?;
    let format = output_format(sub_matches, &configuration)?;
    print_formatted(&workspace_entries(&configuration), &format)
}

pub fn show_workspace(sub_matches: &ArgMatches) -> Result<(), CliActionError> {
    trace!("Executing \"workspace show\"...");
    let configuration = Configuration::load_or_create_default()?;
    let format = output_format(sub_matches, &configuration)?;

    let requested = sub_matches
        .get_one::<String>(PARAMETER_WORKSPACE)
        .map(String::as_str);
    let name = configuration.resolve_workspace_name(requested)?;
    let instance = configuration.workspace(&name)?;
    let entry = WorkspaceEntry::new(&name, instance, configuration.current_workspace());
    print_formatted(&vec![entry], &format)
}

pub fn use_workspace(sub_matches: &ArgMatches) -> Result<(), CliActionError> {
    let name = required_string(sub_matches, PARAMETER_NAME)?;
    let mut configuration = Configuration::load_or_create_default()?;
    configuration.set_current_workspace(&name)?;
    configuration.save_to_default()?;
    report_success(&format!("Switched to workspace '{}'", name));
    Ok(())
}

/// Build a workspace definition from `workspace add` arguments.
pub fn instance_from_args(sub_matches: &ArgMatches) -> Result<SupersetInstanceConfig, CliActionError> {
    let optional = |name: &str| sub_matches.get_one::<String>(name).cloned();

    Ok(SupersetInstanceConfig {
        url: required_string(sub_matches, PARAMETER_URL)?,
        auth_method: required_string(sub_matches, PARAMETER_AUTH_METHOD)?,
        username: optional(PARAMETER_USERNAME),
        password: optional(PARAMETER_PASSWORD),
        jwt_token: optional(PARAMETER_JWT_TOKEN),
        oauth_token_url: optional(PARAMETER_OAUTH_TOKEN_URL),
        oauth_client_id: optional(PARAMETER_OAUTH_CLIENT_ID),
        oauth_client_secret: optional(PARAMETER_OAUTH_CLIENT_SECRET),
        oauth_username: optional(PARAMETER_OAUTH_USERNAME),
        oauth_password: optional(PARAMETER_OAUTH_PASSWORD),
        oauth_scope: optional(PARAMETER_OAUTH_SCOPE),
        oauth_token_type: optional(PARAMETER_OAUTH_TOKEN_TYPE),
        database_id: None,
    })
}

pub fn add_workspace(sub_matches: &ArgMatches) -> Result<(), CliActionError> {
    let name = required_string(sub_matches, PARAMETER_NAME)?;
    let instance = instance_from_args(sub_matches)?;

    let mut configuration = Configuration::load_or_create_default()?;
    configuration.add_workspace(&name, instance)?;
    configuration.save_to_default()?;
    report_success(&format!("Workspace '{}' saved", name));
    Ok(())
}

pub fn remove_workspace(sub_matches: &ArgMatches) -> Result<(), CliActionError> {
    let name = required_string(sub_matches, PARAMETER_NAME)?;
    let mut configuration = Configuration::load_or_create_default()?;
    configuration.remove_workspace(&name)?;
    configuration.save_to_default()?;
    report_success(&format!("Workspace '{}' removed", name));
    Ok(())
}

fn required_string(sub_matches: &ArgMatches, name: &str) -> Result<String, CliActionError> {
    sub_matches
        .get_one::<String>(name)
        .cloned()
        .ok_or_else(|| CliActionError::MissingRequiredArgument(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::cli;
    use crate::format::{Formattable, OutputFormat};

    #[test]
    fn test_instance_from_args() {
        let matches = cli()
            .try_get_matches_from([
                "sup",
                "workspace",
                "add",
                "prod",
                "--url",
                "https://superset.example.com",
                "--auth-method",
                "oauth",
                "--oauth-token-url",
                "https://auth.example.com/token",
                "--oauth-client-secret",
                "${ENV:SUPERSET_OAUTH_SECRET}",
            ])
            .unwrap();
        let (_, workspace) = matches.subcommand().unwrap();
        let (_, add) = workspace.subcommand().unwrap();

        let instance = instance_from_args(add).unwrap();
        assert_eq!(instance.auth_method, "oauth");
        assert_eq!(
            instance.oauth_client_secret.as_deref(),
            Some("${ENV:SUPERSET_OAUTH_SECRET}")
        );
        assert_eq!(instance.username, None);
    }

    #[test]
    fn test_workspace_entries_mark_current() {
        let mut configuration = Configuration::default();
        for (name, url) in [("dev", "http://localhost:8088"), ("prod", "https://bi.example.com")] {
            configuration
                .add_workspace(
                    name,
                    SupersetInstanceConfig {
                        url: url.to_string(),
                        password: Some("hidden".to_string()),
                        ..SupersetInstanceConfig::default()
                    },
                )
                .unwrap();
        }

        let entries = workspace_entries(&configuration);
        assert_eq!(entries.len(), 2);
        assert!(entries[0].current);
        assert!(!entries[1].current);

        let csv = entries.format(&OutputFormat::Csv(Default::default())).unwrap();
        assert_eq!(
            csv,
            "dev,http://localhost:8088,username_password,true\n\
             prod,https://bi.example.com,username_password,false\n"
        );
    }
}
