//! CLI command definitions and dispatch.
//!
//! Each command group lives in its own module with a `*_command()` builder and
//! an `execute_*_command()` dispatcher; the work itself is done in `actions`.

use clap::{ArgMatches, Command};

use crate::error::CliError;

pub mod auth;
pub mod config;
pub mod dashboard;
pub mod params;
pub mod resource;
pub mod sync;
pub mod user;
pub mod workspace;

pub use params::{
    COMMAND_AUTH, COMMAND_CHART, COMMAND_CONFIG, COMMAND_DASHBOARD, COMMAND_DATABASE,
    COMMAND_DATASET, COMMAND_GROUP, COMMAND_SYNC, COMMAND_USER, COMMAND_WORKSPACE,
    PARAMETER_VERBOSE,
};

/// The complete command tree.
pub fn cli() -> Command {
    Command::new(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .propagate_version(true)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(params::verbose_parameter())
        .arg(params::workspace_parameter())
        .arg(params::format_parameter())
        .arg(params::format_pretty_parameter())
        .arg(params::format_with_headers_parameter())
        .subcommand(workspace::workspace_command())
        .subcommand(resource::database_command())
        .subcommand(resource::dataset_command())
        .subcommand(resource::chart_command())
        .subcommand(dashboard::dashboard_command())
        .subcommand(user::user_command())
        .subcommand(user::group_command())
        .subcommand(auth::auth_command())
        .subcommand(config::config_command())
        .subcommand(sync::sync_command())
}

/// Parse the process arguments.
pub fn create_cli_commands() -> ArgMatches {
    cli().get_matches()
}

pub(crate) fn unsupported(matches: &ArgMatches) -> CliError {
    CliError::UnsupportedSubcommand(
        matches
            .subcommand()
            .map(|(name, _)| name.to_string())
            .unwrap_or_else(|| "unknown".to_string()),
    )
}

/// Run the command selected by `matches`.
pub async fn execute_command(matches: &ArgMatches) -> Result<(), CliError> {
    match matches.subcommand() {
        Some((COMMAND_WORKSPACE, sub_matches)) => workspace::execute_workspace_command(sub_matches),
        Some((COMMAND_DATABASE, sub_matches)) => {
            resource::execute_database_command(sub_matches).await
        }
        Some((COMMAND_DATASET, sub_matches)) => resource::execute_dataset_command(sub_matches).await,
        Some((COMMAND_CHART, sub_matches)) => resource::execute_chart_command(sub_matches).await,
        Some((COMMAND_DASHBOARD, sub_matches)) => {
            dashboard::execute_dashboard_command(sub_matches).await
        }
        Some((COMMAND_USER, sub_matches)) => user::execute_user_command(sub_matches).await,
        Some((COMMAND_GROUP, sub_matches)) => user::execute_group_command(sub_matches).await,
        Some((COMMAND_AUTH, sub_matches)) => auth::execute_auth_command(sub_matches).await,
        Some((COMMAND_CONFIG, sub_matches)) => config::execute_config_command(sub_matches),
        Some((COMMAND_SYNC, sub_matches)) => sync::execute_sync_command(sub_matches).await,
        _ => Err(unsupported(matches)),
    }
}
