//! Workspace command definitions.

use crate::actions::workspaces::{
    add_workspace, list_workspaces, remove_workspace, show_workspace, use_workspace,
};
use crate::commands::params::{
    auth_method_parameter, name_parameter, text_parameter, COMMAND_ADD, COMMAND_LIST,
    COMMAND_REMOVE, COMMAND_SHOW, COMMAND_USE, COMMAND_WORKSPACE, PARAMETER_JWT_TOKEN,
    PARAMETER_OAUTH_CLIENT_ID, PARAMETER_OAUTH_CLIENT_SECRET, PARAMETER_OAUTH_PASSWORD,
    PARAMETER_OAUTH_SCOPE, PARAMETER_OAUTH_TOKEN_TYPE, PARAMETER_OAUTH_TOKEN_URL,
    PARAMETER_OAUTH_USERNAME, PARAMETER_PASSWORD, PARAMETER_URL, PARAMETER_USERNAME,
};
use crate::error::CliError;
use clap::{ArgMatches, Command};

pub fn workspace_command() -> Command {
    Command::new(COMMAND_WORKSPACE)
        .about("Manage Superset workspaces")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new(COMMAND_LIST)
                .about("List configured workspaces")
                .alias("ls"),
        )
        .subcommand(
            Command::new(COMMAND_USE)
                .about("Make a workspace the current one")
                .arg(name_parameter("Workspace name")),
        )
        .subcommand(Command::new(COMMAND_SHOW).about("Show the selected workspace"))
        .subcommand(
            Command::new(COMMAND_ADD)
                .about("Add or replace a workspace")
                .after_help(
                    "Secrets may be given as ${ENV:NAME} to read them from the environment \
                     at run time.",
                )
                .arg(name_parameter("Workspace name"))
                .arg(text_parameter(PARAMETER_URL, "Superset base URL").required(true))
                .arg(auth_method_parameter())
                .arg(text_parameter(PARAMETER_USERNAME, "Username (username_password)"))
                .arg(text_parameter(PARAMETER_PASSWORD, "Password (username_password)"))
                .arg(text_parameter(PARAMETER_JWT_TOKEN, "Bearer token (jwt)"))
                .arg(text_parameter(
                    PARAMETER_OAUTH_TOKEN_URL,
                    "Identity provider token endpoint (oauth)",
                ))
                .arg(text_parameter(PARAMETER_OAUTH_CLIENT_ID, "Client id (oauth)"))
                .arg(text_parameter(
                    PARAMETER_OAUTH_CLIENT_SECRET,
                    "Client secret (oauth)",
                ))
                .arg(text_parameter(
                    PARAMETER_OAUTH_USERNAME,
                    "Service account username (oauth)",
                ))
                .arg(text_parameter(
                    PARAMETER_OAUTH_PASSWORD,
                    "Service account password (oauth)",
                ))
                .arg(text_parameter(
                    PARAMETER_OAUTH_SCOPE,
                    "Requested scope (oauth, default \"openid profile email roles\")",
                ))
                .arg(text_parameter(
                    PARAMETER_OAUTH_TOKEN_TYPE,
                    "Authorization scheme (oauth, default \"Bearer\")",
                )),
        )
        .subcommand(
            Command::new(COMMAND_REMOVE)
                .about("Remove a workspace")
                .alias("rm")
                .arg(name_parameter("Workspace name")),
        )
}

pub fn execute_workspace_command(matches: &ArgMatches) -> Result<(), CliError> {
    match matches.subcommand() {
        Some((COMMAND_LIST, sub_matches)) => Ok(list_workspaces(sub_matches)?),
        Some((COMMAND_USE, sub_matches)) => Ok(use_workspace(sub_matches)?),
        Some((COMMAND_SHOW, sub_matches)) => Ok(show_workspace(sub_matches)?),
        Some((COMMAND_ADD, sub_matches)) => Ok(add_workspace(sub_matches)?),
        Some((COMMAND_REMOVE, sub_matches)) => Ok(remove_workspace(sub_matches)?),
        _ => Err(super::unsupported(matches)),
    }
}
