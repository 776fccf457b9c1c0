//! User and group command definitions.
//!
//! Groups are Superset roles.

use crate::actions::resources::{get_resource, list_resources};
use crate::commands::params::{
    id_parameter, COMMAND_GROUP, COMMAND_INFO, COMMAND_LIST, COMMAND_USER,
};
use crate::commands::resource::list_subcommand;
use crate::error::CliError;
use crate::model::{Role, User};
use crate::superset::ResourceKind;
use clap::{ArgMatches, Command};

pub fn user_command() -> Command {
    Command::new(COMMAND_USER)
        .about("Work with users")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(list_subcommand("List users"))
        .subcommand(
            Command::new(COMMAND_INFO)
                .about("Show a single user")
                .arg(id_parameter("User id")),
        )
}

pub fn group_command() -> Command {
    Command::new(COMMAND_GROUP)
        .about("Work with groups (Superset roles)")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(list_subcommand("List roles"))
}

pub async fn execute_user_command(matches: &ArgMatches) -> Result<(), CliError> {
    match matches.subcommand() {
        Some((COMMAND_LIST, sub_matches)) => {
            Ok(list_resources::<User>(sub_matches, ResourceKind::User).await?)
        }
        Some((COMMAND_INFO, sub_matches)) => {
            Ok(get_resource::<User>(sub_matches, ResourceKind::User).await?)
        }
        _ => Err(super::unsupported(matches)),
    }
}

pub async fn execute_group_command(matches: &ArgMatches) -> Result<(), CliError> {
    match matches.subcommand() {
        Some((COMMAND_LIST, sub_matches)) => {
            Ok(list_resources::<Role>(sub_matches, ResourceKind::Role).await?)
        }
        _ => Err(super::unsupported(matches)),
    }
}
