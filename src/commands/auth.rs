//! Authentication command definitions.

use crate::commands::params::{COMMAND_AUTH, COMMAND_TEST};
use crate::error::CliError;
use clap::{ArgMatches, Command};

pub fn auth_command() -> Command {
    Command::new(COMMAND_AUTH)
        .about("Authentication operations")
        .subcommand_required(true)
        .subcommand(
            Command::new(COMMAND_TEST)
                .about("Authenticate against the workspace and show the resulting identity"),
        )
}

pub async fn execute_auth_command(matches: &ArgMatches) -> Result<(), CliError> {
    match matches.subcommand() {
        Some((COMMAND_TEST, sub_matches)) => {
            crate::actions::auth::test_authentication(sub_matches).await?;
            Ok(())
        }
        _ => Err(super::unsupported(matches)),
    }
}
