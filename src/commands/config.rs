//! Configuration command definitions.

use crate::actions::config::{
    print_configuration_path, set_configuration_value, show_configuration,
};
use crate::commands::params::{
    COMMAND_CONFIG, COMMAND_PATH, COMMAND_SET, COMMAND_SHOW, CONFIG_KEY_OUTPUT_FORMAT,
    CONFIG_KEY_TIMEOUT, PARAMETER_KEY, PARAMETER_VALUE,
};
use crate::error::CliError;
use clap::{Arg, ArgMatches, Command};

pub fn config_command() -> Command {
    Command::new(COMMAND_CONFIG)
        .about("Configuration management")
        .subcommand_required(true)
        .subcommand(Command::new(COMMAND_PATH).about("Show the configuration file path"))
        .subcommand(Command::new(COMMAND_SHOW).about("Show the current settings"))
        .subcommand(
            Command::new(COMMAND_SET)
                .about("Change a setting")
                .arg(
                    Arg::new(PARAMETER_KEY)
                        .required(true)
                        .help("Setting to change")
                        .value_parser([CONFIG_KEY_OUTPUT_FORMAT, CONFIG_KEY_TIMEOUT]),
                )
                .arg(
                    Arg::new(PARAMETER_VALUE)
                        .required(true)
                        .help("New value"),
                ),
        )
}

pub fn execute_config_command(matches: &ArgMatches) -> Result<(), CliError> {
    match matches.subcommand() {
        Some((COMMAND_PATH, _)) => Ok(print_configuration_path()?),
        Some((COMMAND_SHOW, sub_matches)) => Ok(show_configuration(sub_matches)?),
        Some((COMMAND_SET, sub_matches)) => Ok(set_configuration_value(sub_matches)?),
        _ => Err(super::unsupported(matches)),
    }
}
