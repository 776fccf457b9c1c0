//! Sync command definitions.

use crate::actions::sync::{create_sync, run_sync, validate_sync};
use crate::commands::params::{
    COMMAND_CREATE, COMMAND_RUN, COMMAND_SYNC, COMMAND_VALIDATE, PARAMETER_CONTINUE_ON_ERROR,
    PARAMETER_DASHBOARDS, PARAMETER_DRY_RUN, PARAMETER_FOLDER, PARAMETER_FORCE,
    PARAMETER_PULL_ONLY, PARAMETER_PUSH_ONLY, PARAMETER_SOURCE, PARAMETER_TARGET,
    PARAMETER_TARGETS,
};
use crate::error::CliError;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;

fn folder_parameter() -> Arg {
    Arg::new(PARAMETER_FOLDER)
        .required(true)
        .num_args(1)
        .help("Sync folder containing sync_config.yml")
        .value_parser(clap::value_parser!(PathBuf))
}

fn flag(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).action(ArgAction::SetTrue).help(help)
}

pub fn sync_command() -> Command {
    Command::new(COMMAND_SYNC)
        .about("Copy dashboards from a source workspace to target workspaces")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new(COMMAND_RUN)
                .about("Pull from the source and push to the targets")
                .arg(folder_parameter())
                .arg(
                    flag(PARAMETER_PULL_ONLY, "Only pull from the source")
                        .conflicts_with(PARAMETER_PUSH_ONLY),
                )
                .arg(flag(PARAMETER_PUSH_ONLY, "Only push the existing bundle"))
                .arg(
                    Arg::new(PARAMETER_TARGET)
                        .long(PARAMETER_TARGET)
                        .num_args(1)
                        .help("Push to this target only (target name or workspace)"),
                )
                .arg(flag(PARAMETER_DRY_RUN, "Show what would be done without doing it"))
                .arg(flag(
                    PARAMETER_CONTINUE_ON_ERROR,
                    "Keep pushing to the remaining targets after a failure",
                )),
        )
        .subcommand(
            Command::new(COMMAND_CREATE)
                .about("Create a sync folder with an example sync_config.yml")
                .arg(folder_parameter())
                .arg(
                    Arg::new(PARAMETER_SOURCE)
                        .long(PARAMETER_SOURCE)
                        .num_args(1)
                        .required(true)
                        .help("Workspace the dashboards are pulled from"),
                )
                .arg(
                    Arg::new(PARAMETER_TARGETS)
                        .long(PARAMETER_TARGETS)
                        .num_args(1)
                        .value_delimiter(',')
                        .required(true)
                        .help("Workspaces to push to (comma-separated)"),
                )
                .arg(
                    Arg::new(PARAMETER_DASHBOARDS)
                        .long(PARAMETER_DASHBOARDS)
                        .num_args(1)
                        .value_delimiter(',')
                        .required(true)
                        .help("Dashboard ids to sync (comma-separated)")
                        .value_parser(clap::value_parser!(i64)),
                )
                .arg(flag(PARAMETER_FORCE, "Replace an existing sync_config.yml")),
        )
        .subcommand(
            Command::new(COMMAND_VALIDATE)
                .about("Check sync_config.yml against the configured workspaces")
                .arg(folder_parameter()),
        )
}

pub async fn execute_sync_command(matches: &ArgMatches) -> Result<(), CliError> {
    match matches.subcommand() {
        Some((COMMAND_RUN, sub_matches)) => Ok(run_sync(sub_matches).await?),
        Some((COMMAND_CREATE, sub_matches)) => Ok(create_sync(sub_matches)?),
        Some((COMMAND_VALIDATE, sub_matches)) => Ok(validate_sync(sub_matches)?),
        _ => Err(super::unsupported(matches)),
    }
}
