//! Database, dataset and chart command definitions.
//!
//! The three groups share the same shape: a paged `list` and a `get <ID>`.
//! Databases can also be made the workspace default, charts can be exported.

use crate::actions::{
    assets::export_assets,
    resources::{get_resource, list_resources, use_database},
};
use crate::commands::params::{
    id_parameter, ids_parameter, limit_parameter, output_file_parameter, page_parameter,
    COMMAND_CHART, COMMAND_DATABASE, COMMAND_DATASET, COMMAND_EXPORT, COMMAND_GET, COMMAND_LIST,
    COMMAND_USE,
};
use crate::error::CliError;
use crate::model::{Chart, Database, Dataset};
use crate::superset::ResourceKind;
use clap::{ArgMatches, Command};

/// `list` subcommand with paging flags.
pub fn list_subcommand(about: &'static str) -> Command {
    Command::new(COMMAND_LIST)
        .about(about)
        .alias("ls")
        .arg(page_parameter())
        .arg(limit_parameter())
}

/// `export <IDS>... --output <FILE>` subcommand.
pub fn export_subcommand(about: &'static str, ids: &'static str) -> Command {
    Command::new(COMMAND_EXPORT)
        .about(about)
        .arg(ids_parameter(ids))
        .arg(output_file_parameter())
}

fn resource_command(name: &'static str, about: &'static str, plural: &'static str) -> Command {
    Command::new(name)
        .about(about)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(list_subcommand(plural))
}

pub fn database_command() -> Command {
    resource_command(COMMAND_DATABASE, "Work with databases", "List databases")
        .subcommand(
            Command::new(COMMAND_GET)
                .about("Show a single database, the workspace default without an id")
                .arg(id_parameter("Numeric id").required(false)),
        )
        .subcommand(
            Command::new(COMMAND_USE)
                .about("Make a database the default of the selected workspace")
                .arg(id_parameter("Numeric id")),
        )
}

pub fn dataset_command() -> Command {
    resource_command(COMMAND_DATASET, "Work with datasets", "List datasets").subcommand(
        Command::new(COMMAND_GET)
            .about("Show a single item")
            .arg(id_parameter("Numeric id")),
    )
}

pub fn chart_command() -> Command {
    resource_command(COMMAND_CHART, "Work with charts", "List charts")
        .subcommand(
            Command::new(COMMAND_GET)
                .about("Show a single item")
                .arg(id_parameter("Numeric id")),
        )
        .subcommand(export_subcommand(
            "Export charts with their datasets and databases as a ZIP bundle",
            "Chart ids",
        ))
}

pub async fn execute_database_command(matches: &ArgMatches) -> Result<(), CliError> {
    match matches.subcommand() {
        Some((COMMAND_LIST, sub_matches)) => {
            Ok(list_resources::<Database>(sub_matches, ResourceKind::Database).await?)
        }
        Some((COMMAND_GET, sub_matches)) => {
            Ok(get_resource::<Database>(sub_matches, ResourceKind::Database).await?)
        }
        Some((COMMAND_USE, sub_matches)) => Ok(use_database(sub_matches)?),
        _ => Err(super::unsupported(matches)),
    }
}

pub async fn execute_dataset_command(matches: &ArgMatches) -> Result<(), CliError> {
    match matches.subcommand() {
        Some((COMMAND_LIST, sub_matches)) => {
            Ok(list_resources::<Dataset>(sub_matches, ResourceKind::Dataset).await?)
        }
        Some((COMMAND_GET, sub_matches)) => {
            Ok(get_resource::<Dataset>(sub_matches, ResourceKind::Dataset).await?)
        }
        _ => Err(super::unsupported(matches)),
    }
}

pub async fn execute_chart_command(matches: &ArgMatches) -> Result<(), CliError> {
    match matches.subcommand() {
        Some((COMMAND_LIST, sub_matches)) => {
            Ok(list_resources::<Chart>(sub_matches, ResourceKind::Chart).await?)
        }
        Some((COMMAND_GET, sub_matches)) => {
            Ok(get_resource::<Chart>(sub_matches, ResourceKind::Chart).await?)
        }
        Some((COMMAND_EXPORT, sub_matches)) => {
            Ok(export_assets(sub_matches, ResourceKind::Chart).await?)
        }
        _ => Err(super::unsupported(matches)),
    }
}
