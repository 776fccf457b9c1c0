//! Dashboard command definitions.

use crate::actions::{
    assets::{export_assets, import_dashboards},
    resources::{get_resource, list_resources},
};
use crate::commands::params::{
    id_parameter, input_file_parameter, overwrite_parameter, COMMAND_DASHBOARD, COMMAND_EXPORT,
    COMMAND_GET, COMMAND_IMPORT, COMMAND_LIST,
};
use crate::commands::resource::{export_subcommand, list_subcommand};
use crate::error::CliError;
use crate::model::Dashboard;
use crate::superset::ResourceKind;
use clap::{ArgMatches, Command};

pub fn dashboard_command() -> Command {
    Command::new(COMMAND_DASHBOARD)
        .about("Work with dashboards")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(list_subcommand("List dashboards"))
        .subcommand(
            Command::new(COMMAND_GET)
                .about("Show a single dashboard")
                .arg(id_parameter("Dashboard id")),
        )
        .subcommand(export_subcommand(
            "Export dashboards with their charts, datasets and databases as a ZIP bundle",
            "Dashboard ids",
        ))
        .subcommand(
            Command::new(COMMAND_IMPORT)
                .about("Import a ZIP bundle produced by export")
                .arg(input_file_parameter())
                .arg(overwrite_parameter()),
        )
}

pub async fn execute_dashboard_command(matches: &ArgMatches) -> Result<(), CliError> {
    match matches.subcommand() {
        Some((COMMAND_LIST, sub_matches)) => {
            Ok(list_resources::<Dashboard>(sub_matches, ResourceKind::Dashboard).await?)
        }
        Some((COMMAND_GET, sub_matches)) => {
            Ok(get_resource::<Dashboard>(sub_matches, ResourceKind::Dashboard).await?)
        }
        Some((COMMAND_EXPORT, sub_matches)) => {
            Ok(export_assets(sub_matches, ResourceKind::Dashboard).await?)
        }
        Some((COMMAND_IMPORT, sub_matches)) => Ok(import_dashboards(sub_matches).await?),
        _ => Err(super::unsupported(matches)),
    }
}
