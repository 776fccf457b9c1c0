//! Read-only listing and retrieval of Superset assets.

use crate::{
    actions::{
        utils::{output_format, print_formatted, report_success, spinner},
        CliActionError,
    },
    commands::params::{PARAMETER_ID, PARAMETER_LIMIT, PARAMETER_PAGE, PARAMETER_WORKSPACE},
    configuration::Configuration,
    context::ExecutionContext,
    format::{format_item, CsvRecordProducer},
    superset::{Page, ResourceKind},
};
use clap::ArgMatches;
use serde::{de::DeserializeOwned, Serialize};
use tracing::trace;

pub fn page_from_args(sub_matches: &ArgMatches) -> Page {
    let default = Page::default();
    Page::new(
        sub_matches
            .get_one::<u32>(PARAMETER_PAGE)
            .copied()
            .unwrap_or(default.page),
        sub_matches
            .get_one::<u32>(PARAMETER_LIMIT)
            .copied()
            .unwrap_or(default.page_size),
    )
}

/// Print one page of `kind` from the selected workspace.
pub async fn list_resources<T>(
    sub_matches: &ArgMatches,
    kind: ResourceKind,
) -> Result<(), CliActionError>
where
    T: DeserializeOwned + Serialize + CsvRecordProducer,
{
    trace!("Executing \"{} list\"...", kind);
    let context = ExecutionContext::from_args(sub_matches).await?;
    let format = output_format(sub_matches, context.configuration())?;
    let page = page_from_args(sub_matches);

    let pb = spinner(format!("Fetching {}s from {}...", kind, context.workspace()));
    let response = context.client().list::<T>(kind, page).await;
    pb.finish_and_clear();

    print_formatted(&response?.result, &format)
}

/// Id a `get` falls back to when none is given on the command line.
fn default_id(context: &ExecutionContext, kind: ResourceKind) -> Option<i64> {
    match kind {
        ResourceKind::Database => context
            .configuration()
            .workspace(context.workspace())
            .ok()?
            .database_id,
        _ => None,
    }
}

/// Print a single `kind` by its numeric id.
pub async fn get_resource<T>(sub_matches: &ArgMatches, kind: ResourceKind) -> Result<(), CliActionError>
where
    T: DeserializeOwned + Serialize + CsvRecordProducer,
{
    trace!("Executing \"{} get\"...", kind);
    let context = ExecutionContext::from_args(sub_matches).await?;
    let id = sub_matches
        .get_one::<i64>(PARAMETER_ID)
        .copied()
        .or_else(|| default_id(&context, kind))
        .ok_or_else(|| CliActionError::MissingRequiredArgument(PARAMETER_ID.to_string()))?;
    let format = output_format(sub_matches, context.configuration())?;

    let pb = spinner(format!("Fetching {} {}...", kind, id));
    let item = context.client().get::<T>(kind, id).await;
    pb.finish_and_clear();

    println!("{}", format_item(&item?, &format)?.trim_end());
    Ok(())
}

/// Remember a database as the default of the selected workspace.
pub fn use_database(sub_matches: &ArgMatches) -> Result<(), CliActionError> {
    trace!("Executing \"database use\"...");
    let id = *sub_matches
        .get_one::<i64>(PARAMETER_ID)
        .ok_or_else(|| CliActionError::MissingRequiredArgument(PARAMETER_ID.to_string()))?;
    let mut configuration = Configuration::load_or_create_default()?;
    let requested = sub_matches
        .get_one::<String>(PARAMETER_WORKSPACE)
        .map(String::as_str);
    let workspace = configuration.resolve_workspace_name(requested)?;

    configuration.set_default_database(&workspace, id)?;
    configuration.save_to_default()?;
    report_success(&format!(
        "Database {} is now the default for workspace '{}'",
        id, workspace
    ));
    Ok(())
}
