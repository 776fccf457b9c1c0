//! Export of chart and dashboard bundles, import of dashboard bundles.

use crate::{
    actions::{
        utils::{report_success, spinner},
        CliActionError,
    },
    commands::params::{PARAMETER_FILE, PARAMETER_IDS, PARAMETER_OUTPUT, PARAMETER_OVERWRITE},
    context::ExecutionContext,
    superset::ResourceKind,
};
use clap::ArgMatches;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, trace};

pub const DEFAULT_BUNDLE_NAME: &str = "dashboards.zip";

/// File name sent with the multipart upload.
pub fn bundle_file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_BUNDLE_NAME.to_string())
}

/// Write the export of `kind` with the given ids to `--output`.
pub async fn export_assets(
    sub_matches: &ArgMatches,
    kind: ResourceKind,
) -> Result<(), CliActionError> {
    trace!("Executing \"{} export\"...", kind);
    let ids: Vec<i64> = sub_matches
        .get_many::<i64>(PARAMETER_IDS)
        .map(|values| values.copied().collect())
        .unwrap_or_default();
    if ids.is_empty() {
        return Err(CliActionError::MissingRequiredArgument(
            PARAMETER_IDS.to_string(),
        ));
    }
    let output = sub_matches
        .get_one::<PathBuf>(PARAMETER_OUTPUT)
        .ok_or_else(|| CliActionError::MissingRequiredArgument(PARAMETER_OUTPUT.to_string()))?;

    let context = ExecutionContext::from_args(sub_matches).await?;
    let pb = spinner(format!("Exporting {} {}(s)...", ids.len(), kind));
    let bundle = context.client().export_assets(kind, &ids).await;
    pb.finish_and_clear();
    let bundle = bundle?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(output, &bundle)?;
    debug!("Wrote {} bytes to {}", bundle.len(), output.display());

    report_success(&format!(
        "Exported {} {}(s) from '{}' to {}",
        ids.len(),
        kind,
        context.workspace(),
        output.display()
    ));
    Ok(())
}

pub async fn import_dashboards(sub_matches: &ArgMatches) -> Result<(), CliActionError> {
    trace!("Executing \"dashboard import\"...");
    let file = sub_matches
        .get_one::<PathBuf>(PARAMETER_FILE)
        .ok_or_else(|| CliActionError::MissingRequiredArgument(PARAMETER_FILE.to_string()))?;
    let overwrite = sub_matches.get_flag(PARAMETER_OVERWRITE);
    let bundle = fs::read(file)?;

    let context = ExecutionContext::from_args(sub_matches).await?;
    let pb = spinner(format!("Importing {}...", file.display()));
    let result = context
        .client()
        .import_dashboards(&bundle_file_name(file), &bundle, overwrite)
        .await;
    pb.finish_and_clear();
    result?;

    report_success(&format!(
        "Imported {} into '{}'",
        file.display(),
        context.workspace()
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundle_file_name() {
        assert_eq!(
            bundle_file_name(Path::new("/tmp/out/sales.zip")),
            "sales.zip"
        );
        assert_eq!(bundle_file_name(Path::new("/")), DEFAULT_BUNDLE_NAME);
    }
}
