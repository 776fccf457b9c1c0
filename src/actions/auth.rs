use crate::{
    actions::{
        utils::{output_format, report_success, spinner},
        CliActionError,
    },
    context::ExecutionContext,
    format::{format_item, CsvRecordProducer},
};
use clap::ArgMatches;
use serde::Serialize;
use tracing::trace;

/// Outcome of `sup auth test`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthCheck {
    pub workspace: String,
    pub url: String,
    pub auth_method: String,
    pub username: String,
}

impl CsvRecordProducer for AuthCheck {
    fn csv_header() -> Vec<&'static str> {
        vec!["WORKSPACE", "URL", "AUTH_METHOD", "USERNAME"]
    }

    fn as_csv_record(&self) -> Vec<String> {
        vec![
            self.workspace.clone(),
            self.url.clone(),
            self.auth_method.clone(),
            self.username.clone(),
        ]
    }
}

/// Authenticate against the selected workspace and ask Superset who we are.
pub async fn test_authentication(sub_matches: &ArgMatches) -> Result<(), CliActionError> {
    trace!("Executing \"auth test\"...");
    let pb = spinner("Authenticating...");
    let context = ExecutionContext::from_args(sub_matches).await;
    let context = match context {
        Ok(context) => context,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e);
        }
    };
    let me = context.client().current_user().await;
    pb.finish_and_clear();
    let me = me?;

    let check = AuthCheck {
        workspace: context.workspace().to_string(),
        url: context.client().base_url().to_string(),
        auth_method: context.client().auth().method().to_string(),
        username: me.username,
    };
    report_success(&format!(
        "Authenticated to '{}' as {}",
        check.workspace, check.username
    ));

    let format = output_format(sub_matches, context.configuration())?;
    println!("{}", format_item(&check, &format)?.trim_end());
    Ok(())
}
