//! Multi-workspace dashboard sync.
//!
//! A sync folder holds a `sync_config.yml` and an `assets/` directory. A pull
//! exports the configured dashboards from the source workspace and unpacks
//! them into `assets/`. A push renders the assets with each target's Jinja
//! context and imports the result, one target at a time.

use crate::{
    actions::{
        assets::DEFAULT_BUNDLE_NAME,
        utils::{output_format, print_formatted, report_failure, report_success, spinner},
        CliActionError,
    },
    bundle::{render_assets, unpack_bundle, TemplateContext},
    commands::params::{
        PARAMETER_CONTINUE_ON_ERROR, PARAMETER_DASHBOARDS, PARAMETER_DRY_RUN, PARAMETER_FOLDER,
        PARAMETER_FORCE, PARAMETER_PULL_ONLY, PARAMETER_PUSH_ONLY, PARAMETER_SOURCE,
        PARAMETER_TARGET, PARAMETER_TARGETS,
    },
    configuration::{Configuration, ConfigurationError},
    context::connect_workspace,
    format::CsvRecordProducer,
    superset::ResourceKind,
};
use clap::ArgMatches;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::{
    fs,
    path::{Path, PathBuf},
};
use strum::Display;
use tracing::{debug, trace, warn};

pub const SYNC_CONFIG_FILE_NAME: &str = "sync_config.yml";
pub const DEFAULT_ASSETS_FOLDER: &str = "assets";
/// Template variable holding the URL of the target workspace.
pub const INSTANCE_VARIABLE: &str = "instance";
const ASSET_SUBFOLDERS: [&str; 4] = ["charts", "dashboards", "datasets", "databases"];

const SYNC_CONFIG_HEADER: &str = "\
# Values under jinja_context are available as {{ name }} in the YAML files of
# the assets folder. A target's values take precedence over target_defaults,
# and {{ instance }} holds the URL of the target workspace.
";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncSource {
    pub workspace: String,
    pub dashboards: Vec<i64>,
}

/// Settings shared by all targets unless a target sets its own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetDefaults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overwrite: Option<bool>,
    #[serde(default)]
    pub jinja_context: TemplateContext,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncTarget {
    /// Label used by `--target`; defaults to the workspace name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub workspace: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overwrite: Option<bool>,
    #[serde(default)]
    pub jinja_context: TemplateContext,
}

impl SyncTarget {
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.workspace)
    }

    /// Whether the import replaces existing assets. Defaults to `true`.
    pub fn effective_overwrite(&self, defaults: &TargetDefaults) -> bool {
        self.overwrite.or(defaults.overwrite).unwrap_or(true)
    }

    /// The default context with this target's values laid over it.
    pub fn effective_context(&self, defaults: &TargetDefaults) -> TemplateContext {
        let mut context = defaults.jinja_context.clone();
        context.extend(self.jinja_context.clone());
        context
    }
}

fn default_assets_folder() -> String {
    DEFAULT_ASSETS_FOLDER.to_string()
}

/// Contents of `sync_config.yml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    pub source: SyncSource,
    #[serde(default)]
    pub target_defaults: TargetDefaults,
    #[serde(default)]
    pub targets: Vec<SyncTarget>,
    #[serde(default = "default_assets_folder")]
    pub assets_folder: String,
}

impl SyncConfig {
    /// Starting point written by `sync create`.
    pub fn scaffold(source: &str, targets: &[String], dashboards: &[i64]) -> SyncConfig {
        SyncConfig {
            source: SyncSource {
                workspace: source.to_string(),
                dashboards: dashboards.to_vec(),
            },
            target_defaults: TargetDefaults {
                overwrite: Some(true),
                jinja_context: TemplateContext::new(),
            },
            targets: targets
                .iter()
                .map(|workspace| SyncTarget {
                    name: None,
                    workspace: workspace.clone(),
                    overwrite: None,
                    jinja_context: TemplateContext::from([(
                        "workspace".to_string(),
                        Value::String(workspace.clone()),
                    )]),
                })
                .collect(),
            assets_folder: default_assets_folder(),
        }
    }

    pub fn load(folder: &Path) -> Result<SyncConfig, CliActionError> {
        let path = folder.join(SYNC_CONFIG_FILE_NAME);
        debug!("Loading sync configuration from {}", path.display());
        let content = fs::read_to_string(&path)?;
        let config: SyncConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, folder: &Path) -> Result<PathBuf, CliActionError> {
        let path = folder.join(SYNC_CONFIG_FILE_NAME);
        let content = format!("{}{}", SYNC_CONFIG_HEADER, serde_yaml::to_string(self)?);
        fs::write(&path, content)?;
        debug!("Wrote sync configuration to {}", path.display());
        Ok(path)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.source.workspace.trim().is_empty() {
            return Err(ConfigurationError::MissingRequiredPropertyValue {
                name: "source.workspace".to_string(),
            });
        }
        if self.source.dashboards.is_empty() {
            return Err(ConfigurationError::MissingRequiredPropertyValue {
                name: "source.dashboards".to_string(),
            });
        }
        Ok(())
    }

    pub fn assets_path(&self, folder: &Path) -> PathBuf {
        folder.join(&self.assets_folder)
    }

    /// Targets matching `--target` (by label or workspace name), or all of them.
    pub fn select_targets(
        &self,
        requested: Option<&str>,
    ) -> Result<Vec<SyncTarget>, ConfigurationError> {
        match requested {
            None => Ok(self.targets.clone()),
            Some(requested) => {
                let selected: Vec<SyncTarget> = self
                    .targets
                    .iter()
                    .filter(|t| t.label() == requested || t.workspace == requested)
                    .cloned()
                    .collect();
                if selected.is_empty() {
                    Err(ConfigurationError::InvalidPropertyValue {
                        name: "target".to_string(),
                        value: requested.to_string(),
                    })
                } else {
                    Ok(selected)
                }
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncOptions {
    pub pull: bool,
    pub push: bool,
    pub target: Option<String>,
    pub dry_run: bool,
    pub continue_on_error: bool,
}

impl SyncOptions {
    pub fn from_args(sub_matches: &ArgMatches) -> SyncOptions {
        SyncOptions {
            pull: !sub_matches.get_flag(PARAMETER_PUSH_ONLY),
            push: !sub_matches.get_flag(PARAMETER_PULL_ONLY),
            target: sub_matches.get_one::<String>(PARAMETER_TARGET).cloned(),
            dry_run: sub_matches.get_flag(PARAMETER_DRY_RUN),
            continue_on_error: sub_matches.get_flag(PARAMETER_CONTINUE_ON_ERROR),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SyncAction {
    Pull,
    Push,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SyncStatus {
    Ok,
    Planned,
    Failed,
    Skipped,
}

/// One line of the sync report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncStep {
    pub action: SyncAction,
    pub workspace: String,
    pub status: SyncStatus,
    pub detail: String,
}

impl CsvRecordProducer for SyncStep {
    fn csv_header() -> Vec<&'static str> {
        vec!["ACTION", "WORKSPACE", "STATUS", "DETAIL"]
    }

    fn as_csv_record(&self) -> Vec<String> {
        vec![
            self.action.to_string(),
            self.workspace.clone(),
            self.status.to_string(),
            self.detail.clone(),
        ]
    }
}

pub fn failed_steps(steps: &[SyncStep]) -> usize {
    steps
        .iter()
        .filter(|s| s.status == SyncStatus::Failed)
        .count()
}

async fn pull(
    configuration: &Configuration,
    config: &SyncConfig,
    assets: &Path,
) -> Result<String, CliActionError> {
    let client = connect_workspace(configuration, &config.source.workspace).await?;
    let bundle = client
        .export_assets(ResourceKind::Dashboard, &config.source.dashboards)
        .await?;
    let files = unpack_bundle(&bundle, assets)?;
    Ok(format!(
        "{} dashboard(s), {} file(s) to {}",
        config.source.dashboards.len(),
        files,
        assets.display()
    ))
}

async fn push(
    configuration: &Configuration,
    defaults: &TargetDefaults,
    target: &SyncTarget,
    assets: &Path,
) -> Result<String, CliActionError> {
    let client = connect_workspace(configuration, &target.workspace).await?;
    let mut context = target.effective_context(defaults);
    context.insert(
        INSTANCE_VARIABLE.to_string(),
        Value::String(client.base_url().to_string()),
    );
    let bundle = render_assets(assets, &context)?;
    let overwrite = target.effective_overwrite(defaults);
    client
        .import_dashboards(DEFAULT_BUNDLE_NAME, &bundle, overwrite)
        .await?;
    Ok(format!("imported (overwrite: {})", overwrite))
}

fn context_keys(context: &TemplateContext) -> String {
    context.keys().cloned().collect::<Vec<_>>().join(", ")
}

/// Run the pull and push phases and return one step per attempted action.
///
/// A failed pull ends the run. A failed push ends it too unless
/// `continue_on_error` is set, in which case the remaining targets still run.
pub async fn execute_sync(
    configuration: &Configuration,
    config: &SyncConfig,
    folder: &Path,
    options: &SyncOptions,
) -> Result<Vec<SyncStep>, CliActionError> {
    let targets = config.select_targets(options.target.as_deref())?;
    let assets = config.assets_path(folder);
    let mut steps = Vec::new();

    if options.pull {
        let workspace = config.source.workspace.clone();
        if options.dry_run {
            steps.push(SyncStep {
                action: SyncAction::Pull,
                workspace,
                status: SyncStatus::Planned,
                detail: format!(
                    "export dashboards {:?} to {}",
                    config.source.dashboards,
                    assets.display()
                ),
            });
        } else {
            let pb = spinner(format!("Pulling from '{}'...", workspace));
            let result = pull(configuration, config, &assets).await;
            pb.finish_and_clear();
            match result {
                Ok(detail) => steps.push(SyncStep {
                    action: SyncAction::Pull,
                    workspace,
                    status: SyncStatus::Ok,
                    detail,
                }),
                Err(e) => {
                    warn!("Pull from {} failed: {}", workspace, e);
                    steps.push(SyncStep {
                        action: SyncAction::Pull,
                        workspace,
                        status: SyncStatus::Failed,
                        detail: e.to_string(),
                    });
                    for target in &targets {
                        steps.push(skipped(target, "pull failed"));
                    }
                    return Ok(steps);
                }
            }
        }
    }

    if !options.push {
        return Ok(steps);
    }

    let mut aborted = false;
    for target in &targets {
        if aborted {
            steps.push(skipped(target, "previous target failed"));
            continue;
        }
        if options.dry_run {
            steps.push(SyncStep {
                action: SyncAction::Push,
                workspace: target.workspace.clone(),
                status: SyncStatus::Planned,
                detail: format!(
                    "import {} (overwrite: {}, context: [{}])",
                    assets.display(),
                    target.effective_overwrite(&config.target_defaults),
                    context_keys(&target.effective_context(&config.target_defaults))
                ),
            });
            continue;
        }

        let pb = spinner(format!("Pushing to '{}'...", target.label()));
        let result = push(configuration, &config.target_defaults, target, &assets).await;
        pb.finish_and_clear();
        match result {
            Ok(detail) => steps.push(SyncStep {
                action: SyncAction::Push,
                workspace: target.workspace.clone(),
                status: SyncStatus::Ok,
                detail,
            }),
            Err(e) => {
                warn!("Push to {} failed: {}", target.workspace, e);
                steps.push(SyncStep {
                    action: SyncAction::Push,
                    workspace: target.workspace.clone(),
                    status: SyncStatus::Failed,
                    detail: e.to_string(),
                });
                aborted = !options.continue_on_error;
            }
        }
    }
    Ok(steps)
}

fn skipped(target: &SyncTarget, reason: &str) -> SyncStep {
    SyncStep {
        action: SyncAction::Push,
        workspace: target.workspace.clone(),
        status: SyncStatus::Skipped,
        detail: reason.to_string(),
    }
}

pub async fn run_sync(sub_matches: &ArgMatches) -> Result<(), CliActionError> {
    trace!("Executing \"sync run\"...");
    let folder = sub_matches
        .get_one::<PathBuf>(PARAMETER_FOLDER)
        .ok_or_else(|| CliActionError::MissingRequiredArgument(PARAMETER_FOLDER.to_string()))?;
    let options = SyncOptions::from_args(sub_matches);

    let configuration = Configuration::load_or_create_default()?;
    let format = output_format(sub_matches, &configuration)?;
    let config = SyncConfig::load(folder)?;

    let steps = execute_sync(&configuration, &config, folder, &options).await?;
    print_formatted(&steps, &format)?;

    let failed = failed_steps(&steps);
    if failed > 0 {
        report_failure(&format!("Sync finished with {} failure(s)", failed));
        return Err(CliActionError::SyncFailed {
            failed,
            total: steps.len(),
        });
    }
    if options.dry_run {
        report_success("Dry run complete, nothing was changed");
    } else {
        report_success("Sync completed successfully");
    }
    Ok(())
}

/// Parse `sync_config.yml` and print what a run would touch.
pub fn validate_sync(sub_matches: &ArgMatches) -> Result<(), CliActionError> {
    trace!("Executing \"sync validate\"...");
    let folder = sub_matches
        .get_one::<PathBuf>(PARAMETER_FOLDER)
        .ok_or_else(|| CliActionError::MissingRequiredArgument(PARAMETER_FOLDER.to_string()))?;
    let configuration = Configuration::load_or_create_default()?;
    let config = SyncConfig::load(folder)?;

    configuration.workspace(&config.source.workspace)?;
    for target in &config.targets {
        configuration.workspace(&target.workspace)?;
    }

    report_success(&format!(
        "{} is valid: {} dashboard(s) from '{}' to {} target(s)",
        folder.join(SYNC_CONFIG_FILE_NAME).display(),
        config.source.dashboards.len(),
        config.source.workspace,
        config.targets.len()
    ));
    Ok(())
}

/// Lay out a new sync folder: `sync_config.yml` and an empty assets tree.
///
/// An existing `sync_config.yml` is only replaced with `force`.
pub fn create_sync_folder(
    folder: &Path,
    config: &SyncConfig,
    force: bool,
) -> Result<PathBuf, CliActionError> {
    if folder.join(SYNC_CONFIG_FILE_NAME).exists() && !force {
        return Err(CliActionError::FolderExists(folder.to_path_buf()));
    }
    config.validate()?;
    let assets = config.assets_path(folder);
    for subfolder in ASSET_SUBFOLDERS {
        fs::create_dir_all(assets.join(subfolder))?;
    }
    config.save(folder)
}

pub fn create_sync(sub_matches: &ArgMatches) -> Result<(), CliActionError> {
    trace!("Executing \"sync create\"...");
    let folder = sub_matches
        .get_one::<PathBuf>(PARAMETER_FOLDER)
        .ok_or_else(|| CliActionError::MissingRequiredArgument(PARAMETER_FOLDER.to_string()))?;
    let source = sub_matches
        .get_one::<String>(PARAMETER_SOURCE)
        .ok_or_else(|| CliActionError::MissingRequiredArgument(PARAMETER_SOURCE.to_string()))?;
    let targets: Vec<String> = sub_matches
        .get_many::<String>(PARAMETER_TARGETS)
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    let dashboards: Vec<i64> = sub_matches
        .get_many::<i64>(PARAMETER_DASHBOARDS)
        .map(|values| values.copied().collect())
        .unwrap_or_default();

    let configuration = Configuration::load_or_create_default()?;
    for workspace in std::iter::once(source).chain(targets.iter()) {
        if configuration.workspace(workspace).is_err() {
            warn!("Workspace '{}' is not configured yet", workspace);
        }
    }

    let config = SyncConfig::scaffold(source, &targets, &dashboards);
    let path = create_sync_folder(folder, &config, sub_matches.get_flag(PARAMETER_FORCE))?;
    report_success(&format!(
        "Created {} with {} target(s); assets go to {}",
        path.display(),
        targets.len(),
        config.assets_path(folder).display()
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::{read_bundle, write_bundle, BundleEntry};
    use crate::configuration::SupersetInstanceConfig;
    use serde_json::json;
    use tempfile::tempdir;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SYNC_YAML: &str = r#"
source:
  workspace: source
  dashboards: [1, 2]
target_defaults:
  jinja_context:
    region: emea
    customer: Default Co
targets:
  - name: customer_a
    workspace: target-a
    jinja_context:
      customer: ACME
  - workspace: target-b
    overwrite: false
    jinja_context:
      customer: Globex
"#;

    fn jwt_workspace(url: &str) -> SupersetInstanceConfig {
        SupersetInstanceConfig {
            url: url.to_string(),
            auth_method: "jwt".to_string(),
            jwt_token: Some("JWT".to_string()),
            ..SupersetInstanceConfig::default()
        }
    }

    fn configuration(source: &str, target_a: &str, target_b: &str) -> Configuration {
        let mut configuration = Configuration::default();
        configuration
            .add_workspace("source", jwt_workspace(source))
            .unwrap();
        configuration
            .add_workspace("target-a", jwt_workspace(target_a))
            .unwrap();
        configuration
            .add_workspace("target-b", jwt_workspace(target_b))
            .unwrap();
        configuration
    }

    async fn import_server(status: u16) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/dashboard/import/"))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({ "message": "done" })))
            .mount(&server)
            .await;
        server
    }

    fn write_assets(assets: &Path) {
        fs::create_dir_all(assets.join("dashboards")).unwrap();
        fs::write(assets.join("metadata.yaml"), "version: 1.0.0\ntype: Dashboard\n").unwrap();
        fs::write(
            assets.join("dashboards/sales.yaml"),
            "dashboard_title: Sales for {{ customer }}\n",
        )
        .unwrap();
    }

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack
            .windows(needle.len())
            .position(|window| window == needle)
    }

    /// The ZIP file of the single multipart import `server` received.
    async fn uploaded_bundle(server: &MockServer) -> Vec<BundleEntry> {
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        let content_type = request
            .headers
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap();
        let boundary = content_type.split("boundary=").nth(1).unwrap();
        let start = find(&request.body, b"PK\x03\x04").unwrap();
        let end = start
            + find(
                &request.body[start..],
                format!("\r\n--{}", boundary).as_bytes(),
            )
            .unwrap();
        read_bundle(&request.body[start..end]).unwrap()
    }

    fn text<'a>(entries: &'a [BundleEntry], path: &str) -> &'a str {
        let entry = entries.iter().find(|e| e.path == path).unwrap();
        std::str::from_utf8(&entry.content).unwrap()
    }

    #[test]
    fn test_sync_config_defaults_and_targets() {
        let config: SyncConfig = serde_yaml::from_str(SYNC_YAML).unwrap();
        assert_eq!(config.assets_folder, "assets");
        assert!(config.targets[0].effective_overwrite(&config.target_defaults));
        assert!(!config.targets[1].effective_overwrite(&config.target_defaults));
        assert_eq!(config.targets[1].label(), "target-b");

        let context = config.targets[0].effective_context(&config.target_defaults);
        assert_eq!(context["customer"], "ACME");
        assert_eq!(context["region"], "emea");

        let selected = config.select_targets(Some("customer_a")).unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].workspace, "target-a");
        assert_eq!(config.select_targets(Some("target-b")).unwrap().len(), 1);
        assert!(config.select_targets(Some("nobody")).is_err());
        assert_eq!(config.select_targets(None).unwrap().len(), 2);
    }

    #[test]
    fn test_overwrite_falls_back_to_defaults() {
        let mut config: SyncConfig = serde_yaml::from_str(SYNC_YAML).unwrap();
        config.target_defaults.overwrite = Some(false);
        assert!(!config.targets[0].effective_overwrite(&config.target_defaults));
        config.targets[0].overwrite = Some(true);
        assert!(config.targets[0].effective_overwrite(&config.target_defaults));
    }

    #[test]
    fn test_sync_config_requires_dashboards() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(SYNC_CONFIG_FILE_NAME),
            "source:\n  workspace: prod\n  dashboards: []\n",
        )
        .unwrap();
        assert!(matches!(
            SyncConfig::load(dir.path()),
            Err(CliActionError::ConfigurationError(
                ConfigurationError::MissingRequiredPropertyValue { .. }
            ))
        ));
    }

    #[test]
    fn test_create_sync_folder() {
        let dir = tempdir().unwrap();
        let folder = dir.path().join("customers");
        let config = SyncConfig::scaffold(
            "prod",
            &["customer-a".to_string(), "customer-b".to_string()],
            &[10, 11],
        );

        let path = create_sync_folder(&folder, &config, false).unwrap();
        assert!(fs::read_to_string(&path)
            .unwrap()
            .starts_with("# Values under jinja_context"));
        for subfolder in ASSET_SUBFOLDERS {
            assert!(folder.join("assets").join(subfolder).is_dir());
        }

        let loaded = SyncConfig::load(&folder).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.targets[1].jinja_context["workspace"], "customer-b");

        assert!(matches!(
            create_sync_folder(&folder, &config, false),
            Err(CliActionError::FolderExists(_))
        ));
        assert!(create_sync_folder(&folder, &config, true).is_ok());
        assert!(create_sync_folder(
            &dir.path().join("empty"),
            &SyncConfig::scaffold("prod", &[], &[]),
            false
        )
        .is_err());
    }

    #[tokio::test]
    async fn test_dry_run_touches_nothing() {
        let dir = tempdir().unwrap();
        let config: SyncConfig = serde_yaml::from_str(SYNC_YAML).unwrap();
        let configuration = configuration(
            "http://127.0.0.1:9",
            "http://127.0.0.1:9",
            "http://127.0.0.1:9",
        );
        let options = SyncOptions {
            pull: true,
            push: true,
            dry_run: true,
            ..SyncOptions::default()
        };

        let steps = execute_sync(&configuration, &config, dir.path(), &options)
            .await
            .unwrap();
        assert_eq!(steps.len(), 3);
        assert!(steps.iter().all(|s| s.status == SyncStatus::Planned));
        assert!(steps[2]
            .detail
            .ends_with("(overwrite: false, context: [customer, region])"));
        assert!(!config.assets_path(dir.path()).exists());
    }

    #[tokio::test]
    async fn test_pull_then_push_renders_per_target() {
        let export = write_bundle(&[
            BundleEntry::new("dashboard_export_1/metadata.yaml", "version: 1.0.0\n"),
            BundleEntry::new(
                "dashboard_export_1/dashboards/sales.yaml",
                "dashboard_title: Sales\n",
            ),
            BundleEntry::new(
                "dashboard_export_1/datasets/orders.yaml",
                "table_name: orders\nsql: SELECT * FROM orders WHERE ds = '{{ ds }}'\n",
            ),
        ])
        .unwrap();
        let source = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/dashboard/export/"))
            .and(query_param("q", "!(1,2)"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(export))
            .expect(1)
            .mount(&source)
            .await;
        let target_a = import_server(200).await;
        let target_b = import_server(200).await;

        let dir = tempdir().unwrap();
        let config: SyncConfig = serde_yaml::from_str(SYNC_YAML).unwrap();
        let configuration = configuration(&source.uri(), &target_a.uri(), &target_b.uri());
        let mut options = SyncOptions {
            pull: true,
            push: false,
            ..SyncOptions::default()
        };

        let steps = execute_sync(&configuration, &config, dir.path(), &options)
            .await
            .unwrap();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].status, SyncStatus::Ok);
        let assets = config.assets_path(dir.path());
        assert!(assets.join("datasets/orders.yaml").exists());

        fs::write(
            assets.join("dashboards/sales.overrides.yaml"),
            "dashboard_title: Sales for {{ customer }} ({{ region }})\ncertified_by: \"{{ instance }}\"\n",
        )
        .unwrap();
        options.pull = false;
        options.push = true;
        let steps = execute_sync(&configuration, &config, dir.path(), &options)
            .await
            .unwrap();
        assert_eq!(failed_steps(&steps), 0);
        assert_eq!(steps.len(), 2);

        let bundle_a = uploaded_bundle(&target_a).await;
        let bundle_b = uploaded_bundle(&target_b).await;
        assert!(bundle_a
            .iter()
            .all(|e| e.path != "bundle/dashboards/sales.overrides.yaml"));

        let sales_a: Value =
            serde_yaml::from_str(text(&bundle_a, "bundle/dashboards/sales.yaml")).unwrap();
        let sales_b: Value =
            serde_yaml::from_str(text(&bundle_b, "bundle/dashboards/sales.yaml")).unwrap();
        assert_eq!(sales_a["dashboard_title"], "Sales for ACME (emea)");
        assert_eq!(sales_b["dashboard_title"], "Sales for Globex (emea)");
        assert!(sales_a["certified_by"]
            .as_str()
            .unwrap()
            .starts_with(&target_a.uri()));
        assert!(sales_b["certified_by"]
            .as_str()
            .unwrap()
            .starts_with(&target_b.uri()));

        assert_eq!(
            text(&bundle_b, "bundle/datasets/orders.yaml"),
            "table_name: orders\nsql: SELECT * FROM orders WHERE ds = '{{ ds }}'\n"
        );
    }

    #[tokio::test]
    async fn test_push_failure_stops_unless_continue_on_error() {
        let failing = import_server(500).await;
        let healthy = import_server(200).await;

        let dir = tempdir().unwrap();
        let config: SyncConfig = serde_yaml::from_str(SYNC_YAML).unwrap();
        write_assets(&config.assets_path(dir.path()));

        let configuration = configuration("http://127.0.0.1:9", &failing.uri(), &healthy.uri());
        let mut options = SyncOptions {
            pull: false,
            push: true,
            ..SyncOptions::default()
        };

        let steps = execute_sync(&configuration, &config, dir.path(), &options)
            .await
            .unwrap();
        assert_eq!(steps[0].status, SyncStatus::Failed);
        assert_eq!(steps[1].status, SyncStatus::Skipped);

        options.continue_on_error = true;
        let steps = execute_sync(&configuration, &config, dir.path(), &options)
            .await
            .unwrap();
        assert_eq!(steps[0].status, SyncStatus::Failed);
        assert_eq!(steps[1].status, SyncStatus::Ok);
        assert_eq!(failed_steps(&steps), 1);
    }

    #[tokio::test]
    async fn test_push_reports_template_errors() {
        let target_a = import_server(200).await;
        let target_b = import_server(200).await;

        let dir = tempdir().unwrap();
        let config: SyncConfig = serde_yaml::from_str(SYNC_YAML).unwrap();
        let assets = config.assets_path(dir.path());
        write_assets(&assets);
        fs::write(assets.join("dashboards/broken.yaml"), "x: {{ oops(\n").unwrap();

        let configuration = configuration("http://127.0.0.1:9", &target_a.uri(), &target_b.uri());
        let options = SyncOptions {
            pull: false,
            push: true,
            target: Some("customer_a".to_string()),
            ..SyncOptions::default()
        };

        let steps = execute_sync(&configuration, &config, dir.path(), &options)
            .await
            .unwrap();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].status, SyncStatus::Failed);
        assert!(steps[0].detail.contains("bundle/dashboards/broken.yaml"));
        assert!(target_a.received_requests().await.unwrap().is_empty());
    }
}
