use crate::{
    format::{Formattable, FormattingError, OutputFormat, JSON},
    http_utils::DEFAULT_TIMEOUT_SECS,
};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::debug;

pub const DEFAULT_APPLICATION_ID: &str = "sup";
pub const DEFAULT_CONFIGURATION_FILE_NAME: &str = "config.yml";
pub const CONFIGURATION_DIRECTORY_ENV: &str = "SUP_CONFIG_DIR";

const ENV_REFERENCE_PREFIX: &str = "${ENV:";
const ENV_REFERENCE_SUFFIX: &str = "}";

type BoxedError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("failed to resolve the configuration directory")]
    FailedToFindConfigurationDirectory,
    #[error("failed to load configuration data, because of: {cause}")]
    FailedToLoadData { cause: BoxedError },
    #[error("failed to write configuration data to file, because of: {cause}")]
    FailedToWriteData { cause: BoxedError },
    #[error("missing value for property {name:?}")]
    MissingRequiredPropertyValue { name: String },
    #[error("invalid value {value:?} for property {name:?}")]
    InvalidPropertyValue { name: String, value: String },
    #[error("workspace {name:?} is not configured")]
    WorkspaceNotFound { name: String },
    #[error("no workspace selected, run 'sup workspace use <NAME>' first")]
    NoCurrentWorkspace,
    #[error("{cause}")]
    FormattingError {
        #[from]
        cause: FormattingError,
    },
}

/// Connection settings of one Superset instance.
///
/// Secret values may be written as `${ENV:VARIABLE}`; they are looked up in the
/// environment when the workspace is used, see [`resolve_value`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SupersetInstanceConfig {
    pub url: String,
    #[serde(default = "default_auth_method")]
    pub auth_method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwt_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth_token_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth_client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth_client_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth_password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth_scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth_token_type: Option<String>,
    /// Database used when a database command is given no id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_id: Option<i64>,
}

fn default_auth_method() -> String {
    "username_password".to_string()
}

fn default_output_format() -> String {
    JSON.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Resolve a configured value: blank values count as absent and
/// `${ENV:NAME}` references are replaced by the variable's value. Literal
/// values are returned untouched, surrounding whitespace included.
pub fn resolve_value(raw: Option<&str>) -> Option<String> {
    let raw = raw?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    match trimmed
        .strip_prefix(ENV_REFERENCE_PREFIX)
        .and_then(|rest| rest.strip_suffix(ENV_REFERENCE_SUFFIX))
    {
        Some(variable) => match std::env::var(variable) {
            Ok(value) if !value.is_empty() => Some(value),
            _ => {
                debug!("Environment variable {} is not set", variable);
                None
            }
        },
        None => Some(raw.to_string()),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    current_workspace: Option<String>,
    #[serde(default = "default_output_format")]
    output_format: String,
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
    #[serde(default)]
    workspaces: BTreeMap<String, SupersetInstanceConfig>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            current_workspace: None,
            output_format: default_output_format(),
            timeout_secs: default_timeout_secs(),
            workspaces: BTreeMap::new(),
        }
    }
}

impl Configuration {
    pub fn get_default_configuration_file_path() -> Result<PathBuf, ConfigurationError> {
        if let Ok(config_dir_str) = std::env::var(CONFIGURATION_DIRECTORY_ENV) {
            let mut config_path = PathBuf::from(config_dir_str);
            config_path.push(DEFAULT_CONFIGURATION_FILE_NAME);
            return Ok(config_path);
        }

        match config_dir() {
            Some(mut path) => {
                path.push(DEFAULT_APPLICATION_ID);
                path.push(DEFAULT_CONFIGURATION_FILE_NAME);
                Ok(path)
            }
            None => Err(ConfigurationError::FailedToFindConfigurationDirectory),
        }
    }

    /// Load the default configuration, falling back to an empty one (without
    /// writing it) when the file does not exist yet.
    pub fn load_or_create_default() -> Result<Configuration, ConfigurationError> {
        let path = Configuration::get_default_configuration_file_path()?;
        debug!("Loading configuration from {}...", path.display());

        if !path.exists() {
            debug!("Configuration file not found, using defaults");
            return Ok(Configuration::default());
        }
        Configuration::load_from_file(&path)
    }

    pub fn load_from_file(path: &Path) -> Result<Configuration, ConfigurationError> {
        let content = fs::read_to_string(path)
            .map_err(|cause| ConfigurationError::FailedToLoadData {
                cause: Box::new(cause),
            })?;
        serde_yaml::from_str(&content).map_err(|cause| ConfigurationError::FailedToLoadData {
            cause: Box::new(cause),
        })
    }

    pub fn write<W: Write>(&self, writer: W) -> Result<(), ConfigurationError> {
        serde_yaml::to_writer(writer, self)
            .map_err(|e| ConfigurationError::FailedToWriteData { cause: Box::new(e) })
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigurationError> {
        let directory = path
            .parent()
            .ok_or(ConfigurationError::FailedToFindConfigurationDirectory)?;
        fs::create_dir_all(directory)
            .map_err(|_| ConfigurationError::FailedToFindConfigurationDirectory)?;

        let file = File::create(path)
            .map_err(|e| ConfigurationError::FailedToWriteData { cause: Box::new(e) })?;
        self.write(file)?;
        debug!("Configuration saved to {}", path.display());
        Ok(())
    }

    pub fn save_to_default(&self) -> Result<(), ConfigurationError> {
        self.save(&Self::get_default_configuration_file_path()?)
    }

    pub fn current_workspace(&self) -> Option<&str> {
        self.current_workspace.as_deref()
    }

    pub fn set_current_workspace(&mut self, name: &str) -> Result<(), ConfigurationError> {
        if !self.workspaces.contains_key(name) {
            return Err(ConfigurationError::WorkspaceNotFound {
                name: name.to_string(),
            });
        }
        self.current_workspace = Some(name.to_string());
        Ok(())
    }

    pub fn workspaces(&self) -> &BTreeMap<String, SupersetInstanceConfig> {
        &self.workspaces
    }

    pub fn workspace(&self, name: &str) -> Result<&SupersetInstanceConfig, ConfigurationError> {
        self.workspaces
            .get(name)
            .ok_or_else(|| ConfigurationError::WorkspaceNotFound {
                name: name.to_string(),
            })
    }

    /// Pick the workspace named on the command line, or the current one.
    pub fn resolve_workspace_name(
        &self,
        requested: Option<&str>,
    ) -> Result<String, ConfigurationError> {
        let name = requested
            .or(self.current_workspace())
            .ok_or(ConfigurationError::NoCurrentWorkspace)?;
        self.workspace(name)?;
        Ok(name.to_string())
    }

    /// Add or replace a workspace. The first workspace becomes the current one.
    pub fn add_workspace(
        &mut self,
        name: &str,
        workspace: SupersetInstanceConfig,
    ) -> Result<(), ConfigurationError> {
        if workspace.url.trim().is_empty() {
            return Err(ConfigurationError::MissingRequiredPropertyValue {
                name: "url".to_string(),
            });
        }
        url::Url::parse(&workspace.url).map_err(|_| ConfigurationError::InvalidPropertyValue {
            name: "url".to_string(),
            value: workspace.url.clone(),
        })?;

        self.workspaces.insert(name.to_string(), workspace);
        if self.current_workspace.is_none() {
            self.current_workspace = Some(name.to_string());
        }
        Ok(())
    }

    pub fn set_default_database(
        &mut self,
        workspace: &str,
        database_id: i64,
    ) -> Result<(), ConfigurationError> {
        let instance = self.workspaces.get_mut(workspace).ok_or_else(|| {
            ConfigurationError::WorkspaceNotFound {
                name: workspace.to_string(),
            }
        })?;
        instance.database_id = Some(database_id);
        Ok(())
    }

    pub fn remove_workspace(&mut self, name: &str) -> Result<(), ConfigurationError> {
        if self.workspaces.remove(name).is_none() {
            return Err(ConfigurationError::WorkspaceNotFound {
                name: name.to_string(),
            });
        }
        if self.current_workspace.as_deref() == Some(name) {
            self.current_workspace = None;
        }
        Ok(())
    }

    pub fn output_format(&self) -> &str {
        &self.output_format
    }

    pub fn set_output_format(&mut self, format: &str) -> Result<(), ConfigurationError> {
        let parsed = OutputFormat::from_str(format)?;
        self.output_format = parsed.to_string();
        Ok(())
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    pub fn set_timeout_secs(&mut self, timeout: &str) -> Result<(), ConfigurationError> {
        match timeout.parse::<u64>() {
            Ok(value) if value > 0 => {
                self.timeout_secs = value;
                Ok(())
            }
            _ => Err(ConfigurationError::InvalidPropertyValue {
                name: "timeout".to_string(),
                value: timeout.to_string(),
            }),
        }
    }

    pub fn summary(&self, path: Option<PathBuf>) -> ConfigurationSummary {
        ConfigurationSummary {
            path: path.map(|p| p.display().to_string()),
            current_workspace: self.current_workspace.clone(),
            output_format: self.output_format.clone(),
            timeout_secs: self.timeout_secs,
            workspaces: self.workspaces.keys().cloned().collect(),
        }
    }
}

/// What `sup config show` prints. Carries no secrets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigurationSummary {
    pub path: Option<String>,
    pub current_workspace: Option<String>,
    pub output_format: String,
    pub timeout_secs: u64,
    pub workspaces: Vec<String>,
}

impl Formattable for ConfigurationSummary {
    fn format(&self, f: &OutputFormat) -> Result<String, FormattingError> {
        match f {
            OutputFormat::Json(options) => {
                if options.pretty {
                    Ok(serde_json::to_string_pretty(self)?)
                } else {
                    Ok(serde_json::to_string(self)?)
                }
            }
            OutputFormat::Yaml(_) => Ok(serde_yaml::to_string(self)?),
            OutputFormat::Csv(options) => {
                let mut wtr = csv::Writer::from_writer(vec![]);
                if options.with_headers {
                    wtr.write_record([
                        "PATH",
                        "CURRENT_WORKSPACE",
                        "OUTPUT_FORMAT",
                        "TIMEOUT_SECS",
                        "WORKSPACES",
                    ])?;
                }
                wtr.write_record([
                    self.path.clone().unwrap_or_default(),
                    self.current_workspace.clone().unwrap_or_default(),
                    self.output_format.clone(),
                    self.timeout_secs.to_string(),
                    self.workspaces.join(";"),
                ])?;
                Ok(String::from_utf8(wtr.into_inner()?)?)
            }
        }
    }
}
