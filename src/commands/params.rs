//! Shared command parameters for all CLI commands.
//!
//! Parameter names are defined once here; command modules only assemble them.

use crate::auth::AuthMethod;
use crate::format::OutputFormat;
use clap::{Arg, ArgAction};
use std::path::PathBuf;

// Generic verbs
pub const COMMAND_LIST: &str = "list";
pub const COMMAND_GET: &str = "get";
pub const COMMAND_ADD: &str = "add";
pub const COMMAND_USE: &str = "use";
pub const COMMAND_SHOW: &str = "show";
pub const COMMAND_REMOVE: &str = "remove";
pub const COMMAND_EXPORT: &str = "export";
pub const COMMAND_IMPORT: &str = "import";
pub const COMMAND_SET: &str = "set";
pub const COMMAND_PATH: &str = "path";
pub const COMMAND_TEST: &str = "test";
pub const COMMAND_RUN: &str = "run";
pub const COMMAND_VALIDATE: &str = "validate";
pub const COMMAND_CREATE: &str = "create";
pub const COMMAND_INFO: &str = "info";

// Command groups
pub const COMMAND_WORKSPACE: &str = "workspace";
pub const COMMAND_DATABASE: &str = "database";
pub const COMMAND_DATASET: &str = "dataset";
pub const COMMAND_CHART: &str = "chart";
pub const COMMAND_DASHBOARD: &str = "dashboard";
pub const COMMAND_USER: &str = "user";
pub const COMMAND_GROUP: &str = "group";
pub const COMMAND_AUTH: &str = "auth";
pub const COMMAND_CONFIG: &str = "config";
pub const COMMAND_SYNC: &str = "sync";

// Global parameters
pub const PARAMETER_VERBOSE: &str = "verbose";
pub const PARAMETER_WORKSPACE: &str = "workspace";
pub const PARAMETER_FORMAT: &str = "format";
pub const PARAMETER_PRETTY: &str = "pretty";
pub const PARAMETER_HEADERS: &str = "headers";

pub const PARAMETER_ID: &str = "id";
pub const PARAMETER_IDS: &str = "ids";
pub const PARAMETER_NAME: &str = "name";
pub const PARAMETER_PAGE: &str = "page";
pub const PARAMETER_LIMIT: &str = "limit";
pub const PARAMETER_OUTPUT: &str = "output";
pub const PARAMETER_FILE: &str = "file";
pub const PARAMETER_OVERWRITE: &str = "overwrite";
pub const PARAMETER_KEY: &str = "key";
pub const PARAMETER_VALUE: &str = "value";

// Workspace parameters
pub const PARAMETER_URL: &str = "url";
pub const PARAMETER_AUTH_METHOD: &str = "auth-method";
pub const PARAMETER_USERNAME: &str = "username";
pub const PARAMETER_PASSWORD: &str = "password";
pub const PARAMETER_JWT_TOKEN: &str = "jwt-token";
pub const PARAMETER_OAUTH_TOKEN_URL: &str = "oauth-token-url";
pub const PARAMETER_OAUTH_CLIENT_ID: &str = "oauth-client-id";
pub const PARAMETER_OAUTH_CLIENT_SECRET: &str = "oauth-client-secret";
pub const PARAMETER_OAUTH_USERNAME: &str = "oauth-username";
pub const PARAMETER_OAUTH_PASSWORD: &str = "oauth-password";
pub const PARAMETER_OAUTH_SCOPE: &str = "oauth-scope";
pub const PARAMETER_OAUTH_TOKEN_TYPE: &str = "oauth-token-type";

// Sync parameters
pub const PARAMETER_FOLDER: &str = "folder";
pub const PARAMETER_PULL_ONLY: &str = "pull-only";
pub const PARAMETER_PUSH_ONLY: &str = "push-only";
pub const PARAMETER_TARGET: &str = "target";
pub const PARAMETER_DRY_RUN: &str = "dry-run";
pub const PARAMETER_CONTINUE_ON_ERROR: &str = "continue-on-error";
pub const PARAMETER_SOURCE: &str = "source";
pub const PARAMETER_TARGETS: &str = "targets";
pub const PARAMETER_DASHBOARDS: &str = "dashboards";
pub const PARAMETER_FORCE: &str = "force";

// Config keys accepted by `config set`
pub const CONFIG_KEY_OUTPUT_FORMAT: &str = "output-format";
pub const CONFIG_KEY_TIMEOUT: &str = "timeout";

pub fn verbose_parameter() -> Arg {
    Arg::new(PARAMETER_VERBOSE)
        .short('v')
        .long(PARAMETER_VERBOSE)
        .action(ArgAction::SetTrue)
        .global(true)
        .help("Enable verbose output for debugging")
}

/// Workspace override for a single invocation.
pub fn workspace_parameter() -> Arg {
    Arg::new(PARAMETER_WORKSPACE)
        .short('w')
        .long(PARAMETER_WORKSPACE)
        .num_args(1)
        .required(false)
        .env("SUP_WORKSPACE")
        .global(true)
        .help("Workspace to use instead of the current one")
}

/// Output format; falls back to the configured `output_format` when absent.
pub fn format_parameter() -> Arg {
    Arg::new(PARAMETER_FORMAT)
        .short('f')
        .long(PARAMETER_FORMAT)
        .num_args(1)
        .required(false)
        .env("SUP_FORMAT")
        .global(true)
        .help("Output data format")
        .value_parser(OutputFormat::names())
}

pub fn format_pretty_parameter() -> Arg {
    Arg::new(PARAMETER_PRETTY)
        .long(PARAMETER_PRETTY)
        .action(ArgAction::SetTrue)
        .global(true)
        .help("Format the output pretty")
}

pub fn format_with_headers_parameter() -> Arg {
    Arg::new(PARAMETER_HEADERS)
        .long(PARAMETER_HEADERS)
        .action(ArgAction::SetTrue)
        .global(true)
        .help("Include headers in CSV output")
}

pub fn id_parameter(what: &'static str) -> Arg {
    Arg::new(PARAMETER_ID)
        .required(true)
        .num_args(1)
        .help(what)
        .value_parser(clap::value_parser!(i64))
}

/// One or more numeric ids as positional arguments.
pub fn ids_parameter(what: &'static str) -> Arg {
    Arg::new(PARAMETER_IDS)
        .required(true)
        .num_args(1..)
        .help(what)
        .value_parser(clap::value_parser!(i64))
}

pub fn page_parameter() -> Arg {
    Arg::new(PARAMETER_PAGE)
        .long(PARAMETER_PAGE)
        .num_args(1)
        .default_value("0")
        .help("Zero-based page number")
        .value_parser(clap::value_parser!(u32))
}

pub fn limit_parameter() -> Arg {
    Arg::new(PARAMETER_LIMIT)
        .short('l')
        .long(PARAMETER_LIMIT)
        .num_args(1)
        .default_value("25")
        .help("Number of items per page")
        .value_parser(clap::value_parser!(u32).range(1..))
}

pub fn name_parameter(what: &'static str) -> Arg {
    Arg::new(PARAMETER_NAME)
        .required(true)
        .num_args(1)
        .help(what)
}

pub fn output_file_parameter() -> Arg {
    Arg::new(PARAMETER_OUTPUT)
        .short('o')
        .long(PARAMETER_OUTPUT)
        .num_args(1)
        .required(true)
        .help("Output file path")
        .value_parser(clap::value_parser!(PathBuf))
}

pub fn input_file_parameter() -> Arg {
    Arg::new(PARAMETER_FILE)
        .required(true)
        .num_args(1)
        .help("Input file path")
        .value_parser(clap::value_parser!(PathBuf))
}

pub fn overwrite_parameter() -> Arg {
    Arg::new(PARAMETER_OVERWRITE)
        .long(PARAMETER_OVERWRITE)
        .action(ArgAction::SetTrue)
        .help("Replace existing assets with the same UUID")
}

pub fn auth_method_parameter() -> Arg {
    Arg::new(PARAMETER_AUTH_METHOD)
        .long(PARAMETER_AUTH_METHOD)
        .num_args(1)
        .default_value("username_password")
        .help("Authentication method")
        .value_parser(AuthMethod::names())
}

/// Optional string flag; secrets accept `${ENV:NAME}` references.
pub fn text_parameter(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).num_args(1).required(false).help(help)
}
