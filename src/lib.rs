//! `sup`: a command line client for Apache Superset workspaces.
//!
//! # Modules
//!
//! - `auth`: authentication handlers (username/password, JWT, OAuth2 password grant)
//! - `superset`: the REST API client
//! - `configuration`: workspaces and settings stored in `config.yml`
//! - `commands`: CLI command definitions and dispatch
//! - `actions`: what each command does
//! - `bundle`: assets folders unpacked from exports and rendered per sync target
//! - `format`: JSON, YAML and CSV output
//! - `model`: Superset entities

pub mod actions;
pub mod auth;
pub mod bundle;
pub mod commands;
pub mod configuration;
pub mod context;
pub mod error;
pub mod exit_codes;
pub mod format;
pub mod http_utils;
pub mod model;
pub mod superset;
