//! Data models for Superset entities (databases, datasets, charts, dashboards,
//! users and roles) as returned by the REST API.
//!
//! Only the fields the CLI displays are modelled; everything else in the API
//! payloads is ignored during deserialization.

use crate::format::CsvRecordProducer;
use serde::{Deserialize, Serialize};

/// Envelope of the `GET /api/v1/<resource>/` list endpoints.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default)]
    pub count: Option<u64>,
    pub result: Vec<T>,
}

/// Envelope of the `GET /api/v1/<resource>/<id>` endpoints.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ItemResponse<T> {
    pub result: T,
}

fn opt<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(|v| v.to_string()).unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Database {
    pub id: i64,
    pub database_name: String,
    #[serde(default)]
    pub backend: Option<String>,
    #[serde(default)]
    pub expose_in_sqllab: Option<bool>,
}

impl CsvRecordProducer for Database {
    fn csv_header() -> Vec<&'static str> {
        vec!["ID", "NAME", "BACKEND", "EXPOSED_IN_SQLLAB"]
    }

    fn as_csv_record(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.database_name.clone(),
            opt(&self.backend),
            opt(&self.expose_in_sqllab),
        ]
    }
}

/// The database a dataset belongs to, as embedded in dataset payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseRef {
    #[serde(default)]
    pub id: Option<i64>,
    pub database_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub id: i64,
    pub table_name: String,
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub database: Option<DatabaseRef>,
}

impl CsvRecordProducer for Dataset {
    fn csv_header() -> Vec<&'static str> {
        vec!["ID", "TABLE_NAME", "SCHEMA", "KIND", "DATABASE"]
    }

    fn as_csv_record(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.table_name.clone(),
            opt(&self.schema),
            opt(&self.kind),
            self.database
                .as_ref()
                .map(|d| d.database_name.clone())
                .unwrap_or_default(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    pub id: i64,
    pub slice_name: String,
    #[serde(default)]
    pub viz_type: Option<String>,
    #[serde(default)]
    pub datasource_name_text: Option<String>,
    #[serde(default)]
    pub changed_on_delta_humanized: Option<String>,
}

impl CsvRecordProducer for Chart {
    fn csv_header() -> Vec<&'static str> {
        vec!["ID", "NAME", "VIZ_TYPE", "DATASET", "CHANGED"]
    }

    fn as_csv_record(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.slice_name.clone(),
            opt(&self.viz_type),
            opt(&self.datasource_name_text),
            opt(&self.changed_on_delta_humanized),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub id: i64,
    pub dashboard_title: String,
    #[serde(default)]
    pub published: Option<bool>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub changed_on_delta_humanized: Option<String>,
}

impl CsvRecordProducer for Dashboard {
    fn csv_header() -> Vec<&'static str> {
        vec!["ID", "TITLE", "PUBLISHED", "URL", "CHANGED"]
    }

    fn as_csv_record(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.dashboard_title.clone(),
            opt(&self.published),
            opt(&self.url),
            opt(&self.changed_on_delta_humanized),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
}

impl CsvRecordProducer for User {
    fn csv_header() -> Vec<&'static str> {
        vec!["ID", "USERNAME", "FIRST_NAME", "LAST_NAME", "EMAIL", "ACTIVE"]
    }

    fn as_csv_record(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.username.clone(),
            opt(&self.first_name),
            opt(&self.last_name),
            opt(&self.email),
            opt(&self.active),
        ]
    }
}

/// A Superset role; surfaced as a "group" on the command line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub id: i64,
    pub name: String,
}

impl CsvRecordProducer for Role {
    fn csv_header() -> Vec<&'static str> {
        vec!["ID", "NAME"]
    }

    fn as_csv_record(&self) -> Vec<String> {
        vec![self.id.to_string(), self.name.clone()]
    }
}

/// Payload of `GET /api/v1/me/`, the identity behind the current credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub username: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}
