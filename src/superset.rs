//! Async client for the Superset REST API.
//!
//! Every request carries the headers of the workspace's [`Auth`] handler. A 401
//! answer triggers one re-authentication and one retry of the same request.

use crate::auth::{Auth, AuthError};
use crate::http_utils::{endpoint, read_error_body};
use crate::model::{CurrentUser, ItemResponse, ListResponse};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use strum::Display;
use tracing::{debug, warn};
use url::Url;

pub const DEFAULT_PAGE_SIZE: u32 = 25;
const CURRENT_USER_PATH: &str = "api/v1/me/";
const EXPORT_PATH: &str = "export/";
const DASHBOARD_IMPORT_PATH: &str = "api/v1/dashboard/import/";

/// Error emitted by the Superset API client
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Auth(#[from] AuthError),
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("{method} {url} returned HTTP {status}: {body}")]
    UnexpectedStatus {
        method: Method,
        url: String,
        status: StatusCode,
        body: String,
    },
    #[error("{kind} {id} not found")]
    NotFound { kind: ResourceKind, id: i64 },
}

/// Superset resources reachable through the generic list/get endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ResourceKind {
    Database,
    Dataset,
    Chart,
    Dashboard,
    User,
    Role,
}

impl ResourceKind {
    pub fn api_path(&self) -> &'static str {
        match self {
            ResourceKind::Database => "api/v1/database/",
            ResourceKind::Dataset => "api/v1/dataset/",
            ResourceKind::Chart => "api/v1/chart/",
            ResourceKind::Dashboard => "api/v1/dashboard/",
            ResourceKind::User => "api/v1/security/users/",
            ResourceKind::Role => "api/v1/security/roles/",
        }
    }
}

/// Zero-based page selection for list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub page_size: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Page {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self { page, page_size }
    }

    fn to_rison(self) -> String {
        format!("(page:{},page_size:{})", self.page, self.page_size)
    }
}

fn rison_id_list(ids: &[i64]) -> String {
    let ids: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
    format!("!({})", ids.join(","))
}

pub struct SupersetClient {
    base_url: Url,
    http: reqwest::Client,
    auth: Box<dyn Auth>,
}

impl SupersetClient {
    /// Wrap an auth handler without contacting the server.
    pub fn new(base_url: Url, http: reqwest::Client, auth: Box<dyn Auth>) -> Self {
        Self {
            base_url,
            http,
            auth,
        }
    }

    /// Build the client and authenticate before returning it.
    pub async fn connect(
        base_url: Url,
        http: reqwest::Client,
        auth: Box<dyn Auth>,
    ) -> Result<Self, ApiError> {
        let client = Self::new(base_url, http, auth);
        debug!(
            "Authenticating against {} using {}",
            client.base_url,
            client.auth.method()
        );
        client.auth.authenticate().await?;
        Ok(client)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn auth(&self) -> &dyn Auth {
        self.auth.as_ref()
    }

    async fn send_once<F>(&self, build: &F) -> Result<Response, ApiError>
    where
        F: Fn() -> Result<RequestBuilder, ApiError>,
    {
        let headers = self.auth.headers().await?;
        let mut request = build()?;
        for (name, value) in headers.iter() {
            request = request.header(name.as_str(), value.as_str());
        }
        Ok(request.send().await?)
    }

    /// Send the request built by `build`, re-authenticating once on 401.
    ///
    /// `build` is called again for the retry, so bodies that cannot be cloned
    /// (multipart forms) are rebuilt from scratch.
    async fn execute<F>(&self, method: Method, url: &Url, build: F) -> Result<Response, ApiError>
    where
        F: Fn() -> Result<RequestBuilder, ApiError>,
    {
        debug!("{} {}", method, url);
        let mut response = self.send_once(&build).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            warn!("{} {} was rejected with 401, re-authenticating", method, url);
            self.auth.authenticate().await?;
            response = self.send_once(&build).await?;
        }

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        Err(ApiError::UnexpectedStatus {
            method,
            url: url.to_string(),
            status,
            body: read_error_body(response).await,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let response = self
            .execute(Method::GET, &url, || Ok(self.http.get(url.clone())))
            .await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// One page of any list endpoint.
    pub async fn list<T: DeserializeOwned>(
        &self,
        kind: ResourceKind,
        page: Page,
    ) -> Result<ListResponse<T>, ApiError> {
        let mut url = endpoint(&self.base_url, kind.api_path())?;
        url.query_pairs_mut().append_pair("q", &page.to_rison());
        self.get_json(url).await
    }

    /// A single resource by id; HTTP 404 maps to [`ApiError::NotFound`].
    pub async fn get<T: DeserializeOwned>(&self, kind: ResourceKind, id: i64) -> Result<T, ApiError> {
        let url = endpoint(&self.base_url, &format!("{}{}", kind.api_path(), id))?;
        match self.get_json::<ItemResponse<T>>(url).await {
            Ok(item) => Ok(item.result),
            Err(ApiError::UnexpectedStatus {
                status: StatusCode::NOT_FOUND,
                ..
            }) => Err(ApiError::NotFound { kind, id }),
            Err(e) => Err(e),
        }
    }

    pub async fn current_user(&self) -> Result<CurrentUser, ApiError> {
        let url = endpoint(&self.base_url, CURRENT_USER_PATH)?;
        let item: ItemResponse<CurrentUser> = self.get_json(url).await?;
        Ok(item.result)
    }

    /// Export charts or dashboards, with everything they depend on, as a ZIP
    /// bundle.
    pub async fn export_assets(
        &self,
        kind: ResourceKind,
        ids: &[i64],
    ) -> Result<Vec<u8>, ApiError> {
        let mut url = endpoint(&self.base_url, &format!("{}{}", kind.api_path(), EXPORT_PATH))?;
        url.query_pairs_mut().append_pair("q", &rison_id_list(ids));

        let response = self
            .execute(Method::GET, &url, || Ok(self.http.get(url.clone())))
            .await?;
        let bytes = response.bytes().await?;
        debug!("Exported {} bytes for {}s {:?}", bytes.len(), kind, ids);
        Ok(bytes.to_vec())
    }

    /// Import a dashboard bundle produced by [`Self::export_assets`].
    pub async fn import_dashboards(
        &self,
        file_name: &str,
        bundle: &[u8],
        overwrite: bool,
    ) -> Result<(), ApiError> {
        let url = endpoint(&self.base_url, DASHBOARD_IMPORT_PATH)?;

        // Multipart forms are consumed on send; the retry needs a fresh one.
        let build = || {
            let part = reqwest::multipart::Part::bytes(bundle.to_vec())
                .file_name(file_name.to_string())
                .mime_str(mime::APPLICATION_OCTET_STREAM.as_ref())?;
            let form = reqwest::multipart::Form::new()
                .part("formData", part)
                .text("overwrite", overwrite.to_string());
            Ok(self.http.post(url.clone()).multipart(form))
        };

        self.execute(Method::POST, &url, build).await?;
        debug!("Imported {} into {}", file_name, self.base_url);
        Ok(())
    }
}
