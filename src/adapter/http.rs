//! HTTP client for the hosted data backend.
//!
//! One [`HttpBackend`] is built per pool slot. Each carries its own
//! `reqwest` connection pool, the normalized base URL and the credential
//! headers the backend expects on every request.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client as HttpClient, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::ManagerConfig;
use crate::error::{Error, Result};
use crate::manager::ConnectionManager;
use crate::pool::EntryId;
use crate::port::{BackendClient, ClientFactory};

/// Path probed by health checks.
const PROBE_PATH: &str = "rest/v1/";

/// Authenticated HTTP handle for the data backend.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    http: HttpClient,
    base_url: String,
    credential: String,
}

impl HttpBackend {
    /// Build a client for `config.endpoint`.
    ///
    /// The request timeout is the operation timeout, so a hung socket can
    /// never outlive the attempt that opened it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClientConstruction`] if the TLS backend cannot be
    /// initialized.
    pub fn new(config: &ManagerConfig) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(config.operation_timeout())
            .connect_timeout(config.operation_timeout())
            .build()
            .map_err(|e| Error::ClientConstruction(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.endpoint.trim_end_matches('/').to_owned(),
            credential: config.credential.clone(),
        })
    }

    /// Factory for [`ConnectionManager`], one client per pool entry.
    pub fn factory() -> ClientFactory<Self> {
        Arc::new(|config: &ManagerConfig, id: EntryId| {
            debug!(entry_id = id, endpoint = %config.endpoint, "Building HTTP client");
            Self::new(config)
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Start an authenticated request to `path`, relative to the base URL.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, self.url(path))
            .header("apikey", &self.credential)
            .bearer_auth(&self.credential)
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.request(Method::GET, path)
    }

    /// GET `path` and decode the JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on transport failures or non-2xx responses.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.get(path).send().await?.error_for_status()?;
        Ok(response.json::<T>().await?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl BackendClient for HttpBackend {
    async fn probe(&self) -> Result<()> {
        self.get(PROBE_PATH).send().await?.error_for_status()?;
        Ok(())
    }
}

impl ConnectionManager<HttpBackend> {
    /// Manager backed by real HTTP clients.
    pub fn http(config: ManagerConfig) -> Self {
        Self::new(config, HttpBackend::factory())
    }
}
