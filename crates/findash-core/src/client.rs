//! Ingestion backend client
//!
//! The ingestion backend parses uploaded CSVs, categorizes transactions and
//! computes the baseline stats. FinDash only talks to it through
//! [`IngestionApi`]:
//!
//! - `GET  {base}/stats` -> [`StatsSnapshot`]
//! - `GET  {base}/transactions?skip=&limit=` -> `Vec<Transaction>`
//! - `POST {base}/upload` (multipart, field `file`) -> [`IngestionResult`]
//!
//! Calls are single requests: no retry, no cancellation.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{multipart, Client, Response};
use tracing::{debug, warn};

use crate::config::BackendConfig;
use crate::error::{Error, Result};
use crate::models::{IngestionResult, StatsSnapshot, Transaction, UploadFile};
use crate::sequence::{RequestSequencer, RequestTag};

/// Operations offered by the ingestion backend
#[async_trait]
pub trait IngestionApi: Send + Sync {
    async fn stats(&self) -> Result<StatsSnapshot>;

    async fn transactions(&self, skip: i64, limit: i64) -> Result<Vec<Transaction>>;

    /// Submit a file that already passed upload validation
    async fn upload(&self, file: UploadFile) -> Result<IngestionResult>;
}

/// reqwest-backed [`IngestionApi`]
#[derive(Clone)]
pub struct HttpIngestionClient {
    http_client: Client,
    base_url: String,
}

impl HttpIngestionClient {
    pub fn new(base_url: &str, timeout: std::time::Duration) -> Result<Self> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &BackendConfig) -> Result<Self> {
        Self::new(&config.url, config.timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Turn a non-2xx response into [`Error::Backend`]
    async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), body = %body, "Ingestion backend error");
        Err(Error::Backend {
            status: status.as_u16(),
            message: if body.is_empty() {
                status.canonical_reason().unwrap_or("error").to_string()
            } else {
                body
            },
        })
    }
}

#[async_trait]
impl IngestionApi for HttpIngestionClient {
    async fn stats(&self) -> Result<StatsSnapshot> {
        debug!(url = %self.url("stats"), "Fetching stats");
        let response = self.http_client.get(self.url("stats")).send().await?;
        let response = Self::check_status(response).await?;
        Ok(response.json().await?)
    }

    async fn transactions(&self, skip: i64, limit: i64) -> Result<Vec<Transaction>> {
        debug!(skip, limit, "Fetching transactions");
        let response = self
            .http_client
            .get(self.url("transactions"))
            .query(&[("skip", skip), ("limit", limit)])
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        Ok(response.json().await?)
    }

    async fn upload(&self, file: UploadFile) -> Result<IngestionResult> {
        debug!(name = %file.name, size = file.bytes.len(), "Uploading file");
        let part = multipart::Part::bytes(file.bytes)
            .file_name(file.name)
            .mime_str(&file.media_type)?;
        let form = multipart::Form::new().part("file", part);

        let response = self
            .http_client
            .post(self.url("upload"))
            .multipart(form)
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        Ok(response.json().await?)
    }
}

/// Stats feed that drops responses superseded by a newer request
pub struct DashboardFeed {
    api: Arc<dyn IngestionApi>,
    sequencer: RequestSequencer,
}

impl DashboardFeed {
    pub fn new(api: Arc<dyn IngestionApi>) -> Self {
        Self {
            api,
            sequencer: RequestSequencer::new(),
        }
    }

    pub fn api(&self) -> &Arc<dyn IngestionApi> {
        &self.api
    }

    /// Fetch stats, returning the tag the request went out under
    pub async fn fetch_stats(&self) -> (RequestTag, Result<StatsSnapshot>) {
        let tag = self.sequencer.issue();
        let result = self.api.stats().await;
        (tag, result)
    }

    pub fn is_latest(&self, tag: RequestTag) -> bool {
        self.sequencer.is_latest(tag)
    }

    /// Fetch stats; `Ok(None)` when a newer request was issued meanwhile
    pub async fn latest_stats(&self) -> Result<Option<StatsSnapshot>> {
        let (tag, result) = self.fetch_stats().await;
        if !self.is_latest(tag) {
            debug!(request = tag.value(), "Discarding superseded stats response");
            return Ok(None);
        }
        result.map(Some)
    }
}
