use std::path::Path;
use std::time::Duration;

use anyhow::Context as _;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use url::Url;

use crate::error::{ServiceError, SourceError};
use crate::formats::ScrapeResultBundle;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Produces a fresh per-section result bundle on every call.
#[async_trait]
pub trait ConferenceSource: Send + Sync {
    async fn get_all_data(&self) -> Result<ScrapeResultBundle, SourceError>;
}

/// Fetches the bundle as JSON from a scraping service endpoint.
#[derive(Debug, Clone)]
pub struct HttpBundleSource {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpBundleSource {
    pub fn new(endpoint: Url) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("build scraping service http client")?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl ConferenceSource for HttpBundleSource {
    async fn get_all_data(&self) -> Result<ScrapeResultBundle, SourceError> {
        tracing::debug!(endpoint = %self.endpoint, "fetching scrape bundle");
        let response = self
            .client
            .get(self.endpoint.clone())
            .header(USER_AGENT, "apiconf-agent/0.1")
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(ServiceError::from)?;

        let status = response.status();
        let raw = response.text().await.map_err(ServiceError::from)?;
        if !status.is_success() {
            return Err(ServiceError::from_status(status, &raw).into());
        }

        let bundle: ScrapeResultBundle = serde_json::from_str(&raw)
            .map_err(|err| ServiceError::Malformed(err.to_string()))?;
        Ok(bundle)
    }
}

/// Serves a fixed bundle; used for offline runs against a saved bundle file.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    bundle: ScrapeResultBundle,
}

impl StaticSource {
    pub fn new(bundle: ScrapeResultBundle) -> Self {
        Self { bundle }
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("read bundle file: {}", path.display()))?;
        let bundle: ScrapeResultBundle = serde_json::from_str(&contents)
            .with_context(|| format!("parse bundle file: {}", path.display()))?;
        Ok(Self { bundle })
    }
}

#[async_trait]
impl ConferenceSource for StaticSource {
    async fn get_all_data(&self) -> Result<ScrapeResultBundle, SourceError> {
        Ok(self.bundle.clone())
    }
}
