use crate::error::FeedError;
use crate::feeds::traits::FeedSource;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// Plain HTTP GET feed client
pub struct HttpFeedClient {
    client: Client,
}

impl HttpFeedClient {
    /// Create a client whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("rental-sync/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl FeedSource for HttpFeedClient {
    async fn fetch(&self, url: &str) -> Result<String, FeedError> {
        debug!("Fetching feed: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FeedError::fetch(url, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!("Feed {} returned status: {}", url, status);
            return Err(FeedError::fetch(url, format!("HTTP status {}", status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FeedError::fetch(url, format!("failed to read body: {}", e)))?;

        debug!("Downloaded {} bytes from {}", body.len(), url);
        Ok(body)
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}
