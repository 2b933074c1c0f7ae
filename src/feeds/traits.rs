use crate::error::FeedError;
use async_trait::async_trait;

/// Retrieves raw calendar text for a feed URL
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch the feed body
    async fn fetch(&self, url: &str) -> Result<String, FeedError>;

    /// Get the name of the feed source
    fn source_name(&self) -> &'static str;
}
