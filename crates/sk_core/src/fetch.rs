use async_trait::async_trait;
use crate::Result;

/// Retrieves the raw HTML of a page.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    fn name(&self) -> &str;

    /// Fetch `url` and return its HTML. Timeouts and navigation failures
    /// are reported as `Error::Fetch`.
    async fn fetch(&self, url: &str) -> Result<String>;
}
