use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
pub trait Extractor: Send + Sync {
    /// Human-readable name of the extractor
    fn name(&self) -> &'static str;

    /// Fetch the raw metadata document for the given URL without downloading
    /// any media. Only the first item of a playlist URL is considered.
    async fn extract_info(&self, url: &str) -> Result<Value>;

    /// Test if this extractor is available on the system
    async fn test_availability(&self) -> bool;
}
