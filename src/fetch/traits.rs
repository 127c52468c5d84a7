//! The injected fetch capability

use async_trait::async_trait;

use crate::error::FetchError;

/// Fetches remote file content by URL
///
/// Implementations must be cheap to share across requests; the service holds
/// one behind an `Arc` for its whole lifetime.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the full body of `url`
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] when the request cannot be made, times out,
    /// answers with a non-success status, or the body cannot be read.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;

    /// Check that `url` is reachable without keeping its content
    async fn probe(&self, url: &str) -> Result<(), FetchError> {
        self.fetch(url).await.map(|_| ())
    }

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
