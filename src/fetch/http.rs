//! HTTP fetcher backed by a shared reqwest client

use async_trait::async_trait;
use std::time::Duration;

use super::traits::Fetcher;
use crate::config::FetchConfig;
use crate::error::{Error, FetchError, Result};

/// Fetches over HTTP(S) with a per-request timeout
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpFetcher {
    /// Build a fetcher from the fetch settings
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                Error::Io(std::io::Error::other(format!(
                    "failed to create HTTP client: {}",
                    e
                )))
            })?;

        Ok(Self {
            client,
            timeout: config.timeout,
        })
    }

    async fn get(&self, url: &str) -> std::result::Result<reqwest::Response, FetchError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                    secs: self.timeout.as_secs(),
                }
            } else {
                FetchError::Request {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> std::result::Result<Vec<u8>, FetchError> {
        let response = self.get(url).await?;

        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                    secs: self.timeout.as_secs(),
                }
            } else {
                FetchError::Body {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        Ok(body.to_vec())
    }

    async fn probe(&self, url: &str) -> std::result::Result<(), FetchError> {
        // body is dropped unread
        self.get(url).await.map(|_| ())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
