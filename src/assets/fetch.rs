//! Remote transport for manifests and client archives.

use crate::error::{Error, Result};
use futures::future::{BoxFuture, FutureExt};
use std::time::Duration;

/// Fetches a URL and returns the response body.
///
/// The asset cache only needs this one operation, which keeps it testable
/// without a network.
pub trait Fetcher: Send + Sync {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>>>;
}

/// HTTP(S) fetcher backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>>> {
        async move {
            tracing::debug!(url, "fetching");
            let response = self
                .client
                .get(url)
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|e| Error::DownloadFailed {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?;
            let body = response.bytes().await?;
            tracing::debug!(url, bytes = body.len(), "fetched");
            Ok(body.to_vec())
        }
        .boxed()
    }
}
