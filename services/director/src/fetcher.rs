//! Outbound tile requests.
//!
//! A [`TileFetcher`] turns a worker URL into a [`TileRequest`]: a future that
//! resolves to the raw response body. Issuing the request never blocks; the
//! orchestrator drives every outstanding request from its own poll loop.

use std::time::Duration;

use bytes::Bytes;
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Client;
use thiserror::Error;

/// Handle to one in-flight tile request.
///
/// Dropping the handle releases the underlying connection.
pub type TileRequest = BoxFuture<'static, Result<Bytes, TransportError>>;

/// Issues tile requests against worker services.
pub trait TileFetcher: Send + Sync {
    /// Start a GET request for `url`.
    ///
    /// Returns an error if the request cannot even be built (for example a
    /// malformed URL); such a tile never gets a handle.
    fn dispatch(&self, url: &str) -> Result<TileRequest, TransportError>;
}

/// Per-tile transport failures. These never reach the client.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    #[error("Cannot issue request to {url}: {reason}")]
    Dispatch { url: String, reason: String },

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Worker returned HTTP {0}")]
    Status(u16),
}

/// [`TileFetcher`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a fetcher whose requests give up after `request_timeout`.
    ///
    /// A timeout surfaces as a failed tile, like any other transport error.
    pub fn new(request_timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(Duration::from_secs(30))
            .tcp_nodelay(true)
            .build()?;

        Ok(Self { client })
    }
}

impl TileFetcher for HttpFetcher {
    fn dispatch(&self, url: &str) -> Result<TileRequest, TransportError> {
        let request = self
            .client
            .get(url)
            .build()
            .map_err(|e| TransportError::Dispatch {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        let client = self.client.clone();

        Ok(async move {
            let response = client
                .execute(request)
                .await
                .map_err(|e| TransportError::Request(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(TransportError::Status(status.as_u16()));
            }

            response
                .bytes()
                .await
                .map_err(|e| TransportError::Request(e.to_string()))
        }
        .boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_url_fails_at_dispatch() {
        let fetcher = HttpFetcher::new(Duration::from_secs(1)).unwrap();
        let result = fetcher.dispatch("not a url");
        assert!(matches!(result, Err(TransportError::Dispatch { .. })));
    }

    #[tokio::test]
    async fn test_unreachable_worker_is_request_error() {
        let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();
        // Port 9 (discard) on localhost is closed in test environments
        let request = fetcher.dispatch("http://127.0.0.1:9/4/4/-2/-1/1/1").unwrap();
        assert!(matches!(request.await, Err(TransportError::Request(_))));
    }
}
