//! Unpaced HTTP client for asset bodies.

use futures_util::StreamExt;
use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use super::error::DownloadError;
use crate::http_client::{HttpTimeouts, build_client};
use crate::sink::ByteStream;

/// Streams asset bodies from the audio host.
///
/// Separate from the metadata client: no pacing, no retry. Cloning is cheap
/// and shares the connection pool.
#[derive(Debug, Clone)]
pub struct AssetClient {
    client: Client,
}

impl AssetClient {
    /// Creates a client with the given timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::ClientBuild`] if the HTTP client fails to build.
    pub fn new(timeouts: HttpTimeouts) -> Result<Self, DownloadError> {
        let client = build_client(timeouts).map_err(|source| DownloadError::ClientBuild { source })?;
        Ok(Self { client })
    }

    /// Starts a GET for `url` and returns its body as a byte stream.
    ///
    /// The status is checked before any body is read; failures later in the
    /// transfer surface as stream items.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] for a malformed URL, a transport failure or
    /// timeout, or a non-success status.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch_stream(&self, url: &str) -> Result<ByteStream, DownloadError> {
        let parsed = Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(DownloadError::invalid_url(url));
        }

        let response = self.client.get(parsed).send().await.map_err(|e| {
            if e.is_timeout() {
                DownloadError::timeout(url)
            } else {
                DownloadError::network(url, e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url, status.as_u16()));
        }

        debug!(content_length = response.content_length(), "streaming asset body");
        Ok(Box::pin(
            response.bytes_stream().map(|chunk| chunk.map_err(std::io::Error::other)),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_stream_rejects_relative_url() {
        let client = AssetClient::new(HttpTimeouts::default()).unwrap();
        let result = client.fetch_stream("/relative/a1.mp3").await;
        assert!(matches!(result, Err(DownloadError::InvalidUrl { .. })));
    }

    #[tokio::test]
    async fn test_fetch_stream_rejects_non_http_scheme() {
        let client = AssetClient::new(HttpTimeouts::default()).unwrap();
        let result = client.fetch_stream("file:///etc/passwd").await;
        assert!(matches!(result, Err(DownloadError::InvalidUrl { .. })));
    }
}
