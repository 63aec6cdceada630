//! Error types for asset transfers.

use thiserror::Error;

use crate::sink::SinkError;

/// Errors that can occur while materializing one asset.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The URL that failed to download.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout downloading {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Asset host answered with a non-success status.
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The provided URL is malformed or invalid.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// The asset client could not be constructed.
    #[error("failed to build asset client: {source}")]
    ClientBuild {
        /// Builder error.
        #[source]
        source: reqwest::Error,
    },

    /// Storing the asset failed.
    #[error(transparent)]
    Sink(#[from] SinkError),
}

impl DownloadError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_display() {
        let msg = DownloadError::http_status("https://audio.example/a.mp3", 404).to_string();
        assert!(msg.contains("404"));
        assert!(msg.contains("https://audio.example/a.mp3"));
    }

    #[test]
    fn test_sink_error_is_transparent() {
        let error: DownloadError = SinkError::invalid_key("/abs", "key must be relative").into();
        assert!(error.to_string().starts_with("invalid destination key"));
    }
}
