//! Error types for the metadata API client.

use thiserror::Error;

/// Errors returned by [`ApiClient`](super::ApiClient).
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network-level failure (DNS, connection refused, TLS, body read).
    #[error("network error requesting {url}: {source}")]
    Network {
        /// Requested URL.
        url: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// Request did not finish within the configured timeout.
    #[error("timeout requesting {url}")]
    Timeout {
        /// Requested URL.
        url: String,
    },

    /// Remote answered with a non-2xx status.
    #[error("HTTP {status} requesting {url}")]
    HttpStatus {
        /// Requested URL.
        url: String,
        /// Response status code.
        status: u16,
    },

    /// Body was not the JSON document we expected.
    #[error("invalid JSON from {url}: {source}")]
    Decode {
        /// Requested URL.
        url: String,
        /// Parse failure.
        #[source]
        source: serde_json::Error,
    },

    /// Endpoint or base URL could not be turned into a valid URL.
    #[error("invalid API URL: {url}")]
    InvalidUrl {
        /// The rejected URL text.
        url: String,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {source}")]
    ClientBuild {
        /// Builder error.
        #[source]
        source: reqwest::Error,
    },

    /// All attempts failed; carries the last failure.
    #[error("{url} failed after {attempts} attempt(s): {last}")]
    Exhausted {
        /// Requested URL.
        url: String,
        /// Number of attempts made.
        attempts: u32,
        /// Failure of the final attempt.
        #[source]
        last: Box<ApiError>,
    },
}

impl ApiError {
    /// Creates a network error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a decode error.
    pub fn decode(url: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Decode {
            url: url.into(),
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Wraps the last failure once retries are used up.
    pub fn exhausted(url: impl Into<String>, attempts: u32, last: ApiError) -> Self {
        Self::Exhausted {
            url: url.into(),
            attempts,
            last: Box::new(last),
        }
    }

    /// HTTP status of the (last) failure, when there was one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            Self::Exhausted { last, .. } => last.status(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_display() {
        let error = ApiError::http_status("https://api.example.com/x", 503);
        let msg = error.to_string();
        assert!(msg.contains("503"), "Expected status in: {msg}");
        assert!(msg.contains("https://api.example.com/x"));
    }

    #[test]
    fn test_exhausted_keeps_last_status() {
        let error = ApiError::exhausted(
            "https://api.example.com/x",
            3,
            ApiError::http_status("https://api.example.com/x", 500),
        );
        assert_eq!(error.status(), Some(500));
        assert!(error.to_string().contains("3 attempt(s)"));
    }

    #[test]
    fn test_timeout_has_no_status() {
        assert_eq!(ApiError::timeout("https://api.example.com/x").status(), None);
    }
}
