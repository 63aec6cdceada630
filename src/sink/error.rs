//! Error types for destination sinks.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading or writing a sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Key is not a safe relative path.
    #[error("invalid destination key '{key}': {reason}")]
    InvalidKey {
        /// The rejected key.
        key: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Local filesystem failure.
    #[error("IO error at {path}: {source}")]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The incoming byte stream failed before completion.
    #[error("source stream for {key} failed: {source}")]
    Stream {
        /// Destination key being written.
        key: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Document could not be serialized.
    #[error("failed to serialize {key}: {source}")]
    Serialize {
        /// Destination key.
        key: String,
        /// Serializer error.
        #[source]
        source: serde_json::Error,
    },

    /// Request to the content repository failed at the transport level.
    #[error("request to {url} failed: {source}")]
    Request {
        /// Requested URL.
        url: String,
        /// Transport error.
        #[source]
        source: reqwest::Error,
    },

    /// Content repository answered with an unexpected status.
    #[error("HTTP {status} from {url}: {message}")]
    HttpStatus {
        /// Requested URL.
        url: String,
        /// Status code.
        status: u16,
        /// Response body excerpt.
        message: String,
    },

    /// Content repository answered with an unreadable body.
    #[error("unexpected response from {url}: {source}")]
    Decode {
        /// Requested URL.
        url: String,
        /// Parse failure.
        #[source]
        source: serde_json::Error,
    },

    /// Revision changed between read and write twice in a row.
    #[error("write conflict on {key} persisted after re-reading the revision")]
    Conflict {
        /// Destination key.
        key: String,
    },

    /// Payload exceeds the content repository's single-request limit.
    #[error("{key} is {size} bytes, above the {limit} byte limit for a single write")]
    PayloadTooLarge {
        /// Destination key.
        key: String,
        /// Payload size.
        size: usize,
        /// Configured limit.
        limit: usize,
    },

    /// Sink could not be configured.
    #[error("invalid sink configuration: {0}")]
    Config(String),
}

impl SinkError {
    /// Creates an invalid key error.
    pub fn invalid_key(key: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidKey {
            key: key.into(),
            reason,
        }
    }

    /// Creates a local IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a stream error.
    pub fn stream(key: impl Into<String>, source: std::io::Error) -> Self {
        Self::Stream {
            key: key.into(),
            source,
        }
    }

    /// Creates a serialization error.
    pub fn serialize(key: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialize {
            key: key.into(),
            source,
        }
    }

    /// Creates a transport error.
    pub fn request(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Request {
            url: url.into(),
            source,
        }
    }

    /// Creates an unexpected status error.
    pub fn http_status(url: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_too_large_display() {
        let error = SinkError::PayloadTooLarge {
            key: "reciters/1/chapters/2.mp3".to_string(),
            size: 200,
            limit: 100,
        };
        let msg = error.to_string();
        assert!(msg.contains("reciters/1/chapters/2.mp3"));
        assert!(msg.contains("200"));
    }

    #[test]
    fn test_invalid_key_display() {
        let msg = SinkError::invalid_key("../x", "parent segments are not allowed").to_string();
        assert!(msg.contains("../x"), "Expected key in: {msg}");
    }
}
