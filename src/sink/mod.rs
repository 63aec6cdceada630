//! Destination sinks for the mirror.
//!
//! A [`Sink`] stores blobs under `/`-separated relative keys. The pipeline
//! only talks to `dyn Sink`, so local output and the content repository
//! share one code path.
//!
//! - [`LocalSink`] - files under a root directory, written via temp-then-rename
//! - [`RepoSink`] - entries in a content repository, one request per write

mod error;
mod local;
mod repo;

pub use error::SinkError;
pub use local::LocalSink;
pub use repo::{
    DEFAULT_REPO_API_BASE, MAX_REMOTE_PAYLOAD_BYTES, RepoSink, RepoSinkConfig, RepositoryStatus,
};

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use serde::Serialize;

/// Body chunks flowing from a fetch into a sink.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Whether a write created a new entry or replaced one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Nothing existed at the key before.
    Created,
    /// An existing entry was replaced.
    Updated,
}

/// Storage for mirror output.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Short human-readable description (root directory, repository name).
    fn describe(&self) -> String;

    /// True when an entry exists at `key`.
    async fn exists(&self, key: &str) -> Result<bool, SinkError>;

    /// Writes `content` at `key` in one step.
    async fn write(&self, key: &str, content: &[u8]) -> Result<WriteOutcome, SinkError>;

    /// Writes a streamed body at `key`.
    ///
    /// The default buffers the stream and calls [`write`](Self::write); sinks
    /// that can stream to storage override it. Either way nothing is visible at
    /// `key` unless the whole stream succeeded.
    async fn write_stream(&self, key: &str, mut stream: ByteStream) -> Result<WriteOutcome, SinkError> {
        let mut buffer = Vec::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|source| SinkError::stream(key, source))?;
            buffer.extend_from_slice(&chunk);
        }
        self.write(key, &buffer).await
    }
}

/// Serializes `document` as pretty JSON and writes it at `key`.
///
/// # Errors
///
/// Returns [`SinkError::Serialize`] or whatever the sink's write returns.
pub async fn write_json<T>(sink: &dyn Sink, key: &str, document: &T) -> Result<WriteOutcome, SinkError>
where
    T: Serialize + Sync + ?Sized,
{
    let mut body =
        serde_json::to_vec_pretty(document).map_err(|source| SinkError::serialize(key, source))?;
    body.push(b'\n');
    sink.write(key, &body).await
}

/// Checks that `key` is a relative path without empty, `.` or `..` segments.
///
/// # Errors
///
/// Returns [`SinkError::InvalidKey`] describing the first problem found.
pub fn validate_key(key: &str) -> Result<(), SinkError> {
    if key.is_empty() {
        return Err(SinkError::invalid_key(key, "key is empty"));
    }
    if key.starts_with('/') {
        return Err(SinkError::invalid_key(key, "key must be relative"));
    }
    if key.contains('\\') {
        return Err(SinkError::invalid_key(key, "backslashes are not allowed"));
    }
    for segment in key.split('/') {
        match segment {
            "" => return Err(SinkError::invalid_key(key, "empty path segment")),
            "." | ".." => {
                return Err(SinkError::invalid_key(key, "relative path segments are not allowed"));
            }
            _ => {}
        }
    }
    Ok(())
}
