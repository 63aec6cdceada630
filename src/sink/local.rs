//! Local directory sink.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use rand::Rng;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, instrument};

use super::{ByteStream, Sink, SinkError, WriteOutcome, validate_key};

/// Writes mirror entries as files under a root directory.
///
/// Every write lands in a hidden temp file beside the destination and is
/// renamed into place only after the body is flushed and synced, so an
/// interrupted or failed transfer never leaves a partial file at the key.
#[derive(Debug, Clone)]
pub struct LocalSink {
    root: PathBuf,
}

impl LocalSink {
    /// Creates a sink rooted at `root`. The directory is created lazily.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of the mirror.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, SinkError> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl Sink for LocalSink {
    fn describe(&self) -> String {
        self.root.display().to_string()
    }

    async fn exists(&self, key: &str) -> Result<bool, SinkError> {
        let path = self.path_for(key)?;
        tokio::fs::try_exists(&path)
            .await
            .map_err(|e| SinkError::io(path, e))
    }

    async fn write(&self, key: &str, content: &[u8]) -> Result<WriteOutcome, SinkError> {
        let chunk: Result<Bytes, std::io::Error> = Ok(Bytes::copy_from_slice(content));
        self.write_stream(key, Box::pin(futures_util::stream::iter([chunk])))
            .await
    }

    #[instrument(skip(self, stream), fields(key = %key))]
    async fn write_stream(&self, key: &str, stream: ByteStream) -> Result<WriteOutcome, SinkError> {
        let path = self.path_for(key)?;
        let parent = path.parent().unwrap_or(self.root.as_path()).to_path_buf();
        tokio::fs::create_dir_all(&parent)
            .await
            .map_err(|e| SinkError::io(parent.clone(), e))?;

        let existed = tokio::fs::try_exists(&path).await.unwrap_or(false);
        let temp_path = temp_path_for(&path);

        if let Err(error) = stream_to_temp(&temp_path, stream, key).await {
            debug!(path = %temp_path.display(), "removing temp file after failed write");
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(error);
        }

        if let Err(error) = tokio::fs::rename(&temp_path, &path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(SinkError::io(path, error));
        }

        debug!(path = %path.display(), "entry written");
        Ok(if existed {
            WriteOutcome::Updated
        } else {
            WriteOutcome::Created
        })
    }
}

/// `.{name}.{random}.tmp` next to the destination.
fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map_or_else(|| "entry".to_string(), |n| n.to_string_lossy().into_owned());
    let nonce: u64 = rand::thread_rng().r#gen();
    path.with_file_name(format!(".{name}.{nonce:016x}.tmp"))
}

async fn stream_to_temp(temp_path: &Path, mut stream: ByteStream, key: &str) -> Result<(), SinkError> {
    let file = File::create(temp_path)
        .await
        .map_err(|e| SinkError::io(temp_path, e))?;
    let mut writer = BufWriter::new(file);

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| SinkError::stream(key, e))?;
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| SinkError::io(temp_path, e))?;
    }

    writer
        .flush()
        .await
        .map_err(|e| SinkError::io(temp_path, e))?;
    writer
        .into_inner()
        .sync_all()
        .await
        .map_err(|e| SinkError::io(temp_path, e))
}
