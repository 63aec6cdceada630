//! Asset materializer: one remote asset into one sink entry, at most once.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use super::client::AssetClient;
use super::error::DownloadError;
use crate::sink::Sink;

/// Result of materializing one asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaterializeOutcome {
    /// Fetched and stored.
    Downloaded,
    /// Destination already existed; nothing was fetched.
    Skipped,
    /// Fetch or store failed; nothing was left at the destination.
    Failed {
        /// Rendered error.
        error: String,
    },
}

impl MaterializeOutcome {
    /// True for [`MaterializeOutcome::Failed`].
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Unit of work executed by the dispatcher's workers.
///
/// Never returns an error: any failure is folded into
/// [`MaterializeOutcome::Failed`] so one asset cannot affect its siblings.
#[async_trait]
pub trait Materialize: Send + Sync {
    /// Makes sure `destination_key` holds the body of `source_url`.
    async fn materialize(&self, source_url: &str, destination_key: &str) -> MaterializeOutcome;
}

/// Streams assets from the audio host into a [`Sink`].
#[derive(Clone)]
pub struct Materializer {
    client: AssetClient,
    sink: Arc<dyn Sink>,
}

impl std::fmt::Debug for Materializer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Materializer")
            .field("sink", &self.sink.describe())
            .finish_non_exhaustive()
    }
}

impl Materializer {
    /// Creates a materializer writing into `sink`.
    #[must_use]
    pub fn new(client: AssetClient, sink: Arc<dyn Sink>) -> Self {
        Self { client, sink }
    }

    async fn try_materialize(
        &self,
        source_url: &str,
        destination_key: &str,
    ) -> Result<MaterializeOutcome, DownloadError> {
        if self.sink.exists(destination_key).await? {
            debug!("destination exists, skipping fetch");
            return Ok(MaterializeOutcome::Skipped);
        }

        let body = self.client.fetch_stream(source_url).await?;
        self.sink.write_stream(destination_key, body).await?;
        Ok(MaterializeOutcome::Downloaded)
    }
}

#[async_trait]
impl Materialize for Materializer {
    #[instrument(skip(self), fields(source = %source_url, destination = %destination_key))]
    async fn materialize(&self, source_url: &str, destination_key: &str) -> MaterializeOutcome {
        match self.try_materialize(source_url, destination_key).await {
            Ok(outcome) => outcome,
            Err(error) => {
                warn!(error = %error, "asset failed");
                MaterializeOutcome::Failed {
                    error: error.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_failed_is_failure() {
        assert!(!MaterializeOutcome::Downloaded.is_failure());
        assert!(!MaterializeOutcome::Skipped.is_failure());
        assert!(
            MaterializeOutcome::Failed {
                error: "HTTP 500".to_string()
            }
            .is_failure()
        );
    }
}
