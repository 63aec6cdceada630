//! Download tasks and the entity-scoped batch they are collected into.

use std::collections::HashMap;

use tracing::debug;

/// One asset to materialize: fetch `source_url`, store at `destination_key`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DownloadTask {
    /// Absolute asset URL.
    pub source_url: String,
    /// Sink key of the materialized asset.
    pub destination_key: String,
}

impl DownloadTask {
    /// Creates a task.
    pub fn new(source_url: impl Into<String>, destination_key: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            destination_key: destination_key.into(),
        }
    }
}

/// Tasks for one reciter, deduplicated by destination key.
///
/// A later task for an already-queued key replaces the earlier source URL but
/// keeps the key's original queue position. A batch is consumed by a single
/// dispatch and never shared between entities.
#[derive(Debug, Default)]
pub struct TaskBatch {
    order: Vec<String>,
    sources: HashMap<String, String>,
    replaced: usize,
}

impl TaskBatch {
    /// Creates an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `task`, collapsing it onto any earlier task with the same destination.
    pub fn push(&mut self, task: DownloadTask) {
        let DownloadTask {
            source_url,
            destination_key,
        } = task;

        match self.sources.get_mut(&destination_key) {
            Some(existing) => {
                if *existing != source_url {
                    debug!(
                        destination = %destination_key,
                        previous = %existing,
                        replacement = %source_url,
                        "destination queued twice with different sources, keeping the later one"
                    );
                }
                *existing = source_url;
                self.replaced += 1;
            }
            None => {
                self.order.push(destination_key.clone());
                self.sources.insert(destination_key, source_url);
            }
        }
    }

    /// Number of distinct destinations queued.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True when nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Number of pushes that collapsed onto an existing destination.
    #[must_use]
    pub fn collapsed(&self) -> usize {
        self.replaced
    }

    /// Consumes the batch, yielding tasks in first-queued order.
    #[must_use]
    pub fn into_tasks(mut self) -> Vec<DownloadTask> {
        self.order
            .into_iter()
            .filter_map(|key| {
                self.sources
                    .remove(&key)
                    .map(|source_url| DownloadTask::new(source_url, key))
            })
            .collect()
    }
}

impl Extend<DownloadTask> for TaskBatch {
    fn extend<I: IntoIterator<Item = DownloadTask>>(&mut self, iter: I) {
        for task in iter {
            self.push(task);
        }
    }
}

impl FromIterator<DownloadTask> for TaskBatch {
    fn from_iter<I: IntoIterator<Item = DownloadTask>>(iter: I) -> Self {
        let mut batch = Self::new();
        batch.extend(iter);
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_destination_collapses_to_last_source() {
        let batch: TaskBatch = [
            DownloadTask::new("https://a.example/x.mp3", "x/1.mp3"),
            DownloadTask::new("https://b.example/x.mp3", "x/1.mp3"),
        ]
        .into_iter()
        .collect();

        assert_eq!(batch.len(), 1);
        assert_eq!(batch.collapsed(), 1);
        assert_eq!(
            batch.into_tasks(),
            vec![DownloadTask::new("https://b.example/x.mp3", "x/1.mp3")]
        );
    }

    #[test]
    fn test_order_follows_first_insertion() {
        let mut batch = TaskBatch::new();
        batch.push(DownloadTask::new("u1", "a"));
        batch.push(DownloadTask::new("u2", "b"));
        batch.push(DownloadTask::new("u3", "a"));

        let keys: Vec<_> = batch
            .into_tasks()
            .into_iter()
            .map(|t| t.destination_key)
            .collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_empty_batch() {
        let batch = TaskBatch::new();
        assert!(batch.is_empty());
        assert!(batch.into_tasks().is_empty());
    }
}
