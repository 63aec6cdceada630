//! Bounded worker pool draining one reciter's [`TaskBatch`].
//!
//! A dispatcher spawns at most `concurrency` workers per run. Workers pull
//! tasks from a shared queue until it is empty or the interrupt flag is set,
//! so in-flight transfers always finish while no new ones start after an
//! interrupt.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use mirror_core::download::{
//!     AssetClient, Dispatcher, DownloadTask, Materializer, TaskBatch,
//! };
//! use mirror_core::sink::LocalSink;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let sink = Arc::new(LocalSink::new("./quran-audio-api"));
//! let client = AssetClient::new(Default::default())?;
//! let materializer = Arc::new(Materializer::new(client, sink));
//!
//! let mut batch = TaskBatch::new();
//! batch.push(DownloadTask::new("https://audio.example/1.mp3", "reciters/1/verses/ayah/1_1.mp3"));
//!
//! let report = Dispatcher::new(5)?.run(batch, materializer, "Reciter 1").await;
//! println!("downloaded {}, failed {}", report.downloaded, report.failed);
//! # Ok(())
//! # }
//! ```

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info, instrument, warn};

use super::materializer::{Materialize, MaterializeOutcome};
use super::task::{DownloadTask, TaskBatch};

/// Minimum allowed concurrency value.
pub const MIN_CONCURRENCY: usize = 1;

/// Maximum allowed concurrency value.
pub const MAX_CONCURRENCY: usize = 100;

/// Default concurrency if not specified.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Error type for dispatcher construction.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Invalid concurrency value provided.
    #[error(
        "invalid concurrency value {value}: must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}"
    )]
    InvalidConcurrency {
        /// The invalid value that was provided.
        value: usize,
    },
}

/// Live counters for the batch currently being dispatched.
///
/// Shared with the progress display; reset at the start of every run.
#[derive(Debug, Default)]
pub struct DispatchProgress {
    total: AtomicUsize,
    downloaded: AtomicUsize,
    skipped: AtomicUsize,
    failed: AtomicUsize,
    description: Mutex<String>,
}

impl DispatchProgress {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn begin(&self, total: usize, description: &str) {
        self.total.store(total, Ordering::SeqCst);
        self.downloaded.store(0, Ordering::SeqCst);
        self.skipped.store(0, Ordering::SeqCst);
        self.failed.store(0, Ordering::SeqCst);
        description.clone_into(&mut self.description.lock().unwrap_or_else(PoisonError::into_inner));
    }

    fn record(&self, outcome: &MaterializeOutcome) {
        let counter = match outcome {
            MaterializeOutcome::Downloaded => &self.downloaded,
            MaterializeOutcome::Skipped => &self.skipped,
            MaterializeOutcome::Failed { .. } => &self.failed,
        };
        counter.fetch_add(1, Ordering::SeqCst);
    }

    /// Tasks in the current batch.
    #[must_use]
    pub fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    /// Tasks finished in any way.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.downloaded() + self.skipped() + self.failed()
    }

    /// Tasks that fetched and stored an asset.
    #[must_use]
    pub fn downloaded(&self) -> usize {
        self.downloaded.load(Ordering::SeqCst)
    }

    /// Tasks whose destination already existed.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped.load(Ordering::SeqCst)
    }

    /// Tasks that failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    /// Label of the current batch.
    #[must_use]
    pub fn description(&self) -> String {
        self.description
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Outcome of one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutcome {
    /// The task that ran.
    pub task: DownloadTask,
    /// What happened.
    pub outcome: MaterializeOutcome,
}

/// Aggregate result of one dispatch run.
#[derive(Debug, Clone, Default)]
pub struct DispatchReport {
    /// Batch label.
    pub description: String,
    /// Distinct tasks in the batch.
    pub total: usize,
    /// Fetched and stored.
    pub downloaded: usize,
    /// Already present.
    pub skipped: usize,
    /// Failed.
    pub failed: usize,
    /// True when an interrupt stopped the run before the queue drained.
    pub interrupted: bool,
    /// Per-task outcomes in completion order.
    pub outcomes: Vec<TaskOutcome>,
}

impl DispatchReport {
    fn empty(description: &str) -> Self {
        Self {
            description: description.to_string(),
            ..Self::default()
        }
    }

    /// Tasks that never started.
    #[must_use]
    pub fn not_started(&self) -> usize {
        self.total
            .saturating_sub(self.downloaded + self.skipped + self.failed)
    }

    /// Tasks that failed.
    pub fn failed_tasks(&self) -> impl Iterator<Item = &DownloadTask> + '_ {
        self.outcomes
            .iter()
            .filter(|o| o.outcome.is_failure())
            .map(|o| &o.task)
    }
}

/// Runs task batches on a bounded pool of workers.
#[derive(Debug)]
pub struct Dispatcher {
    concurrency: usize,
    interrupted: Arc<AtomicBool>,
    progress: Arc<DispatchProgress>,
}

impl Dispatcher {
    /// Creates a dispatcher with `concurrency` workers per run.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidConcurrency`] if the value is outside
    /// the valid range (1-100).
    #[instrument(level = "debug")]
    pub fn new(concurrency: usize) -> Result<Self, DispatchError> {
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&concurrency) {
            return Err(DispatchError::InvalidConcurrency { value: concurrency });
        }
        Ok(Self {
            concurrency,
            interrupted: Arc::new(AtomicBool::new(false)),
            progress: Arc::new(DispatchProgress::new()),
        })
    }

    /// Shares an interrupt flag; once set, workers stop taking new tasks.
    #[must_use]
    pub fn with_interrupt_flag(mut self, interrupted: Arc<AtomicBool>) -> Self {
        self.interrupted = interrupted;
        self
    }

    /// Shares progress counters with an observer.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<DispatchProgress>) -> Self {
        self.progress = progress;
        self
    }

    /// Returns the configured concurrency limit.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Resets progress to an empty batch labelled `description`, for the
    /// document phase that precedes a dispatch.
    pub fn announce(&self, description: &str) {
        self.progress.begin(0, description);
    }

    /// Drains `batch` through `materializer`.
    ///
    /// Individual task failures never fail the run; they are counted and
    /// listed in the report. An empty batch returns immediately.
    #[instrument(skip(self, batch, materializer), fields(tasks = batch.len()))]
    pub async fn run(
        &self,
        batch: TaskBatch,
        materializer: Arc<dyn Materialize>,
        description: &str,
    ) -> DispatchReport {
        let tasks = batch.into_tasks();
        let total = tasks.len();
        self.progress.begin(total, description);

        if total == 0 {
            debug!("empty batch, nothing to dispatch");
            return DispatchReport::empty(description);
        }

        let queue = Arc::new(Mutex::new(VecDeque::from(tasks)));
        let workers = self.concurrency.min(total);
        debug!(workers, total, "starting dispatch");

        let handles: Vec<_> = (0..workers)
            .map(|worker_id| {
                tokio::spawn(worker_loop(
                    worker_id,
                    Arc::clone(&queue),
                    Arc::clone(&materializer),
                    Arc::clone(&self.progress),
                    Arc::clone(&self.interrupted),
                ))
            })
            .collect();

        let mut outcomes = Vec::with_capacity(total);
        for handle in handles {
            match handle.await {
                Ok(mut finished) => outcomes.append(&mut finished),
                // Ignore JoinError - a panicked worker only loses its own tasks
                Err(e) => warn!(error = %e, "dispatch worker panicked"),
            }
        }

        let mut report = DispatchReport::empty(description);
        report.total = total;
        for entry in &outcomes {
            match entry.outcome {
                MaterializeOutcome::Downloaded => report.downloaded += 1,
                MaterializeOutcome::Skipped => report.skipped += 1,
                MaterializeOutcome::Failed { .. } => report.failed += 1,
            }
        }
        report.outcomes = outcomes;
        report.interrupted = self.interrupted.load(Ordering::SeqCst) && report.not_started() > 0;

        info!(
            description,
            total,
            downloaded = report.downloaded,
            skipped = report.skipped,
            failed = report.failed,
            interrupted = report.interrupted,
            "dispatch complete"
        );
        report
    }
}

async fn worker_loop(
    worker_id: usize,
    queue: Arc<Mutex<VecDeque<DownloadTask>>>,
    materializer: Arc<dyn Materialize>,
    progress: Arc<DispatchProgress>,
    interrupted: Arc<AtomicBool>,
) -> Vec<TaskOutcome> {
    let mut finished = Vec::new();
    loop {
        if interrupted.load(Ordering::SeqCst) {
            debug!(worker_id, "interrupt requested, worker stopping");
            break;
        }
        let next = queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        let Some(task) = next else {
            break;
        };

        let outcome = materializer
            .materialize(&task.source_url, &task.destination_key)
            .await;
        progress.record(&outcome);
        finished.push(TaskOutcome { task, outcome });
    }
    finished
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;

    /// Records every call and fails sources containing "fail".
    #[derive(Default)]
    struct RecordingMaterializer {
        calls: Mutex<Vec<(String, String)>>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        delay: Duration,
    }

    #[async_trait]
    impl Materialize for RecordingMaterializer {
        async fn materialize(&self, source_url: &str, destination_key: &str) -> MaterializeOutcome {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.calls
                .lock()
                .unwrap()
                .push((source_url.to_string(), destination_key.to_string()));
            if source_url.contains("fail") {
                MaterializeOutcome::Failed {
                    error: "HTTP 500".to_string(),
                }
            } else if source_url.contains("have") {
                MaterializeOutcome::Skipped
            } else {
                MaterializeOutcome::Downloaded
            }
        }
    }

    fn batch_of(pairs: &[(&str, &str)]) -> TaskBatch {
        pairs
            .iter()
            .map(|(url, key)| DownloadTask::new(*url, *key))
            .collect()
    }

    #[test]
    fn test_dispatcher_new_valid_concurrency() {
        assert_eq!(Dispatcher::new(1).unwrap().concurrency(), 1);
        assert_eq!(Dispatcher::new(100).unwrap().concurrency(), 100);
    }

    #[test]
    fn test_dispatcher_new_invalid_concurrency() {
        assert!(matches!(
            Dispatcher::new(0),
            Err(DispatchError::InvalidConcurrency { value: 0 })
        ));
        assert!(matches!(
            Dispatcher::new(101),
            Err(DispatchError::InvalidConcurrency { value: 101 })
        ));
    }

    #[test]
    fn test_dispatch_error_display() {
        let msg = DispatchError::InvalidConcurrency { value: 0 }.to_string();
        assert!(msg.contains("invalid concurrency"));
        assert!(msg.contains("100"));
    }

    #[tokio::test]
    async fn test_duplicate_destination_materialized_once() {
        let fake = Arc::new(RecordingMaterializer::default());
        let batch = batch_of(&[("urlA", "x/1.mp3"), ("urlB", "x/1.mp3")]);

        let report = Dispatcher::new(4)
            .unwrap()
            .run(batch, fake.clone(), "dedup")
            .await;

        assert_eq!(report.total, 1);
        let calls = fake.calls.lock().unwrap().clone();
        assert_eq!(calls, vec![("urlB".to_string(), "x/1.mp3".to_string())]);
    }

    #[tokio::test]
    async fn test_counts_by_outcome() {
        let fake = Arc::new(RecordingMaterializer::default());
        let batch = batch_of(&[
            ("https://a/ok1", "a/1"),
            ("https://a/ok2", "a/2"),
            ("https://a/have", "a/3"),
            ("https://a/fail", "a/4"),
        ]);

        let report = Dispatcher::new(2)
            .unwrap()
            .run(batch, fake, "counts")
            .await;

        assert_eq!(report.total, 4);
        assert_eq!(report.downloaded, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.not_started(), 0);
        assert!(!report.interrupted);
        let failed: Vec<_> = report.failed_tasks().map(|t| t.destination_key.as_str()).collect();
        assert_eq!(failed, vec!["a/4"]);
    }

    #[tokio::test]
    async fn test_empty_batch_is_noop() {
        let fake = Arc::new(RecordingMaterializer::default());
        let report = Dispatcher::new(5)
            .unwrap()
            .run(TaskBatch::new(), fake.clone(), "empty")
            .await;
        assert_eq!(report.total, 0);
        assert!(report.outcomes.is_empty());
        assert!(fake.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let fake = Arc::new(RecordingMaterializer {
            delay: Duration::from_millis(20),
            ..RecordingMaterializer::default()
        });
        let pairs: Vec<(String, String)> = (0..12)
            .map(|i| (format!("https://a/{i}"), format!("k/{i}")))
            .collect();
        let batch: TaskBatch = pairs
            .iter()
            .map(|(u, k)| DownloadTask::new(u.as_str(), k.as_str()))
            .collect();

        let report = Dispatcher::new(3).unwrap().run(batch, fake.clone(), "bounded").await;

        assert_eq!(report.downloaded, 12);
        assert!(fake.peak.load(Ordering::SeqCst) <= 3);
        let distinct: HashMap<_, _> = fake.calls.lock().unwrap().iter().cloned().collect();
        assert_eq!(distinct.len(), 12);
    }

    #[tokio::test]
    async fn test_interrupt_before_run_starts_nothing() {
        let fake = Arc::new(RecordingMaterializer::default());
        let flag = Arc::new(AtomicBool::new(true));
        let batch = batch_of(&[("u1", "k1"), ("u2", "k2")]);

        let report = Dispatcher::new(2)
            .unwrap()
            .with_interrupt_flag(flag)
            .run(batch, fake.clone(), "interrupted")
            .await;

        assert!(report.interrupted);
        assert_eq!(report.not_started(), 2);
        assert!(fake.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_progress_reflects_last_run() {
        let fake = Arc::new(RecordingMaterializer::default());
        let progress = Arc::new(DispatchProgress::new());
        let dispatcher = Dispatcher::new(2)
            .unwrap()
            .with_progress(Arc::clone(&progress));

        dispatcher
            .run(batch_of(&[("u1", "k1"), ("fail", "k2")]), fake, "Reciter 7")
            .await;

        assert_eq!(progress.total(), 2);
        assert_eq!(progress.completed(), 2);
        assert_eq!(progress.failed(), 1);
        assert_eq!(progress.description(), "Reciter 7");
    }

    #[tokio::test]
    async fn test_announce_resets_counters() {
        let fake = Arc::new(RecordingMaterializer::default());
        let progress = Arc::new(DispatchProgress::new());
        let dispatcher = Dispatcher::new(2)
            .unwrap()
            .with_progress(Arc::clone(&progress));
        dispatcher.run(batch_of(&[("u1", "k1")]), fake, "Reciter 7").await;

        dispatcher.announce("Clear Quran (131)");

        assert_eq!(progress.total(), 0);
        assert_eq!(progress.completed(), 0);
        assert_eq!(progress.description(), "Clear Quran (131)");
    }
}
