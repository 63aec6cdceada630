use tracing::{info, warn};

use crate::download::{DispatchReport, DownloadTask};

/// Asset counters of one dispatch or a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssetCounters {
    pub total: usize,
    pub skipped: usize,
    pub downloaded: usize,
    pub failed: usize,
}

impl AssetCounters {
    fn add(&mut self, other: Self) {
        self.total += other.total;
        self.skipped += other.skipped;
        self.downloaded += other.downloaded;
        self.failed += other.failed;
    }
}

impl From<&DispatchReport> for AssetCounters {
    fn from(report: &DispatchReport) -> Self {
        Self {
            total: report.total,
            skipped: report.skipped,
            downloaded: report.downloaded,
            failed: report.failed,
        }
    }
}

/// Document write counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DocumentCounters {
    pub written: usize,
    pub failed: usize,
}

impl DocumentCounters {
    fn add(&mut self, other: Self) {
        self.written += other.written;
        self.failed += other.failed;
    }
}

/// What happened for one reciter.
#[derive(Debug, Clone, Default)]
pub struct ReciterSummary {
    /// Recitation id.
    pub reciter_id: u32,
    /// Label used for progress and logs.
    pub description: String,
    pub documents: DocumentCounters,
    pub assets: AssetCounters,
    /// Failed asset tasks.
    pub failed_assets: Vec<DownloadTask>,
    /// Processing stopped early because of an interrupt.
    pub interrupted: bool,
}

impl ReciterSummary {
    pub(crate) fn new(reciter_id: u32, description: String) -> Self {
        Self {
            reciter_id,
            description,
            ..Self::default()
        }
    }

    pub(crate) fn absorb_dispatch(&mut self, report: &DispatchReport) {
        self.assets.add(AssetCounters::from(report));
        self.failed_assets.extend(report.failed_tasks().cloned());
        self.interrupted |= report.interrupted;
    }
}

/// What happened for one translation. Translations carry no assets.
#[derive(Debug, Clone, Default)]
pub struct TranslationSummary {
    pub translation_id: u32,
    /// Label used for progress and logs.
    pub description: String,
    pub documents: DocumentCounters,
    /// Processing stopped early because of an interrupt.
    pub interrupted: bool,
}

impl TranslationSummary {
    pub(crate) fn new(translation_id: u32, description: String) -> Self {
        Self {
            translation_id,
            description,
            ..Self::default()
        }
    }
}

/// What happened in a whole run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Per-reciter summaries in processing order.
    pub reciters: Vec<ReciterSummary>,
    /// Per-translation summaries in processing order.
    pub translations: Vec<TranslationSummary>,
    /// Documents outside any entity (lists, API index) plus every entity's.
    pub documents: DocumentCounters,
    pub assets: AssetCounters,
    /// The run stopped early because of an interrupt.
    pub interrupted: bool,
}

impl RunSummary {
    pub(crate) fn record(&mut self, reciter: ReciterSummary) {
        self.documents.add(reciter.documents);
        self.assets.add(reciter.assets);
        self.interrupted |= reciter.interrupted;
        self.reciters.push(reciter);
    }

    pub(crate) fn record_translation(&mut self, translation: TranslationSummary) {
        self.documents.add(translation.documents);
        self.interrupted |= translation.interrupted;
        self.translations.push(translation);
    }

    pub(crate) fn record_document(&mut self, written: bool) {
        if written {
            self.documents.written += 1;
        } else {
            self.documents.failed += 1;
        }
    }

    /// Every failed asset task across reciters.
    pub fn failed_assets(&self) -> impl Iterator<Item = &DownloadTask> + '_ {
        self.reciters.iter().flat_map(|r| r.failed_assets.iter())
    }

    /// Logs the totals and each failed asset.
    pub fn log(&self) {
        for task in self.failed_assets() {
            warn!(
                source = %task.source_url,
                destination = %task.destination_key,
                "asset not materialized"
            );
        }
        info!(
            reciters = self.reciters.len(),
            translations = self.translations.len(),
            total = self.assets.total,
            skipped = self.assets.skipped,
            downloaded = self.assets.downloaded,
            failed = self.assets.failed,
            documents_written = self.documents.written,
            documents_failed = self.documents.failed,
            interrupted = self.interrupted,
            "mirror run finished"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::{MaterializeOutcome, TaskOutcome};

    fn report() -> DispatchReport {
        let failed = DownloadTask::new("https://a/2.mp3", "r/2.mp3");
        DispatchReport {
            description: "Test (1)".to_string(),
            total: 3,
            downloaded: 1,
            skipped: 1,
            failed: 1,
            interrupted: false,
            outcomes: vec![TaskOutcome {
                task: failed,
                outcome: MaterializeOutcome::Failed {
                    error: "HTTP 500".to_string(),
                },
            }],
        }
    }

    #[test]
    fn test_run_summary_aggregates_reciters() {
        let mut first = ReciterSummary::new(1, "Test (1)".to_string());
        first.documents.written = 4;
        first.absorb_dispatch(&report());
        let mut second = ReciterSummary::new(2, "Other (2)".to_string());
        second.absorb_dispatch(&report());

        let mut run = RunSummary::default();
        run.record_document(true);
        run.record(first);
        run.record(second);

        assert_eq!(run.documents.written, 5);
        assert_eq!(run.assets.total, 6);
        assert_eq!(run.assets.failed, 2);
        assert_eq!(run.failed_assets().count(), 2);
        assert!(!run.interrupted);
    }

    #[test]
    fn test_translation_documents_count_toward_run() {
        let mut translation = TranslationSummary::new(131, "Clear Quran (131)".to_string());
        translation.documents.written = 114;
        translation.documents.failed = 1;

        let mut run = RunSummary::default();
        run.record_document(true);
        run.record_translation(translation);

        assert_eq!(run.documents.written, 115);
        assert_eq!(run.documents.failed, 1);
        assert_eq!(run.translations.len(), 1);
        assert_eq!(run.assets.total, 0);
    }

    #[test]
    fn test_interrupted_reciter_marks_run() {
        let mut reciter = ReciterSummary::new(1, "Test (1)".to_string());
        reciter.interrupted = true;
        let mut run = RunSummary::default();
        run.record(reciter);
        assert!(run.interrupted);
    }
}
