//! Mirror pipeline: reciters in, documents and assets out.
//!
//! Reciters are processed one at a time. For each one every document is
//! written (or attempted) first, then its entity-scoped [`TaskBatch`] is handed
//! to the dispatcher. Requested translations follow the reciters; they only
//! produce documents. A failure below the listings never aborts the run; it is
//! logged and counted in the [`RunSummary`].

mod options;
mod summary;

pub use options::{ContentFilter, PipelineOptions, TranslationSelection};
pub use summary::{
    AssetCounters, DocumentCounters, ReciterSummary, RunSummary, TranslationSummary,
};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::api::{ApiError, Reciter, Translation};
use crate::download::{DispatchError, DispatchProgress, Dispatcher, Materialize, TaskBatch};
use crate::index;
use crate::layout;
use crate::quran::{SegmentScheme, total_verse_count};
use crate::resolver::SegmentResolver;
use crate::sink::{Sink, write_json};

/// Errors that end a run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The reciter listing could not be fetched.
    #[error("failed to list reciters: {source}")]
    ListReciters {
        /// Final API error.
        #[source]
        source: ApiError,
    },

    /// The translation listing could not be fetched.
    #[error("failed to list translations: {source}")]
    ListTranslations {
        /// Final API error.
        #[source]
        source: ApiError,
    },

    /// Dispatcher settings were rejected.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// Drives one mirror run.
pub struct MirrorPipeline<'a> {
    resolver: SegmentResolver<'a>,
    sink: Arc<dyn Sink>,
    materializer: Arc<dyn Materialize>,
    dispatcher: Dispatcher,
    options: PipelineOptions,
    interrupted: Arc<AtomicBool>,
}

impl std::fmt::Debug for MirrorPipeline<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MirrorPipeline")
            .field("sink", &self.sink.describe())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<'a> MirrorPipeline<'a> {
    /// Creates a pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Dispatch`] when `options.concurrency` is out of range.
    pub fn new(
        resolver: SegmentResolver<'a>,
        sink: Arc<dyn Sink>,
        materializer: Arc<dyn Materialize>,
        options: PipelineOptions,
    ) -> Result<Self, PipelineError> {
        let interrupted = Arc::new(AtomicBool::new(false));
        let dispatcher =
            Dispatcher::new(options.concurrency)?.with_interrupt_flag(Arc::clone(&interrupted));
        Ok(Self {
            resolver,
            sink,
            materializer,
            dispatcher,
            options,
            interrupted,
        })
    }

    /// Shares an interrupt flag with the caller's signal handler.
    #[must_use]
    pub fn with_interrupt_flag(mut self, interrupted: Arc<AtomicBool>) -> Self {
        self.dispatcher = self
            .dispatcher
            .with_interrupt_flag(Arc::clone(&interrupted));
        self.interrupted = interrupted;
        self
    }

    /// Shares dispatch counters with a progress display.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<DispatchProgress>) -> Self {
        self.dispatcher = self.dispatcher.with_progress(progress);
        self
    }

    fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }

    /// Runs the mirror.
    ///
    /// # Errors
    ///
    /// Only a failed reciter or translation listing is fatal; everything else
    /// is recorded in the returned summary.
    #[instrument(skip(self), fields(sink = %self.sink.describe(), filter = %self.options.filter))]
    pub async fn run(&self) -> Result<RunSummary, PipelineError> {
        let listed = self
            .resolver
            .reciters()
            .await
            .map_err(|source| PipelineError::ListReciters { source })?;
        let reciters = select_reciters(listed, &self.options.reciter_ids);
        info!(count = reciters.len(), "reciters selected");

        let metadata = self.options.filter.includes_metadata();
        let translations = self.list_translations(metadata).await?;

        let mut summary = RunSummary::default();

        if metadata {
            let list = index::build_reciter_list(&reciters);
            let written = self.write_document(layout::RECITER_LIST_KEY, &list).await;
            summary.record_document(written);
        }

        for reciter in &reciters {
            if self.is_interrupted() {
                info!("interrupt requested, not starting further reciters");
                summary.interrupted = true;
                break;
            }
            let processed = self.process_reciter(reciter).await;
            summary.record(processed);
        }

        if metadata && !summary.interrupted && !translations.is_empty() {
            let list = index::build_translation_list(&translations);
            let written = self.write_document(layout::TRANSLATION_LIST_KEY, &list).await;
            summary.record_document(written);

            for translation in &translations {
                if self.is_interrupted() {
                    info!("interrupt requested, not starting further translations");
                    summary.interrupted = true;
                    break;
                }
                let processed = self.process_translation(translation).await;
                summary.record_translation(processed);
            }
        }

        if metadata && !summary.interrupted {
            let written = self
                .write_document(layout::API_INDEX_KEY, &index::build_api_index())
                .await;
            summary.record_document(written);
        }

        summary.log();
        Ok(summary)
    }

    /// Fetches and filters the translation listing when the run asks for it.
    async fn list_translations(&self, metadata: bool) -> Result<Vec<Translation>, PipelineError> {
        let selection = &self.options.translations;
        if !selection.is_requested() {
            return Ok(Vec::new());
        }
        if !metadata {
            info!("translations only produce documents, skipping them for an audio-only run");
            return Ok(Vec::new());
        }
        let listed = self
            .resolver
            .translations()
            .await
            .map_err(|source| PipelineError::ListTranslations { source })?;
        let selected = select_translations(listed, selection);
        info!(count = selected.len(), "translations selected");
        Ok(selected)
    }

    #[instrument(skip(self, reciter), fields(reciter_id = reciter.id))]
    async fn process_reciter(&self, reciter: &Reciter) -> ReciterSummary {
        let description = format!("{} ({})", reciter.reciter_name, reciter.id);
        let mut summary = ReciterSummary::new(reciter.id, description);
        let metadata = self.options.filter.includes_metadata();
        let binary = self.options.filter.includes_binary();
        let mut batch = TaskBatch::new();

        info!(reciter = %summary.description, "processing reciter");
        self.dispatcher.announce(&summary.description);

        if metadata {
            let key = layout::reciter_info_key(reciter.id);
            let written = self.write_document(&key, reciter).await;
            count(&mut summary.documents, written);
        }

        let listing = index::build_chapter_listing(reciter, self.resolver.chapter_audio(reciter.id).await);
        if metadata {
            let key = layout::chapter_list_key(reciter.id);
            let written = self.write_document(&key, &listing.document).await;
            count(&mut summary.documents, written);
        }
        if binary {
            batch.extend(listing.tasks);
        }

        let feed = self.resolver.verse_feed(reciter.id).await;
        warn_if_partial(reciter.id, feed.len());
        if metadata {
            for (chapter, document) in index::build_chapter_view(reciter, &feed) {
                let key = layout::segment_document_key(reciter.id, SegmentScheme::Chapter, chapter);
                let written = self.write_document(&key, &document).await;
                count(&mut summary.documents, written);
            }
        }
        if binary {
            batch.extend(index::ayah_tasks(&feed));
        }

        // Segment endpoints only contribute membership, so assets-only runs skip them.
        if metadata && !self.write_segment_documents(reciter, &mut summary).await {
            summary.interrupted = true;
            return summary;
        }

        if self.is_interrupted() {
            summary.interrupted = true;
            return summary;
        }

        if binary {
            debug!(tasks = batch.len(), collapsed = batch.collapsed(), "dispatching assets");
            let report = self
                .dispatcher
                .run(batch, Arc::clone(&self.materializer), &summary.description)
                .await;
            summary.absorb_dispatch(&report);
        }

        summary
    }

    #[instrument(skip(self, translation), fields(translation_id = translation.id))]
    async fn process_translation(&self, translation: &Translation) -> TranslationSummary {
        let description = format!("{} ({})", translation.name, translation.id);
        let mut summary = TranslationSummary::new(translation.id, description);

        info!(translation = %summary.description, "processing translation");
        self.dispatcher.announce(&summary.description);

        let key = layout::translation_info_key(translation.id);
        let written = self.write_document(&key, translation).await;
        count(&mut summary.documents, written);

        let verses = self.resolver.translation_feed(translation.id).await;
        warn_if_partial(translation.id, verses.len());
        for (chapter, document) in index::build_translation_chapters(translation, &verses) {
            if self.is_interrupted() {
                info!(chapter, "interrupt requested, stopping translation documents");
                summary.interrupted = true;
                break;
            }
            let key = layout::translation_chapter_key(translation.id, chapter);
            let written = self.write_document(&key, &document).await;
            count(&mut summary.documents, written);
        }

        summary
    }

    /// Fetches and writes every cross-reference segment document.
    /// Returns false when an interrupt cut the work short.
    async fn write_segment_documents(&self, reciter: &Reciter, summary: &mut ReciterSummary) -> bool {
        for scheme in SegmentScheme::CROSS_REFERENCE {
            let mut segments = Vec::with_capacity(usize::from(scheme.segment_count()));
            for number in 1..=scheme.segment_count() {
                if self.is_interrupted() {
                    info!(%scheme, number, "interrupt requested, stopping segment fetches");
                    return false;
                }
                match self.resolver.segment(reciter.id, scheme, number).await {
                    Ok(records) => segments.push((number, records)),
                    Err(error) => warn!(%scheme, number, error = %error, "segment skipped"),
                }
            }

            let documents = index::build(scheme, reciter, segments);
            debug!(%scheme, documents = documents.len(), "segment documents built");
            for (number, document) in documents {
                let key = layout::segment_document_key(reciter.id, scheme, number);
                let written = self.write_document(&key, &document).await;
                count(&mut summary.documents, written);
            }
        }
        true
    }

    async fn write_document<T>(&self, key: &str, document: &T) -> bool
    where
        T: Serialize + Sync + ?Sized,
    {
        match write_json(self.sink.as_ref(), key, document).await {
            Ok(outcome) => {
                debug!(key, ?outcome, "document written");
                true
            }
            Err(error) => {
                warn!(key, error = %error, "document write failed");
                false
            }
        }
    }
}

fn count(documents: &mut DocumentCounters, written: bool) {
    if written {
        documents.written += 1;
    } else {
        documents.failed += 1;
    }
}

/// Logs a feed that is non-empty but smaller than the whole text.
fn warn_if_partial(entity_id: u32, found: usize) {
    let expected = usize::try_from(total_verse_count()).unwrap_or(usize::MAX);
    if found > 0 && found < expected {
        warn!(entity_id, found, expected, "verse feed does not cover every verse");
    }
}

/// Keeps the requested translations in upstream order.
fn select_translations(listed: Vec<Translation>, selection: &TranslationSelection) -> Vec<Translation> {
    match selection {
        TranslationSelection::None => Vec::new(),
        TranslationSelection::All => listed,
        TranslationSelection::Ids(requested) => {
            for id in requested {
                if !listed.iter().any(|t| t.id == *id) {
                    warn!(translation_id = id, "requested translation not in upstream listing");
                }
            }
            listed
                .into_iter()
                .filter(|t| requested.contains(&t.id))
                .collect()
        }
    }
}

/// Keeps the requested reciters in upstream order; an empty request keeps all.
fn select_reciters(listed: Vec<Reciter>, requested: &[u32]) -> Vec<Reciter> {
    if requested.is_empty() {
        return listed;
    }
    for id in requested {
        if !listed.iter().any(|r| r.id == *id) {
            warn!(reciter_id = id, "requested reciter not in upstream listing");
        }
    }
    listed
        .into_iter()
        .filter(|r| requested.contains(&r.id))
        .collect()
}
