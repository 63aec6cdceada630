//! Index builder: folds verse records into the mirror's JSON documents.
//!
//! Two related shapes come out of one reciter:
//! - per-segment [`AggregateDocument`]s (chapter view from the flat feed,
//!   juz/page/hizb/rub from segment endpoints)
//! - the [`ChapterListDocument`] describing full-chapter audio files
//!
//! Translations fold into per-chapter [`TranslationChapterDocument`]s.

mod builder;
mod documents;

pub use builder::{
    ChapterListing, ayah_tasks, build, build_api_index, build_chapter_listing,
    build_chapter_view, build_reciter_list, build_translation_chapters, build_translation_list,
    sort_verses,
};
pub use documents::{
    AggregateDocument, ApiEndpoints, ApiIndexDocument, ChapterListDocument, ChapterListEntry,
    Provenance, ReciterListDocument, TranslatedVerseEntry, TranslationChapterDocument,
    TranslationListDocument, VerseEntry,
};
