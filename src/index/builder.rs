use std::collections::BTreeMap;

use tracing::{debug, warn};

use super::documents::{
    AggregateDocument, ApiEndpoints, ApiIndexDocument, ChapterListDocument, ChapterListEntry,
    Provenance, ReciterListDocument, TranslatedVerseEntry, TranslationChapterDocument,
    TranslationListDocument, VerseEntry,
};
use crate::api::{Reciter, Translation};
use crate::download::DownloadTask;
use crate::layout;
use crate::quran::{SegmentScheme, VerseKey, chapter_verse_keys, verses_in_chapter};
use crate::resolver::{ChapterAudio, TranslatedVerse, VerseRecord};

/// `chapter_list.json` plus the full-chapter audio it references.
#[derive(Debug, Clone)]
pub struct ChapterListing {
    /// The listing document.
    pub document: ChapterListDocument,
    /// One task per entry that has an audio URL.
    pub tasks: Vec<DownloadTask>,
}

/// Folds resolved segments into documents keyed by segment number.
///
/// Empty segments and out-of-range numbers produce no document. Verses are
/// sorted by `(chapter, verse)`; a verse listed twice keeps its last record.
#[must_use]
pub fn build(
    scheme: SegmentScheme,
    reciter: &Reciter,
    segments: impl IntoIterator<Item = (u16, Vec<VerseRecord>)>,
) -> BTreeMap<u16, AggregateDocument> {
    let provenance = Provenance::from(reciter);
    let mut documents = BTreeMap::new();

    for (number, records) in segments {
        if !scheme.contains(number) {
            warn!(reciter_id = reciter.id, %scheme, number, "skipping out-of-range segment");
            continue;
        }
        if records.is_empty() {
            debug!(reciter_id = reciter.id, %scheme, number, "skipping empty segment");
            continue;
        }

        // Reversed ahead of the stable sort so dedup keeps the last record of a key.
        let mut verses: Vec<VerseEntry> = records
            .into_iter()
            .rev()
            .map(|record| VerseEntry {
                verse_key: record.verse_key,
                url: record.source_url,
                audio_path: layout::public_path(&record.destination_key),
            })
            .collect();
        sort_verses(&mut verses);
        verses.dedup_by_key(|entry| entry.verse_key);

        documents.insert(
            number,
            AggregateDocument {
                scheme,
                number,
                provenance: provenance.clone(),
                verses,
            },
        );
    }

    documents
}

/// Builds the per-chapter view from the flat verse feed.
///
/// A chapter whose verse count differs from the fixed table is still emitted,
/// with a warning, since it means the upstream feed is incomplete.
#[must_use]
pub fn build_chapter_view(
    reciter: &Reciter,
    records: &[VerseRecord],
) -> BTreeMap<u16, AggregateDocument> {
    let mut grouped: BTreeMap<u16, Vec<VerseRecord>> = BTreeMap::new();
    for record in records {
        grouped
            .entry(record.verse_key.chapter())
            .or_default()
            .push(record.clone());
    }

    let documents = build(SegmentScheme::Chapter, reciter, grouped);
    for (chapter, document) in &documents {
        let expected = verses_in_chapter(*chapter).map_or(0, usize::from);
        if document.total_verses() != expected {
            let first_missing = first_missing_verse(*chapter, document.verse_keys());
            warn!(
                reciter_id = reciter.id,
                chapter,
                found = document.total_verses(),
                expected,
                first_missing = ?first_missing.map(|key| key.to_string()),
                "verse feed incomplete for chapter"
            );
        }
    }
    documents
}

/// First verse of `chapter` absent from `present`, which must be sorted.
fn first_missing_verse(chapter: u16, present: impl Iterator<Item = VerseKey>) -> Option<VerseKey> {
    let mut present = present.peekable();
    chapter_verse_keys(chapter)?.into_iter().find(|expected| {
        while present.next_if(|key| key < expected).is_some() {}
        present.next_if_eq(expected).is_none()
    })
}

/// Builds `chapter_list.json` and the chapter audio download tasks.
///
/// Entries without a valid chapter number are dropped and logged.
#[must_use]
pub fn build_chapter_listing(reciter: &Reciter, files: Vec<ChapterAudio>) -> ChapterListing {
    let mut by_chapter: BTreeMap<u16, ChapterAudio> = BTreeMap::new();
    for file in files {
        match file.chapter_id {
            Some(chapter) if verses_in_chapter(chapter).is_some() => {
                by_chapter.insert(chapter, file);
            }
            Some(chapter) => {
                warn!(reciter_id = reciter.id, chapter, "skipping chapter audio with invalid chapter_id");
            }
            None => {
                warn!(
                    reciter_id = reciter.id,
                    audio_url = ?file.source_url,
                    "skipping chapter audio with null chapter_id"
                );
            }
        }
    }

    let mut chapters = Vec::with_capacity(by_chapter.len());
    let mut tasks = Vec::new();
    for (chapter, file) in by_chapter {
        let key = layout::chapter_audio_key(reciter.id, chapter);
        if let Some(url) = file.source_url {
            tasks.push(DownloadTask::new(url, key.clone()));
        }
        chapters.push(ChapterListEntry {
            chapter_id: chapter,
            file_size: file.file_size,
            format: file.format,
            audio_path: layout::public_path(&key),
        });
    }

    ChapterListing {
        document: ChapterListDocument {
            recitation_id: reciter.id,
            reciter_name: reciter.reciter_name.clone(),
            style: reciter.style.clone(),
            chapters,
        },
        tasks,
    }
}

/// Per-verse audio tasks; only the flat feed carries URLs, so only its records yield tasks.
#[must_use]
pub fn ayah_tasks(records: &[VerseRecord]) -> Vec<DownloadTask> {
    records
        .iter()
        .filter_map(|record| {
            record
                .source_url
                .as_ref()
                .map(|url| DownloadTask::new(url.clone(), record.destination_key.clone()))
        })
        .collect()
}

/// Sorts entries by `(chapter, verse)`. The sort is stable.
pub fn sort_verses(entries: &mut [VerseEntry]) {
    entries.sort_by_key(|entry| entry.verse_key);
}

/// `reciters/reciter_list.json`
#[must_use]
pub fn build_reciter_list(reciters: &[Reciter]) -> ReciterListDocument {
    ReciterListDocument {
        reciters: reciters.to_vec(),
    }
}

/// `translations/translation_list.json`
#[must_use]
pub fn build_translation_list(translations: &[Translation]) -> TranslationListDocument {
    TranslationListDocument {
        translations: translations.to_vec(),
    }
}

/// Groups a translation's verses into one document per chapter.
///
/// Verses are sorted by `(chapter, verse)`; a verse listed twice keeps its
/// last text. Incomplete chapters are emitted with a warning.
#[must_use]
pub fn build_translation_chapters(
    translation: &Translation,
    verses: &[TranslatedVerse],
) -> BTreeMap<u16, TranslationChapterDocument> {
    let mut grouped: BTreeMap<u16, Vec<TranslatedVerseEntry>> = BTreeMap::new();
    for verse in verses.iter().rev() {
        grouped
            .entry(verse.verse_key.chapter())
            .or_default()
            .push(TranslatedVerseEntry {
                verse_key: verse.verse_key,
                text: verse.text.clone(),
            });
    }

    grouped
        .into_iter()
        .map(|(chapter, mut entries)| {
            entries.sort_by_key(|entry| entry.verse_key);
            entries.dedup_by_key(|entry| entry.verse_key);

            let expected = verses_in_chapter(chapter).map_or(0, usize::from);
            if entries.len() != expected {
                let first_missing =
                    first_missing_verse(chapter, entries.iter().map(|entry| entry.verse_key));
                warn!(
                    translation_id = translation.id,
                    chapter,
                    found = entries.len(),
                    expected,
                    first_missing = ?first_missing.map(|key| key.to_string()),
                    "translation text incomplete for chapter"
                );
            }
            let document = TranslationChapterDocument {
                chapter_number: chapter,
                translation_id: translation.id,
                translation_name: translation.name.clone(),
                language_name: translation.language_name.clone(),
                total_verses: entries.len(),
                verses: entries,
            };
            (chapter, document)
        })
        .collect()
}

/// `api_index.json`
#[must_use]
pub fn build_api_index() -> ApiIndexDocument {
    let segment = |scheme: SegmentScheme| {
        format!(
            "/reciters/{{reciter_id}}/verses/{scheme}/{{{}}}.json",
            scheme.number_field()
        )
    };
    ApiIndexDocument {
        name: "Quran Audio Static API".to_string(),
        version: "1.0.0".to_string(),
        description: "Static API for Quran audio recitations and translations".to_string(),
        endpoints: ApiEndpoints {
            reciters: layout::public_path(layout::RECITER_LIST_KEY),
            reciter_info: "/reciters/{reciter_id}/info.json".to_string(),
            chapter_list: "/reciters/{reciter_id}/chapters/chapter_list.json".to_string(),
            chapter_audio: "/reciters/{reciter_id}/chapters/{chapter_number}.mp3".to_string(),
            verses_by_chapter: segment(SegmentScheme::Chapter),
            verses_by_juz: segment(SegmentScheme::Juz),
            verses_by_page: segment(SegmentScheme::Page),
            verses_by_hizb: segment(SegmentScheme::Hizb),
            verses_by_rub: segment(SegmentScheme::Rub),
            verse_audio: "/reciters/{reciter_id}/verses/ayah/{chapter_number}_{verse_number}.mp3"
                .to_string(),
            translations: layout::public_path(layout::TRANSLATION_LIST_KEY),
            translation_info: "/translations/{translation_id}/info.json".to_string(),
            translation_chapter: "/translations/{translation_id}/chapters/{chapter_number}.json"
                .to_string(),
        },
    }
}
