//! JSON documents written into the mirror.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Number;

use crate::api::{Reciter, Translation};
use crate::quran::{SegmentScheme, VerseKey};

/// Reciter fields repeated in every per-reciter document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provenance {
    /// Recitation id.
    pub recitation_id: u32,
    /// Display name.
    pub reciter_name: String,
    /// Recitation style.
    pub style: Option<String>,
}

impl From<&Reciter> for Provenance {
    fn from(reciter: &Reciter) -> Self {
        Self {
            recitation_id: reciter.id,
            reciter_name: reciter.reciter_name.clone(),
            style: reciter.style.clone(),
        }
    }
}

/// One verse inside an aggregate document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerseEntry {
    /// Verse key, serialized as `chapter:verse`.
    pub verse_key: VerseKey,
    /// Canonical asset URL, only present in documents built from the flat feed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Mirror path of the verse audio.
    pub audio_path: String,
}

/// Verses of one segment of one reciter, sorted by `(chapter, verse)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateDocument {
    /// Scheme the segment belongs to.
    pub scheme: SegmentScheme,
    /// Segment number within the scheme.
    pub number: u16,
    /// Reciter fields.
    pub provenance: Provenance,
    /// Sorted verse entries.
    pub verses: Vec<VerseEntry>,
}

impl AggregateDocument {
    /// Number of verses in the document.
    #[must_use]
    pub fn total_verses(&self) -> usize {
        self.verses.len()
    }

    /// Verse keys in document order.
    pub fn verse_keys(&self) -> impl Iterator<Item = VerseKey> + '_ {
        self.verses.iter().map(|entry| entry.verse_key)
    }
}

impl Serialize for AggregateDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(6))?;
        map.serialize_entry(&self.scheme.number_field(), &self.number)?;
        map.serialize_entry("recitation_id", &self.provenance.recitation_id)?;
        map.serialize_entry("reciter_name", &self.provenance.reciter_name)?;
        map.serialize_entry("style", &self.provenance.style)?;
        map.serialize_entry("total_verses", &self.total_verses())?;
        map.serialize_entry("verses", &self.verses)?;
        map.end()
    }
}

/// One entry of `chapter_list.json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChapterListEntry {
    /// Chapter number.
    pub chapter_id: u16,
    /// Size reported upstream.
    pub file_size: Option<Number>,
    /// Format reported upstream.
    pub format: Option<String>,
    /// Mirror path of the chapter audio.
    pub audio_path: String,
}

/// `reciters/{id}/chapters/chapter_list.json`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChapterListDocument {
    /// Recitation id.
    pub recitation_id: u32,
    /// Display name.
    pub reciter_name: String,
    /// Recitation style.
    pub style: Option<String>,
    /// Entries sorted by chapter.
    pub chapters: Vec<ChapterListEntry>,
}

/// `reciters/reciter_list.json`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReciterListDocument {
    /// Mirrored reciters in upstream order.
    pub reciters: Vec<Reciter>,
}

/// `translations/translation_list.json`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranslationListDocument {
    /// Mirrored translations in upstream order.
    pub translations: Vec<Translation>,
}

/// One verse inside a translation chapter document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranslatedVerseEntry {
    /// Verse key, serialized as `chapter:verse`.
    pub verse_key: VerseKey,
    pub text: String,
}

/// `translations/{id}/chapters/{chapter}.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranslationChapterDocument {
    pub chapter_number: u16,
    pub translation_id: u32,
    pub translation_name: String,
    pub language_name: String,
    pub total_verses: usize,
    /// Sorted by `(chapter, verse)`.
    pub verses: Vec<TranslatedVerseEntry>,
}

/// Endpoint templates listed in `api_index.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiEndpoints {
    pub reciters: String,
    pub reciter_info: String,
    pub chapter_list: String,
    pub chapter_audio: String,
    pub verses_by_chapter: String,
    pub verses_by_juz: String,
    pub verses_by_page: String,
    pub verses_by_hizb: String,
    pub verses_by_rub: String,
    pub verse_audio: String,
    pub translations: String,
    pub translation_info: String,
    pub translation_chapter: String,
}

/// `api_index.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiIndexDocument {
    pub name: String,
    pub version: String,
    pub description: String,
    pub endpoints: ApiEndpoints,
}
