//! Wire types for the recitation API.
//!
//! Every field that upstream has been seen to omit or null is optional here;
//! validation happens later in the resolver and index builder.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};

/// Reads a JSON `null` as the type's default instead of failing.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A reciter as listed by `resources/recitations`.
///
/// Unknown fields are kept so `info.json` mirrors the upstream object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reciter {
    /// Remote-assigned recitation id.
    pub id: u32,
    /// Display name; null upstream reads as empty.
    #[serde(default, deserialize_with = "null_as_default")]
    pub reciter_name: String,
    /// Recitation style (e.g. `Murattal`), sometimes null upstream.
    #[serde(default)]
    pub style: Option<String>,
    /// Remaining upstream fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Reciter {
    /// Creates a reciter with no extra metadata.
    #[must_use]
    pub fn new(id: u32, reciter_name: impl Into<String>, style: Option<&str>) -> Self {
        Self {
            id,
            reciter_name: reciter_name.into(),
            style: style.map(ToString::to_string),
            extra: Map::new(),
        }
    }
}

/// `GET resources/recitations`
#[derive(Debug, Clone, Deserialize)]
pub struct RecitationsResponse {
    /// All reciters.
    #[serde(default)]
    pub recitations: Vec<Reciter>,
}

/// A text translation as listed by `resources/translations`.
///
/// Unknown fields are kept so `info.json` mirrors the upstream object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Translation {
    /// Remote-assigned translation id.
    pub id: u32,
    /// Display name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Translator or publisher.
    #[serde(default, deserialize_with = "null_as_default")]
    pub author_name: String,
    /// Language, e.g. `english`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub language_name: String,
    /// Remaining upstream fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Translation {
    /// Creates a translation with no extra metadata.
    #[must_use]
    pub fn new(id: u32, name: impl Into<String>, language_name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            author_name: String::new(),
            language_name: language_name.into(),
            extra: Map::new(),
        }
    }
}

/// `GET resources/translations`
#[derive(Debug, Clone, Deserialize)]
pub struct TranslationsResponse {
    /// All translations.
    #[serde(default)]
    pub translations: Vec<Translation>,
}

/// One verse of translated text.
#[derive(Debug, Clone, Deserialize)]
pub struct TranslatedVerseText {
    /// `chapter:verse`; may be null or malformed upstream.
    #[serde(default)]
    pub verse_key: Option<String>,
    /// Translated text, possibly carrying inline footnote markup.
    #[serde(default)]
    pub text: Option<String>,
}

/// `GET quran/translations/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct TranslationTextResponse {
    /// One entry per verse.
    #[serde(default)]
    pub translations: Vec<TranslatedVerseText>,
}

/// One full-chapter audio file.
#[derive(Debug, Clone, Deserialize)]
pub struct ChapterAudioFile {
    /// Chapter number; null in some malformed upstream entries.
    #[serde(default)]
    pub chapter_id: Option<u16>,
    /// Audio location, in any URL shape.
    #[serde(default)]
    pub audio_url: Option<String>,
    /// Size in bytes as reported upstream.
    #[serde(default)]
    pub file_size: Option<Number>,
    /// Container format, e.g. `mp3`.
    #[serde(default)]
    pub format: Option<String>,
}

/// `GET chapter_recitations/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct ChapterRecitationsResponse {
    /// One entry per chapter.
    #[serde(default)]
    pub audio_files: Vec<ChapterAudioFile>,
}

/// One per-verse audio entry.
#[derive(Debug, Clone, Deserialize)]
pub struct VerseAudioFile {
    /// `chapter:verse`; may be null or malformed upstream.
    #[serde(default)]
    pub verse_key: Option<String>,
    /// Audio location, usually host-relative.
    #[serde(default)]
    pub url: Option<String>,
}

/// `GET quran/recitations/{id}` and `GET recitations/{id}/by_*/{n}`
#[derive(Debug, Clone, Deserialize)]
pub struct VerseAudioResponse {
    /// Verse entries of this page.
    #[serde(default)]
    pub audio_files: Vec<VerseAudioFile>,
    /// Paging information (segment endpoints only).
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

/// Paging block returned by segment endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Pagination {
    /// Page size used by the server.
    #[serde(default)]
    pub per_page: Option<u32>,
    /// Page that was returned.
    #[serde(default)]
    pub current_page: Option<u32>,
    /// Next page, null on the last page.
    #[serde(default)]
    pub next_page: Option<u32>,
    /// Total number of pages.
    #[serde(default)]
    pub total_pages: Option<u32>,
    /// Total number of records across pages.
    #[serde(default)]
    pub total_records: Option<u32>,
}
