//! Segment resolution: turns API responses into validated verse records.
//!
//! The flat verse feed ([`SegmentResolver::verse_feed`]) is the only source of
//! asset URLs. Segment endpoints ([`SegmentResolver::segment`]) contribute
//! membership only; their records never carry a URL.
//!
//! Translations go through the same resolver: their listing is fatal like the
//! reciter listing, and [`SegmentResolver::translation_feed`] yields validated
//! verse text.
//!
//! API failures below the listings degrade to "no data": the resolver logs
//! them and returns an empty list so sibling segments keep going.

mod asset_url;

pub use asset_url::{DEFAULT_AUDIO_HOST, UrlShape, canonicalize_asset_url, classify_url};

use serde_json::Number;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::api::{
    ApiClient, ApiError, ChapterAudioFile, ChapterRecitationsResponse, RecitationsResponse,
    Reciter, TranslatedVerseText, Translation, TranslationTextResponse, TranslationsResponse,
    VerseAudioFile, VerseAudioResponse,
};
use crate::layout;
use crate::quran::{SegmentScheme, VerseKey};

/// Page size requested from segment endpoints.
pub const SEGMENT_PAGE_SIZE: u32 = 1000;

/// Upper bound on pages followed for one segment.
const MAX_SEGMENT_PAGES: u32 = 50;

/// Errors raised by the resolver itself (API failures are absorbed).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// Segment number outside the scheme's range.
    #[error("{scheme} segment {number} out of range 1..={max}")]
    SegmentOutOfRange {
        /// Requested scheme.
        scheme: SegmentScheme,
        /// Requested number.
        number: u16,
        /// Highest valid number.
        max: u16,
    },

    /// Asset URL that cannot be made absolute.
    #[error("invalid asset URL '{url}'")]
    InvalidAssetUrl {
        /// The raw upstream value.
        url: String,
    },
}

impl ResolveError {
    /// Creates an invalid asset URL error.
    pub fn invalid_asset_url(url: impl Into<String>) -> Self {
        Self::InvalidAssetUrl { url: url.into() }
    }
}

/// One verse of one reciter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerseRecord {
    /// Validated verse key.
    pub verse_key: VerseKey,
    /// Canonical asset URL; `None` for segment records or when upstream had none.
    pub source_url: Option<String>,
    /// Mirror key of the verse audio.
    pub destination_key: String,
}

/// One verse of one translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedVerse {
    /// Validated verse key.
    pub verse_key: VerseKey,
    /// Translated text as served upstream.
    pub text: String,
}

/// One full-chapter audio entry after URL canonicalization.
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterAudio {
    /// Chapter number; `None` for malformed upstream entries.
    pub chapter_id: Option<u16>,
    /// Canonical audio URL.
    pub source_url: Option<String>,
    /// Size reported upstream.
    pub file_size: Option<Number>,
    /// Format reported upstream.
    pub format: Option<String>,
}

/// Resolves reciters, chapter audio, the flat verse feed and segments.
#[derive(Debug)]
pub struct SegmentResolver<'a> {
    api: &'a ApiClient,
    audio_host: url::Url,
}

impl<'a> SegmentResolver<'a> {
    /// Creates a resolver over `api`, resolving relative audio URLs against `audio_host`.
    #[must_use]
    pub fn new(api: &'a ApiClient, audio_host: url::Url) -> Self {
        Self { api, audio_host }
    }

    /// Lists all reciters. Failure here is fatal for a run.
    ///
    /// # Errors
    ///
    /// Returns the [`ApiError`] once retries are exhausted.
    #[instrument(skip(self))]
    pub async fn reciters(&self) -> Result<Vec<Reciter>, ApiError> {
        let response: RecitationsResponse =
            self.api.fetch_as("resources/recitations", &[]).await?;
        debug!(count = response.recitations.len(), "listed reciters");
        Ok(response.recitations)
    }

    /// Lists all translations. Failure here is fatal for a run.
    ///
    /// # Errors
    ///
    /// Returns the [`ApiError`] once retries are exhausted.
    #[instrument(skip(self))]
    pub async fn translations(&self) -> Result<Vec<Translation>, ApiError> {
        let response: TranslationsResponse =
            self.api.fetch_as("resources/translations", &[]).await?;
        debug!(count = response.translations.len(), "listed translations");
        Ok(response.translations)
    }

    /// Every verse of a translation; empty when the API call fails.
    ///
    /// Entries with a missing or invalid verse key, or without text, are
    /// dropped and logged.
    #[instrument(skip(self))]
    pub async fn translation_feed(&self, translation_id: u32) -> Vec<TranslatedVerse> {
        let endpoint = format!("quran/translations/{translation_id}");
        let params = [("fields", "verse_key".to_string())];
        match self.api.fetch_as::<TranslationTextResponse>(&endpoint, &params).await {
            Ok(response) => translated_verses(translation_id, response.translations),
            Err(error) => {
                warn!(translation_id, error = %error, "translation text unavailable, skipping");
                Vec::new()
            }
        }
    }

    /// Full-chapter audio files of a reciter; empty when the API call fails.
    #[instrument(skip(self))]
    pub async fn chapter_audio(&self, reciter_id: u32) -> Vec<ChapterAudio> {
        let endpoint = format!("chapter_recitations/{reciter_id}");
        let response: ChapterRecitationsResponse = match self.api.fetch_as(&endpoint, &[]).await
        {
            Ok(response) => response,
            Err(error) => {
                warn!(reciter_id, error = %error, "chapter audio unavailable, skipping");
                return Vec::new();
            }
        };
        response
            .audio_files
            .into_iter()
            .map(|file| self.chapter_audio_entry(file))
            .collect()
    }

    /// The flat per-verse feed of a reciter, with canonical asset URLs.
    ///
    /// Entries with a missing or invalid verse key are dropped and logged.
    #[instrument(skip(self))]
    pub async fn verse_feed(&self, reciter_id: u32) -> Vec<VerseRecord> {
        let endpoint = format!("quran/recitations/{reciter_id}");
        match self.api.fetch_as::<VerseAudioResponse>(&endpoint, &[]).await {
            Ok(response) => self.records_from(reciter_id, response.audio_files, true),
            Err(error) => {
                warn!(reciter_id, error = %error, "verse feed unavailable, skipping");
                Vec::new()
            }
        }
    }

    /// Verse records of segment `number` under `scheme`, following pagination.
    ///
    /// An API failure on any page yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::SegmentOutOfRange`] for an invalid segment number.
    #[instrument(skip(self))]
    pub async fn segment(
        &self,
        reciter_id: u32,
        scheme: SegmentScheme,
        number: u16,
    ) -> Result<Vec<VerseRecord>, ResolveError> {
        if !scheme.contains(number) {
            return Err(ResolveError::SegmentOutOfRange {
                scheme,
                number,
                max: scheme.segment_count(),
            });
        }

        let endpoint = format!("recitations/{reciter_id}/{}/{number}", scheme.api_path());
        let mut files = Vec::new();
        let mut page: u32 = 1;

        loop {
            let mut params = vec![("per_page", SEGMENT_PAGE_SIZE.to_string())];
            if page > 1 {
                params.push(("page", page.to_string()));
            }
            let response: VerseAudioResponse = match self.api.fetch_as(&endpoint, &params).await {
                Ok(response) => response,
                Err(error) => {
                    warn!(
                        reciter_id,
                        %scheme,
                        number,
                        page,
                        error = %error,
                        "segment unavailable, treating as empty"
                    );
                    return Ok(Vec::new());
                }
            };
            files.extend(response.audio_files);

            match response.pagination.and_then(|p| p.next_page) {
                Some(next) if next > page && next <= MAX_SEGMENT_PAGES => page = next,
                Some(next) => {
                    warn!(reciter_id, %scheme, number, page, next, "ignoring implausible next_page");
                    break;
                }
                None => break,
            }
        }

        let records = self.records_from(reciter_id, files, false);
        if scheme == SegmentScheme::Chapter {
            return Ok(retain_chapter(reciter_id, number, records));
        }
        Ok(records)
    }

    fn chapter_audio_entry(&self, file: ChapterAudioFile) -> ChapterAudio {
        let source_url = file.audio_url.as_deref().and_then(|raw| {
            canonicalize_asset_url(raw, &self.audio_host)
                .map_err(|error| warn!(chapter_id = ?file.chapter_id, error = %error, "dropping chapter audio URL"))
                .ok()
                .map(String::from)
        });
        ChapterAudio {
            chapter_id: file.chapter_id,
            source_url,
            file_size: file.file_size,
            format: file.format,
        }
    }

    fn records_from(
        &self,
        reciter_id: u32,
        files: Vec<VerseAudioFile>,
        keep_urls: bool,
    ) -> Vec<VerseRecord> {
        files
            .into_iter()
            .filter_map(|file| {
                let Some(raw_key) = file.verse_key.as_deref() else {
                    warn!(reciter_id, "dropping verse entry without verse_key");
                    return None;
                };
                let verse_key = match raw_key.parse::<VerseKey>() {
                    Ok(key) => key,
                    Err(error) => {
                        warn!(reciter_id, error = %error, "dropping malformed verse entry");
                        return None;
                    }
                };
                let source_url = if keep_urls {
                    file.url.as_deref().and_then(|raw| {
                        canonicalize_asset_url(raw, &self.audio_host)
                            .map_err(|error| {
                                warn!(reciter_id, %verse_key, error = %error, "dropping verse audio URL");
                            })
                            .ok()
                            .map(String::from)
                    })
                } else {
                    None
                };
                Some(VerseRecord {
                    verse_key,
                    source_url,
                    destination_key: layout::ayah_audio_key(reciter_id, verse_key),
                })
            })
            .collect()
    }
}

/// Drops records of `chapter`'s segment that belong to another chapter.
fn retain_chapter(reciter_id: u32, chapter: u16, records: Vec<VerseRecord>) -> Vec<VerseRecord> {
    records
        .into_iter()
        .filter(|record| {
            let own = record.verse_key.chapter() == chapter;
            if !own {
                warn!(
                    reciter_id,
                    chapter,
                    verse_key = %record.verse_key,
                    "dropping verse listed under another chapter"
                );
            }
            own
        })
        .collect()
}

fn translated_verses(translation_id: u32, entries: Vec<TranslatedVerseText>) -> Vec<TranslatedVerse> {
    entries
        .into_iter()
        .filter_map(|entry| {
            let Some(raw_key) = entry.verse_key.as_deref() else {
                warn!(translation_id, "dropping translated verse without verse_key");
                return None;
            };
            let verse_key = match raw_key.parse::<VerseKey>() {
                Ok(key) => key,
                Err(error) => {
                    warn!(translation_id, error = %error, "dropping malformed translated verse");
                    return None;
                }
            };
            let Some(text) = entry.text else {
                warn!(translation_id, %verse_key, "dropping translated verse without text");
                return None;
            };
            Some(TranslatedVerse { verse_key, text })
        })
        .collect()
}
