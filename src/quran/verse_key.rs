//! Verse keys (`chapter:verse`) and the fixed per-chapter verse table.
//!
//! Ordering of [`VerseKey`] is numeric on `(chapter, verse)`, so `2:2` sorts
//! before `2:10`. Every document that lists verses relies on this.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Number of chapters.
pub const CHAPTER_COUNT: u16 = 114;

/// Verses per chapter, index 0 is chapter 1.
const VERSE_COUNTS: [u16; CHAPTER_COUNT as usize] = [
    7, 286, 200, 176, 120, 165, 206, 75, 129, 109, 123, 111, 43, 52, 99, 128, 111, 110, 98, 135,
    112, 78, 118, 64, 77, 227, 93, 88, 69, 60, 34, 30, 73, 54, 45, 83, 182, 88, 75, 85, 54, 53, 89,
    59, 37, 35, 38, 29, 18, 45, 60, 49, 62, 55, 78, 96, 29, 22, 24, 13, 14, 11, 11, 18, 12, 12, 30,
    52, 52, 44, 28, 28, 20, 56, 40, 31, 50, 40, 46, 42, 29, 19, 36, 25, 22, 17, 19, 26, 30, 20, 15,
    21, 11, 8, 8, 19, 5, 8, 8, 11, 11, 8, 3, 9, 5, 4, 7, 3, 6, 3, 5, 4, 5, 6,
];

/// Returns the number of verses in `chapter`, or `None` outside `1..=114`.
#[must_use]
pub fn verses_in_chapter(chapter: u16) -> Option<u16> {
    let index = usize::from(chapter.checked_sub(1)?);
    VERSE_COUNTS.get(index).copied()
}

/// Total number of verses across all chapters.
#[must_use]
pub fn total_verse_count() -> u32 {
    VERSE_COUNTS.iter().map(|count| u32::from(*count)).sum()
}

/// All verse keys of `chapter` in ascending order, or `None` for an invalid chapter.
#[must_use]
pub fn chapter_verse_keys(chapter: u16) -> Option<Vec<VerseKey>> {
    let count = verses_in_chapter(chapter)?;
    Some(
        (1..=count)
            .map(|verse| VerseKey { chapter, verse })
            .collect(),
    )
}

/// Errors produced when parsing or validating a verse key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerseKeyError {
    /// Input is not of the form `<int>:<int>`.
    #[error("malformed verse key '{input}': expected chapter:verse")]
    Malformed {
        /// The rejected input.
        input: String,
    },

    /// Chapter is outside `1..=114`.
    #[error("chapter {chapter} out of range 1..={CHAPTER_COUNT}")]
    ChapterOutOfRange {
        /// The rejected chapter number.
        chapter: u16,
    },

    /// Verse is outside the chapter's range.
    #[error("verse {chapter}:{verse} out of range (chapter {chapter} has {max} verses)")]
    VerseOutOfRange {
        /// Chapter of the rejected key.
        chapter: u16,
        /// The rejected verse number.
        verse: u16,
        /// Verse count of the chapter.
        max: u16,
    },
}

/// A validated `chapter:verse` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VerseKey {
    chapter: u16,
    verse: u16,
}

impl VerseKey {
    /// Creates a verse key, checking both halves against the verse table.
    ///
    /// # Errors
    ///
    /// Returns [`VerseKeyError::ChapterOutOfRange`] or
    /// [`VerseKeyError::VerseOutOfRange`] when the pair does not exist.
    pub fn new(chapter: u16, verse: u16) -> Result<Self, VerseKeyError> {
        let max = verses_in_chapter(chapter).ok_or(VerseKeyError::ChapterOutOfRange { chapter })?;
        if verse == 0 || verse > max {
            return Err(VerseKeyError::VerseOutOfRange {
                chapter,
                verse,
                max,
            });
        }
        Ok(Self { chapter, verse })
    }

    /// 1-based chapter number.
    #[must_use]
    pub fn chapter(self) -> u16 {
        self.chapter
    }

    /// 1-based verse number within the chapter.
    #[must_use]
    pub fn verse(self) -> u16 {
        self.verse
    }

    /// File stem used for per-verse audio (`{chapter}_{verse}`).
    #[must_use]
    pub fn file_stem(self) -> String {
        format!("{}_{}", self.chapter, self.verse)
    }
}

impl fmt::Display for VerseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.chapter, self.verse)
    }
}

impl FromStr for VerseKey {
    type Err = VerseKeyError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let malformed = || VerseKeyError::Malformed {
            input: input.to_string(),
        };
        let (chapter, verse) = input.trim().split_once(':').ok_or_else(malformed)?;
        let chapter = chapter.parse::<u16>().map_err(|_| malformed())?;
        let verse = verse.parse::<u16>().map_err(|_| malformed())?;
        Self::new(chapter, verse)
    }
}

impl Serialize for VerseKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VerseKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_verse_table_has_expected_totals() {
        assert_eq!(VERSE_COUNTS.len(), 114);
        assert_eq!(total_verse_count(), 6236);
        assert_eq!(verses_in_chapter(1), Some(7));
        assert_eq!(verses_in_chapter(2), Some(286));
        assert_eq!(verses_in_chapter(114), Some(6));
    }

    #[test]
    fn test_verses_in_chapter_rejects_out_of_range() {
        assert_eq!(verses_in_chapter(0), None);
        assert_eq!(verses_in_chapter(115), None);
    }

    #[test]
    fn test_parse_valid_key() {
        let key: VerseKey = "2:255".parse().unwrap();
        assert_eq!(key.chapter(), 2);
        assert_eq!(key.verse(), 255);
        assert_eq!(key.to_string(), "2:255");
        assert_eq!(key.file_stem(), "2_255");
    }

    #[test]
    fn test_parse_rejects_malformed_input() {
        for input in ["", "2", "2:", ":3", "a:b", "2:3:4", "-1:2"] {
            let err = input.parse::<VerseKey>().unwrap_err();
            assert!(
                matches!(err, VerseKeyError::Malformed { .. }),
                "expected malformed for {input:?}, got {err:?}"
            );
        }
    }

    #[test]
    fn test_parse_rejects_out_of_range_pairs() {
        assert_eq!(
            "115:1".parse::<VerseKey>().unwrap_err(),
            VerseKeyError::ChapterOutOfRange { chapter: 115 }
        );
        assert_eq!(
            "1:8".parse::<VerseKey>().unwrap_err(),
            VerseKeyError::VerseOutOfRange {
                chapter: 1,
                verse: 8,
                max: 7
            }
        );
        assert!("1:0".parse::<VerseKey>().is_err());
    }

    #[test]
    fn test_ordering_is_numeric_not_lexical() {
        let mut keys: Vec<VerseKey> = ["2:10", "2:2", "2:1", "10:1", "9:3"]
            .iter()
            .map(|raw| raw.parse().unwrap())
            .collect();
        keys.sort();
        let rendered: Vec<String> = keys.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, ["2:1", "2:2", "2:10", "9:3", "10:1"]);
    }

    #[test]
    fn test_chapter_verse_keys_covers_whole_chapter() {
        for chapter in 1..=CHAPTER_COUNT {
            let keys = chapter_verse_keys(chapter).unwrap();
            let expected = verses_in_chapter(chapter).unwrap();
            assert_eq!(keys.len(), usize::from(expected));
            assert_eq!(keys.first().unwrap().verse(), 1);
            assert_eq!(keys.last().unwrap().verse(), expected);
            assert!(keys.iter().all(|key| key.chapter() == chapter));
        }
        assert!(chapter_verse_keys(0).is_none());
    }

    #[test]
    fn test_serde_uses_string_form() {
        let key = VerseKey::new(3, 7).unwrap();
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"3:7\"");
        let back: VerseKey = serde_json::from_str("\"3:7\"").unwrap();
        assert_eq!(back, key);
        assert!(serde_json::from_str::<VerseKey>("\"3:700\"").is_err());
    }
}
