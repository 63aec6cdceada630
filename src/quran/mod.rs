//! Static Quran structure: verse keys, verse counts and segmentation schemes.

mod segment;
mod verse_key;

pub use segment::SegmentScheme;
pub use verse_key::{
    CHAPTER_COUNT, VerseKey, VerseKeyError, chapter_verse_keys, total_verse_count,
    verses_in_chapter,
};
