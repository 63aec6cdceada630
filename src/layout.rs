//! Destination keys of the mirror tree.
//!
//! Keys are `/`-separated paths relative to the sink root. Documents refer to
//! assets by [`public_path`], the key with a leading slash.

use crate::quran::{SegmentScheme, VerseKey};

/// Top-level index describing all endpoints.
pub const API_INDEX_KEY: &str = "api_index.json";

/// List of mirrored reciters.
pub const RECITER_LIST_KEY: &str = "reciters/reciter_list.json";

/// `reciters/{id}/info.json`
#[must_use]
pub fn reciter_info_key(reciter_id: u32) -> String {
    format!("reciters/{reciter_id}/info.json")
}

/// `reciters/{id}/chapters/chapter_list.json`
#[must_use]
pub fn chapter_list_key(reciter_id: u32) -> String {
    format!("reciters/{reciter_id}/chapters/chapter_list.json")
}

/// `reciters/{id}/chapters/{chapter}.mp3`
#[must_use]
pub fn chapter_audio_key(reciter_id: u32, chapter: u16) -> String {
    format!("reciters/{reciter_id}/chapters/{chapter}.mp3")
}

/// `reciters/{id}/verses/{scheme}/{n}.json`
#[must_use]
pub fn segment_document_key(reciter_id: u32, scheme: SegmentScheme, number: u16) -> String {
    format!("reciters/{reciter_id}/verses/{scheme}/{number}.json")
}

/// `reciters/{id}/verses/ayah/{chapter}_{verse}.mp3`
#[must_use]
pub fn ayah_audio_key(reciter_id: u32, verse_key: VerseKey) -> String {
    format!(
        "reciters/{reciter_id}/verses/ayah/{}.mp3",
        verse_key.file_stem()
    )
}

/// List of mirrored translations.
pub const TRANSLATION_LIST_KEY: &str = "translations/translation_list.json";

/// `translations/{id}/info.json`
#[must_use]
pub fn translation_info_key(translation_id: u32) -> String {
    format!("translations/{translation_id}/info.json")
}

/// `translations/{id}/chapters/{chapter}.json`
#[must_use]
pub fn translation_chapter_key(translation_id: u32, chapter: u16) -> String {
    format!("translations/{translation_id}/chapters/{chapter}.json")
}

/// Public path of a key as written into documents.
#[must_use]
pub fn public_path(key: &str) -> String {
    format!("/{}", key.trim_start_matches('/'))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_match_mirror_layout() {
        let verse = VerseKey::new(2, 255).unwrap();
        assert_eq!(reciter_info_key(7), "reciters/7/info.json");
        assert_eq!(chapter_list_key(7), "reciters/7/chapters/chapter_list.json");
        assert_eq!(chapter_audio_key(7, 18), "reciters/7/chapters/18.mp3");
        assert_eq!(
            segment_document_key(7, SegmentScheme::Chapter, 2),
            "reciters/7/verses/chapter/2.json"
        );
        assert_eq!(
            segment_document_key(7, SegmentScheme::Rub, 240),
            "reciters/7/verses/rub/240.json"
        );
        assert_eq!(
            ayah_audio_key(7, verse),
            "reciters/7/verses/ayah/2_255.mp3"
        );
    }

    #[test]
    fn test_translation_keys() {
        assert_eq!(translation_info_key(131), "translations/131/info.json");
        assert_eq!(
            translation_chapter_key(131, 114),
            "translations/131/chapters/114.json"
        );
        assert_eq!(
            public_path(TRANSLATION_LIST_KEY),
            "/translations/translation_list.json"
        );
    }

    #[test]
    fn test_public_path_has_single_leading_slash() {
        assert_eq!(public_path("reciters/1/info.json"), "/reciters/1/info.json");
        assert_eq!(public_path("/reciters/1/info.json"), "/reciters/1/info.json");
    }
}
