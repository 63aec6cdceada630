//! Segmentation schemes that partition the verse set.

use std::fmt;

/// One of the five ways verses are grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SegmentScheme {
    /// 114 chapters.
    Chapter,
    /// 30 juz.
    Juz,
    /// 60 hizb.
    Hizb,
    /// 240 rub-el-hizb.
    Rub,
    /// 604 mushaf pages.
    Page,
}

impl SegmentScheme {
    /// Schemes whose documents come from per-segment API calls.
    ///
    /// Chapter documents are derived from the flat verse feed instead.
    pub const CROSS_REFERENCE: [Self; 4] = [Self::Juz, Self::Page, Self::Hizb, Self::Rub];

    /// Number of segments in this scheme.
    #[must_use]
    pub fn segment_count(self) -> u16 {
        match self {
            Self::Chapter => 114,
            Self::Juz => 30,
            Self::Hizb => 60,
            Self::Rub => 240,
            Self::Page => 604,
        }
    }

    /// True when `number` is a valid segment number (`1..=segment_count`).
    #[must_use]
    pub fn contains(self, number: u16) -> bool {
        (1..=self.segment_count()).contains(&number)
    }

    /// Lowercase name used for directories and API paths.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Chapter => "chapter",
            Self::Juz => "juz",
            Self::Hizb => "hizb",
            Self::Rub => "rub",
            Self::Page => "page",
        }
    }

    /// Remote sub-path segment, e.g. `by_juz`.
    #[must_use]
    pub fn api_path(self) -> String {
        format!("by_{}", self.as_str())
    }

    /// JSON field carrying the segment number, e.g. `juz_number`.
    #[must_use]
    pub fn number_field(self) -> String {
        format!("{}_number", self.as_str())
    }
}

impl fmt::Display for SegmentScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_counts() {
        assert_eq!(SegmentScheme::Chapter.segment_count(), 114);
        assert_eq!(SegmentScheme::Juz.segment_count(), 30);
        assert_eq!(SegmentScheme::Hizb.segment_count(), 60);
        assert_eq!(SegmentScheme::Rub.segment_count(), 240);
        assert_eq!(SegmentScheme::Page.segment_count(), 604);
    }

    #[test]
    fn test_contains_bounds() {
        assert!(!SegmentScheme::Juz.contains(0));
        assert!(SegmentScheme::Juz.contains(1));
        assert!(SegmentScheme::Juz.contains(30));
        assert!(!SegmentScheme::Juz.contains(31));
        assert!(SegmentScheme::Page.contains(604));
        assert!(!SegmentScheme::Rub.contains(241));
    }

    #[test]
    fn test_api_path_and_number_field() {
        assert_eq!(SegmentScheme::Rub.api_path(), "by_rub");
        assert_eq!(SegmentScheme::Chapter.api_path(), "by_chapter");
        assert_eq!(SegmentScheme::Page.number_field(), "page_number");
    }
}
