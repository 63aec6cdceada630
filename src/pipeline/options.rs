use std::fmt;
use std::str::FromStr;

use crate::download::DEFAULT_CONCURRENCY;

/// Which classes of output a run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentFilter {
    /// JSON documents only; nothing is dispatched.
    MetadataOnly,
    /// Audio assets only; segment endpoints are not called.
    BinaryOnly,
    /// Documents and assets.
    #[default]
    Both,
}

impl ContentFilter {
    /// True when documents are written.
    #[must_use]
    pub fn includes_metadata(self) -> bool {
        matches!(self, Self::MetadataOnly | Self::Both)
    }

    /// True when assets are dispatched.
    #[must_use]
    pub fn includes_binary(self) -> bool {
        matches!(self, Self::BinaryOnly | Self::Both)
    }

    /// Name used on the command line and in config files.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MetadataOnly => "json",
            Self::BinaryOnly => "mp3",
            Self::Both => "both",
        }
    }
}

impl fmt::Display for ContentFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentFilter {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::MetadataOnly),
            "mp3" => Ok(Self::BinaryOnly),
            "both" => Ok(Self::Both),
            other => Err(format!(
                "unknown content filter '{other}', expected json, mp3 or both"
            )),
        }
    }
}

/// Which translations a run mirrors.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TranslationSelection {
    /// No translations; the listing is never fetched.
    #[default]
    None,
    /// Every listed translation.
    All,
    /// Only these translation ids, in upstream order.
    Ids(Vec<u32>),
}

impl TranslationSelection {
    /// True when at least one translation may be mirrored.
    #[must_use]
    pub fn is_requested(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl fmt::Display for TranslationSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("none"),
            Self::All => f.write_str("all"),
            Self::Ids(ids) => {
                let rendered: Vec<String> = ids.iter().map(ToString::to_string).collect();
                f.write_str(&rendered.join(","))
            }
        }
    }
}

impl FromStr for TranslationSelection {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("none") {
            return Ok(Self::None);
        }
        if trimmed.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        let ids = trimmed
            .split(',')
            .map(|part| {
                part.trim()
                    .parse::<u32>()
                    .map_err(|_| format!("invalid translation id '{}', expected all, none or ID,ID", part.trim()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::Ids(ids))
    }
}

/// Per-run settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Workers per reciter dispatch.
    pub concurrency: usize,
    /// Output classes.
    pub filter: ContentFilter,
    /// Reciter ids to process; empty means all.
    pub reciter_ids: Vec<u32>,
    /// Translations to mirror after the reciters.
    pub translations: TranslationSelection,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            filter: ContentFilter::Both,
            reciter_ids: Vec::new(),
            translations: TranslationSelection::None,
        }
    }
}
