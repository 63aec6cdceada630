//! CLI argument definitions using clap derive macros.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, ValueEnum};

use mirror_core::sink::DEFAULT_REPO_API_BASE;
use mirror_core::{ContentFilter, DEFAULT_API_BASE, DEFAULT_AUDIO_HOST, TranslationSelection};

/// Default mirror root for the local target.
pub const DEFAULT_OUTPUT_DIR: &str = "quran-audio-api";

/// Largest accepted inter-request delay in seconds.
pub const MAX_DELAY_SECS: f64 = 60.0;

/// Mirror Quran recitation audio and verse indexes into a static file tree.
///
/// Reciters, per-chapter and per-segment verse documents, and the audio they
/// reference are written to a local directory or a content repository.
/// Translation text can be mirrored alongside.
#[derive(Parser, Debug, Clone)]
#[command(name = "recitation-mirror")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored log output
    #[arg(long)]
    pub no_color: bool,

    /// Mirror root directory (local target)
    #[arg(short = 'o', long = "output", value_name = "DIR", default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Parallel asset transfers per reciter (1-100)
    #[arg(short = 'c', long, default_value_t = 5, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub concurrency: u8,

    /// Delay after each successful API call, in seconds (0-60)
    #[arg(short = 'd', long, value_name = "SECS", default_value_t = 0.5, value_parser = parse_delay)]
    pub delay: f64,

    /// Attempts per API call before giving up (1-10)
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u8).range(1..=10))]
    pub max_attempts: u8,

    /// Only mirror these reciter ids (comma-separated or repeated)
    #[arg(short = 'r', long = "reciters", value_name = "ID", value_delimiter = ',')]
    pub reciters: Vec<u32>,

    /// Translations to mirror: all, none, or a comma-separated id list
    #[arg(short = 't', long, value_name = "all|none|ID,...", default_value = "none")]
    pub translations: TranslationSelection,

    /// Which output classes to produce
    #[arg(long, value_enum, default_value_t = FilesArg::Both)]
    pub files: FilesArg,

    /// Where to write the mirror
    #[arg(long, value_enum, default_value_t = Target::Local)]
    pub target: Target,

    /// Content repository as owner/name (github target)
    #[arg(long, value_name = "OWNER/NAME")]
    pub repo: Option<RepoSlug>,

    /// Branch to write to (github target)
    #[arg(long, default_value = "main")]
    pub branch: String,

    /// Access token for the content repository (github target)
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Base URL of the recitation API
    #[arg(long, value_name = "URL", default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// Host that relative audio URLs are resolved against
    #[arg(long, value_name = "URL", default_value = DEFAULT_AUDIO_HOST)]
    pub audio_host: String,

    /// Base URL of the content repository API (github target)
    #[arg(long, value_name = "URL", default_value = DEFAULT_REPO_API_BASE)]
    pub repo_api_base: String,
}

/// `--files`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FilesArg {
    /// JSON documents only
    Json,
    /// Audio files only
    Mp3,
    /// Documents and audio
    Both,
}

impl From<FilesArg> for ContentFilter {
    fn from(value: FilesArg) -> Self {
        match value {
            FilesArg::Json => Self::MetadataOnly,
            FilesArg::Mp3 => Self::BinaryOnly,
            FilesArg::Both => Self::Both,
        }
    }
}

/// `--target`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Target {
    /// Local directory
    Local,
    /// Content repository over its REST API
    Github,
}

/// `owner/name`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSlug {
    pub owner: String,
    pub name: String,
}

impl FromStr for RepoSlug {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (owner, name) = value
            .trim()
            .split_once('/')
            .ok_or_else(|| format!("expected OWNER/NAME, got '{value}'"))?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return Err(format!("expected OWNER/NAME, got '{value}'"));
        }
        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

pub(crate) fn parse_delay(value: &str) -> Result<f64, String> {
    let secs: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{value}' is not a number of seconds"))?;
    if !secs.is_finite() || !(0.0..=MAX_DELAY_SECS).contains(&secs) {
        return Err(format!("delay must be between 0 and {MAX_DELAY_SECS} seconds"));
    }
    Ok(secs)
}
