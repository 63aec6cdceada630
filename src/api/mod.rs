//! Client for the remote recitation metadata API.
//!
//! - [`ApiClient`] - paced GET client returning JSON
//! - [`RetryPolicy`] - exponential backoff between failed attempts
//! - [`Pacer`] - global delay after each successful call
//! - wire types for the endpoints the mirror consumes

mod client;
mod error;
mod pacing;
mod retry;
mod types;

pub use client::{ApiClient, DEFAULT_API_BASE, DEFAULT_PACING_DELAY};
pub use error::ApiError;
pub use pacing::Pacer;
pub use retry::{DEFAULT_MAX_ATTEMPTS, FailureType, RetryDecision, RetryPolicy, classify_error};
pub use types::{
    ChapterAudioFile, ChapterRecitationsResponse, Pagination, RecitationsResponse, Reciter,
    TranslatedVerseText, Translation, TranslationTextResponse, TranslationsResponse,
    VerseAudioFile, VerseAudioResponse,
};
