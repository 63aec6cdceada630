//! Recitation Mirror Core Library
//!
//! This library builds a static, file-addressable mirror of Quran recitation
//! audio, verse indexes and translation text from a remote JSON API.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`quran`] - Verse keys, the fixed verse-count table, segment schemes
//! - [`api`] - Paced, retrying client for the metadata API
//! - [`resolver`] - Turns API responses into validated verse records
//! - [`index`] - Builds the aggregate JSON documents and asset tasks
//! - [`download`] - Asset materializer and bounded concurrent dispatcher
//! - [`sink`] - Local directory and content-repository destinations
//! - [`pipeline`] - One run over all selected reciters and translations
//! - [`layout`] - Destination keys of the mirror tree

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod download;
mod http_client;
pub mod index;
pub mod layout;
pub mod pipeline;
pub mod quran;
pub mod resolver;
pub mod sink;
mod user_agent;

// Re-export commonly used types
pub use api::{ApiClient, ApiError, DEFAULT_API_BASE, Reciter, RetryPolicy, Translation};
pub use download::{
    AssetClient, DEFAULT_CONCURRENCY, DispatchProgress, Dispatcher, DownloadTask, Materializer,
    TaskBatch,
};
pub use http_client::{DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_READ_TIMEOUT_SECS, HttpTimeouts};
pub use pipeline::{
    ContentFilter, MirrorPipeline, PipelineError, PipelineOptions, RunSummary, TranslationSelection,
};
pub use quran::{SegmentScheme, VerseKey};
pub use resolver::{DEFAULT_AUDIO_HOST, SegmentResolver};
pub use sink::{LocalSink, RepoSink, RepoSinkConfig, Sink, SinkError};
