//! Asset transfer: tasks, the materializer, and the bounded dispatcher.
//!
//! - [`TaskBatch`] collects one reciter's [`DownloadTask`]s, deduplicated by destination
//! - [`Materializer`] streams one asset into a sink, skipping existing entries
//! - [`Dispatcher`] drains a batch across a fixed-size worker pool

mod client;
mod dispatcher;
mod error;
mod materializer;
mod task;

pub use client::AssetClient;
pub use dispatcher::{
    DEFAULT_CONCURRENCY, DispatchError, DispatchProgress, DispatchReport, Dispatcher,
    MAX_CONCURRENCY, MIN_CONCURRENCY, TaskOutcome,
};
pub use error::DownloadError;
pub use materializer::{Materialize, MaterializeOutcome, Materializer};
pub use task::{DownloadTask, TaskBatch};
