//! Shared runtime context built after CLI/config handling.

use mirror_core::HttpTimeouts;
use url::Url;

use crate::cli::Args;

/// Holds the effective settings so the rest of `run_mirror` can use
/// `ctx.args`, `ctx.audio_host`, etc., instead of passing many arguments.
pub(crate) struct RunContext {
    pub(crate) args: Args,
    pub(crate) http_timeouts: HttpTimeouts,
    pub(crate) audio_host: Url,
}
