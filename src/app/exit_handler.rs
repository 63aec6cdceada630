//! Exit code logic for the mirror process.
//!
//! Single responsibility: map a finished run to the process exit outcome.

use mirror_core::RunSummary;

use crate::ProcessExit;

/// Failed assets and documents are reported, not fatal; only an interrupt
/// changes the exit outcome of a completed run.
pub(crate) fn determine_exit_outcome(summary: &RunSummary, interrupt_requested: bool) -> ProcessExit {
    if summary.interrupted || interrupt_requested {
        ProcessExit::Interrupted
    } else {
        ProcessExit::Success
    }
}
