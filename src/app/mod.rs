//! Application runtime composition modules.

pub(crate) mod config_runtime;
pub(crate) mod context;
pub(crate) mod exit_handler;
pub(crate) mod progress_manager;
pub(crate) mod runtime;
pub(crate) mod target;
pub(crate) mod terminal;
