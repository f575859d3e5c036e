//! Logging setup for the backtester binaries.

mod logging;

pub use logging::{filter_directives, setup_logging, WORKSPACE_TARGETS};
