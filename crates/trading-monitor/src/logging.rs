//! Logging setup.
//!
//! Logs go to stderr so that report output on stdout stays machine readable.

use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Crates whose events follow the requested level. Everything else is held
/// at `warn`.
pub const WORKSPACE_TARGETS: &[&str] = &[
    "ha_touch",
    "trading_core",
    "trading_indicators",
    "trading_strategies",
    "trading_backtest",
    "trading_data",
    "trading_config",
    "trading_monitor",
];

/// Build the filter directive string for `level`.
pub fn filter_directives(level: &str) -> String {
    let level = level.trim().to_ascii_lowercase();
    let mut directives = vec!["warn".to_string()];
    directives.extend(WORKSPACE_TARGETS.iter().map(|t| format!("{}={}", t, level)));
    directives.join(",")
}

/// Install the global subscriber. `RUST_LOG` takes precedence over `level`.
///
/// Returns false when a subscriber was already installed.
pub fn setup_logging(level: &str, json: bool) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(level)));

    let result = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
    };
    if result.is_err() {
        return false;
    }
    debug!("Logging initialized at {} ({})", level, if json { "json" } else { "pretty" });
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directives_scope_level_to_workspace() {
        let d = filter_directives(" DEBUG ");
        assert!(d.starts_with("warn,"));
        assert!(d.contains("trading_backtest=debug"));
        assert!(d.contains("ha_touch=debug"));
        assert!(EnvFilter::try_new(&d).is_ok());
    }

    #[test]
    fn test_second_install_is_reported() {
        let first = setup_logging("info", false);
        let second = setup_logging("info", true);
        assert!(!second);
        // the first call may lose to another test thread
        let _ = first;
    }
}
