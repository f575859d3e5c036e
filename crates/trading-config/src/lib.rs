//! Configuration management.

mod settings;

pub use settings::{AppConfig, AppSettings, DataSettings, LoggingConfig, SweepSettings};

use config::{Config, ConfigError, Environment, File};
use std::path::Path;
use thiserror::Error;
use trading_core::error::StrategyError;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] StrategyError),

    #[error("Invalid sweep settings: {0}")]
    Sweep(String),

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Load configuration from file and environment.
///
/// Environment variables prefixed `TRADING__` override file values, with
/// `__` separating nested keys (`TRADING__BACKTEST__QTY_PCT=50`).
pub fn load_config(path: &Path) -> Result<AppConfig, SettingsError> {
    let config = Config::builder()
        .add_source(File::from(path).required(true))
        .add_source(
            Environment::with_prefix("TRADING")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let app: AppConfig = config.try_deserialize()?;
    validate(&app)?;
    Ok(app)
}

/// Load the file at `path` if it exists, otherwise fall back to defaults
/// (still honoring environment overrides).
pub fn load_or_default(path: &Path) -> Result<AppConfig, SettingsError> {
    if path.exists() {
        return load_config(path);
    }

    let config = Config::builder()
        .add_source(Config::try_from(&AppConfig::default())?)
        .add_source(
            Environment::with_prefix("TRADING")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let app: AppConfig = config.try_deserialize()?;
    validate(&app)?;
    Ok(app)
}

/// Check every section that a run depends on.
pub fn validate(app: &AppConfig) -> Result<(), SettingsError> {
    app.backtest.validate()?;

    let grid = &app.sweep.grid;
    if grid.size() == 0 {
        return Err(SettingsError::Sweep("every grid axis needs at least one value".into()));
    }
    if !app.sweep.max_drawdown.is_finite() || app.sweep.max_drawdown < 0.0 {
        return Err(SettingsError::Sweep("max_drawdown must be non-negative".into()));
    }
    Ok(())
}

/// Render a configuration as TOML.
pub fn to_toml(app: &AppConfig) -> Result<String, SettingsError> {
    Ok(toml::to_string_pretty(app)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use trading_core::types::Timeframe;
    use trading_strategies::MaTouchConfig;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let file = write_config(
            r#"
            [backtest]
            initial_capital = 5000.0

            [backtest.strategy]
            ma_fast_len = 10
            ma_type = "EMA"
            "#,
        );
        let app = load_config(file.path()).unwrap();

        assert_eq!(app.backtest.initial_capital, 5000.0);
        assert_eq!(app.backtest.qty_pct, 100.0);
        assert_eq!(app.backtest.strategy.ma_fast_len, 10);
        assert_eq!(app.backtest.strategy.ma_slow_len, MaTouchConfig::default().ma_slow_len);
        assert_eq!(app.data.timeframe, Timeframe::Hour1);
        assert_eq!(app.data.tz, "UTC");
        assert_eq!(app.sweep.top, 5);
    }

    #[test]
    fn test_window_and_grid() {
        let file = write_config(
            r#"
            [data]
            tz = "Asia/Tokyo"

            [backtest]
            start = "2025-01-01T00:00:00Z"
            end = "2026-02-28T00:00:00Z"

            [sweep]
            max_drawdown = 8000.0

            [sweep.grid]
            ma_fast_lens = [5, 10]
            ma_slow_lens = [30]
            supertrend_factors = [2.5]
            "#,
        );
        let app = load_config(file.path()).unwrap();

        let start = app.backtest.start.unwrap();
        assert_eq!(start.timestamp_millis(), 1_735_689_600_000);
        assert!(app.backtest.end.is_some());
        assert_eq!(app.sweep.grid.ma_fast_lens, vec![5, 10]);
        assert_eq!(app.sweep.grid.supertrend_factors, vec![2.5]);
        assert_eq!(app.sweep.max_drawdown, 8000.0);
        assert_eq!(app.data.tz, "Asia/Tokyo");
    }

    #[test]
    fn test_invalid_values_rejected() {
        let file = write_config("[backtest.strategy]\nsupertrend_factor = -2.0\n");
        assert!(matches!(load_config(file.path()), Err(SettingsError::Invalid(_))));

        let file = write_config("[sweep.grid]\nma_types = []\n");
        assert!(matches!(load_config(file.path()), Err(SettingsError::Sweep(_))));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(load_config(Path::new("/nonexistent/config.toml")).is_err());
    }

    #[test]
    fn test_defaults_without_file() {
        let app = load_or_default(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(app.backtest, trading_backtest::BacktestConfig::default());
    }

    #[test]
    fn test_toml_rendering_reloads() {
        let text = to_toml(&AppConfig::default()).unwrap();
        assert!(text.contains("[backtest.strategy]"));

        let file = write_config(&text);
        let app = load_config(file.path()).unwrap();
        assert_eq!(app.sweep, AppConfig::default().sweep);
        assert_eq!(app.backtest.strategy, AppConfig::default().backtest.strategy);
    }
}
