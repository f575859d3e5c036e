//! CLI command implementations.

pub mod aggregate;
pub mod backtest;
pub mod resample;
pub mod sweep;
pub mod validate;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use std::path::{Path, PathBuf};
use tracing::info;
use trading_config::{load_or_default, AppConfig};
use trading_core::types::Bar;
use trading_data::{load_csv, parse_datetime_text};

/// Load the configuration, falling back to defaults when the file is absent.
pub(crate) fn load_app_config(path: &Path) -> Result<AppConfig> {
    load_or_default(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}

/// Parse a window bound given on the command line.
pub(crate) fn parse_bound(value: &str) -> Result<DateTime<Utc>> {
    let millis = parse_datetime_text(value)
        .ok_or_else(|| anyhow!("Unrecognized date '{}' (expected YYYY-MM-DD or RFC 3339)", value))?;
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| anyhow!("Date '{}' is out of range", value))
}

/// Pick the bar CSV from the command line or the config.
pub(crate) fn resolve_data_path(arg: Option<&Path>, app: &AppConfig) -> Result<PathBuf> {
    let path = match (arg, app.data.bars.as_deref()) {
        (Some(path), _) => path.to_path_buf(),
        (None, Some(path)) => PathBuf::from(path),
        (None, None) => bail!("Please provide a bar CSV with --data (or set data.bars in the config)"),
    };
    if !path.is_file() {
        bail!("Data file '{}' does not exist", path.display());
    }
    Ok(path)
}

pub(crate) async fn load_bars(path: &Path) -> Result<Vec<Bar>> {
    let bars = load_csv(path)
        .await
        .with_context(|| format!("Failed to load bars from {}", path.display()))?;
    info!("Loaded {} bars from {}", bars.len(), path.display());
    Ok(bars)
}
