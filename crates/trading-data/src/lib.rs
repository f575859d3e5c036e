//! Data sources for the backtester.
//!
//! - Bar CSV ingestion with fuzzy column detection
//! - Tick ingestion (plain, gzipped or zipped files, or whole directories)
//!   and resampling in any IANA time zone
//! - Bar and trade-log CSV persistence

mod columns;
mod csv_source;
mod ticks;
mod trades;

pub use columns::{find_column, normalize_name, parse_datetime_text, parse_timestamp_column};
pub use chrono_tz::Tz;
pub use csv_source::{parse_bars, write_bars, CsvDataSource};
pub use ticks::{
    load_tick_dir, load_tick_file, parse_ticks, parse_time_zone, resample, sniff_delimiter, Tick,
};
pub use trades::{load_trades, read_trades, save_trades, write_trades};

use std::path::Path;
use tracing::info;
use trading_core::error::DataError;
use trading_core::types::Bar;

/// Load bars from a CSV file.
pub async fn load_csv(path: impl AsRef<Path>) -> Result<Vec<Bar>, DataError> {
    let source = CsvDataSource::new(path)?;
    source.load_all().await
}

/// Write bars to a CSV file with timestamps rendered in `tz`, creating
/// parent directories.
pub async fn save_bars(path: impl AsRef<Path>, bars: &[Bar], tz: &Tz) -> Result<(), DataError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut buf = Vec::new();
    write_bars(&mut buf, bars, tz)?;
    tokio::fs::write(path, buf).await?;
    info!("Wrote {} bars to {} ({})", bars.len(), path.display(), tz);
    Ok(())
}
