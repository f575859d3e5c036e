//! CSV bar source.

use chrono_tz::Tz;
use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use serde::Serialize;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use trading_core::error::DataError;
use trading_core::types::{sort_and_dedup, Bar};

use crate::columns::{find_column, parse_timestamp_column, require_column};

const TIMESTAMP_COLUMNS: &[&str] = &["timestamp", "time", "datetime", "date"];
const VOLUME_COLUMNS: &[&str] = &["volume", "vol", "tickvolume"];

/// CSV data source for historical bars.
///
/// Column names are matched case- and punctuation-insensitively. Output is
/// sorted ascending with duplicate timestamps collapsed (last wins).
pub struct CsvDataSource {
    path: PathBuf,
}

impl CsvDataSource {
    /// Create a new CSV data source.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DataError::NoDataAvailable);
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all bars from the CSV file.
    pub async fn load_all(&self) -> Result<Vec<Bar>, DataError> {
        let bytes = tokio::fs::read(&self.path).await?;
        let bars = parse_bars(bytes.as_slice())?;
        info!("Loaded {} bars from {}", bars.len(), self.path.display());
        Ok(bars)
    }
}

/// Parse bars from CSV text.
pub fn parse_bars<R: Read>(reader: R) -> Result<Vec<Bar>, DataError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| DataError::ParseError(e.to_string()))?
        .iter()
        .map(String::from)
        .collect();

    let ts_col = require_column(&headers, "timestamp", TIMESTAMP_COLUMNS)?;
    let open_col = require_column(&headers, "open", &["open"])?;
    let high_col = require_column(&headers, "high", &["high"])?;
    let low_col = require_column(&headers, "low", &["low"])?;
    let close_col = require_column(&headers, "close", &["close"])?;
    let volume_col = find_column(&headers, VOLUME_COLUMNS);

    let records: Vec<StringRecord> = rdr
        .records()
        .collect::<Result<_, _>>()
        .map_err(|e| DataError::ParseError(e.to_string()))?;

    let raw_times: Vec<&str> = records.iter().map(|r| r.get(ts_col).unwrap_or("")).collect();
    let timestamps = parse_timestamp_column(&raw_times)?;

    let mut bars = Vec::with_capacity(records.len());
    for (i, (record, timestamp)) in records.iter().zip(timestamps).enumerate() {
        let row = i + 1;
        let volume = match volume_col {
            Some(col) => parse_field(record, col, "volume", row).unwrap_or(0.0),
            None => 0.0,
        };
        bars.push(Bar::new(
            timestamp,
            parse_field(record, open_col, "open", row)?,
            parse_field(record, high_col, "high", row)?,
            parse_field(record, low_col, "low", row)?,
            parse_field(record, close_col, "close", row)?,
            volume,
        ));
    }

    sort_and_dedup(&mut bars);
    Ok(bars)
}

fn parse_field(record: &StringRecord, col: usize, name: &str, row: usize) -> Result<f64, DataError> {
    let raw = record.get(col).unwrap_or("");
    raw.parse::<f64>().map_err(|_| {
        DataError::ParseError(format!("Invalid {} value '{}' in row {}", name, raw, row))
    })
}

#[derive(Serialize)]
struct BarRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

/// Write bars as CSV with RFC 3339 timestamps carrying `tz`'s offset.
pub fn write_bars<W: Write>(writer: W, bars: &[Bar], tz: &Tz) -> Result<(), DataError> {
    let mut wtr = WriterBuilder::new().from_writer(writer);
    for bar in bars {
        wtr.serialize(BarRow {
            timestamp: bar.datetime().with_timezone(tz).to_rfc3339(),
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
        })
        .map_err(|e| DataError::ParseError(e.to_string()))?;
    }
    wtr.flush()?;
    Ok(())
}
