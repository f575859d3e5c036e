//! Header matching and timestamp parsing shared by the CSV readers.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use trading_core::error::DataError;

/// Lowercase a header and keep only alphanumerics.
pub fn normalize_name(name: &str) -> String {
    name.trim()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Index of the first header matching a candidate, in candidate order.
pub fn find_column(headers: &[String], candidates: &[&str]) -> Option<usize> {
    let normalized: Vec<String> = headers.iter().map(|h| normalize_name(h)).collect();
    candidates
        .iter()
        .find_map(|cand| normalized.iter().position(|h| h == cand))
}

/// Like [`find_column`], but a missing column is an error.
pub fn require_column(headers: &[String], column: &str, candidates: &[&str]) -> Result<usize, DataError> {
    find_column(headers, candidates).ok_or_else(|| DataError::MissingColumn {
        column: column.to_string(),
        available: headers.join(", "),
    })
}

/// Epoch values above this are taken as milliseconds, below as seconds.
const MILLIS_THRESHOLD: f64 = 1e11;

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
    "%Y.%m.%d %H:%M:%S%.f",
    "%Y.%m.%d %H:%M",
    "%Y%m%d %H:%M:%S%.f",
];

const OFFSET_DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d"];

/// Parse one textual timestamp to Unix milliseconds.
///
/// Values without an offset are taken as UTC.
pub fn parse_datetime_text(value: &str) -> Option<i64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.timestamp_millis());
    }
    for format in OFFSET_DATETIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, format) {
            return Some(dt.timestamp_millis());
        }
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(value, format) {
            return d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().timestamp_millis());
        }
    }

    None
}

/// Convert a numeric epoch column to milliseconds, detecting the unit from
/// the largest magnitude.
pub fn epoch_to_millis(values: &[f64]) -> Vec<i64> {
    let max_abs = values.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    let scale = if max_abs > MILLIS_THRESHOLD { 1.0 } else { 1000.0 };
    values.iter().map(|v| (v * scale).round() as i64).collect()
}

/// Parse a whole timestamp column.
///
/// A column where every value is numeric is read as epoch seconds or
/// milliseconds; anything else must parse as a date-time. A single bad
/// value fails the column. `row` in the error is 1-based over data rows.
pub fn parse_timestamp_column(values: &[&str]) -> Result<Vec<i64>, DataError> {
    let numeric: Option<Vec<f64>> = values
        .iter()
        .map(|v| v.trim().parse::<f64>().ok().filter(|n| n.is_finite()))
        .collect();

    if let Some(numbers) = numeric {
        if !numbers.is_empty() {
            return Ok(epoch_to_millis(&numbers));
        }
    }

    values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            parse_datetime_text(v).ok_or_else(|| DataError::UnparseableTimestamp {
                row: i + 1,
                value: v.to_string(),
            })
        })
        .collect()
}
