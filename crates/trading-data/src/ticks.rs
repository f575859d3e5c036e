//! Tick ingestion and resampling to bars.

use chrono::{Offset, TimeZone, Utc};
use chrono_tz::Tz;
use csv::{ReaderBuilder, StringRecord, Trim};
use flate2::read::GzDecoder;
use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use trading_core::error::DataError;
use trading_core::types::{Bar, Timeframe};

use crate::columns::{epoch_to_millis, find_column, parse_datetime_text};

const TIMESTAMP_COLUMNS: &[&str] = &[
    "timestamp",
    "time",
    "datetime",
    "date",
    "opentime",
    "closetime",
    "unixtime",
    "epochtime",
];
const DATE_COLUMNS: &[&str] = &["date", "tradedate", "businessdate", "day"];
const TIME_COLUMNS: &[&str] = &["time", "tradetime", "timestampms", "hhmmss"];
const BID_COLUMNS: &[&str] = &["bid", "bidprice", "b"];
const ASK_COLUMNS: &[&str] = &["ask", "askprice", "a"];
const PRICE_COLUMNS: &[&str] = &["price", "last", "close", "c", "mid", "midprice"];
const DELIMITERS: &[u8] = b",;\t|";
const TICK_FILE_EXTENSIONS: &[&str] = &["csv", "txt", "tsv", "gz", "zip"];

/// A single price observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    /// Unix timestamp in milliseconds (UTC)
    pub timestamp: i64,
    pub price: f64,
}

/// Pick the delimiter that occurs most often in the header line.
pub fn sniff_delimiter(text: &str) -> u8 {
    let header = text.lines().next().unwrap_or("");
    DELIMITERS
        .iter()
        .copied()
        .map(|d| (d, header.bytes().filter(|b| *b == d).count()))
        .filter(|(_, n)| *n > 0)
        .max_by_key(|(_, n)| *n)
        .map(|(d, _)| d)
        .unwrap_or(b',')
}

enum TimeSource {
    Joined { date: usize, time: usize },
    Single(usize),
}

enum PriceSource {
    Mid { bid: usize, ask: usize },
    Single(usize),
}

/// Parse tick rows from delimited text.
///
/// Rows whose time or price does not parse are dropped; an input where no
/// row survives is an error.
pub fn parse_ticks(text: &str) -> Result<Vec<Tick>, DataError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .delimiter(sniff_delimiter(text))
        .from_reader(text.as_bytes());

    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| DataError::ParseError(e.to_string()))?
        .iter()
        .map(String::from)
        .collect();

    let time_source = match (find_column(&headers, DATE_COLUMNS), find_column(&headers, TIME_COLUMNS)) {
        (Some(date), Some(time)) if date != time => TimeSource::Joined { date, time },
        _ => TimeSource::Single(find_column(&headers, TIMESTAMP_COLUMNS).ok_or_else(|| {
            DataError::MissingColumn {
                column: "timestamp".into(),
                available: headers.join(", "),
            }
        })?),
    };

    let price_source = match (find_column(&headers, BID_COLUMNS), find_column(&headers, ASK_COLUMNS)) {
        (Some(bid), Some(ask)) => PriceSource::Mid { bid, ask },
        _ => PriceSource::Single(find_column(&headers, PRICE_COLUMNS).ok_or_else(|| {
            DataError::MissingColumn {
                column: "price".into(),
                available: headers.join(", "),
            }
        })?),
    };

    let records: Vec<StringRecord> = rdr.records().filter_map(Result::ok).collect();

    let timestamps: Vec<Option<i64>> = match time_source {
        TimeSource::Joined { date, time } => records
            .iter()
            .map(|r| {
                let date = r.get(date)?.replace('.', "-");
                let time = r.get(time)?;
                parse_datetime_text(&format!("{} {}", date, time))
            })
            .collect(),
        TimeSource::Single(col) => single_column_times(&records, col),
    };

    let mut ticks: Vec<Tick> = records
        .iter()
        .zip(timestamps)
        .filter_map(|(record, ts)| {
            let price = match &price_source {
                PriceSource::Mid { bid, ask } => {
                    (parse_number(record, *bid)? + parse_number(record, *ask)?) / 2.0
                }
                PriceSource::Single(col) => parse_number(record, *col)?,
            };
            Some(Tick {
                timestamp: ts?,
                price,
            })
        })
        .collect();

    if ticks.is_empty() {
        return Err(DataError::NoDataAvailable);
    }

    ticks.sort_by_key(|t| t.timestamp);
    Ok(ticks)
}

/// Epoch numbers when every value is numeric, else per-row text parsing.
fn single_column_times(records: &[StringRecord], col: usize) -> Vec<Option<i64>> {
    let numeric: Option<Vec<f64>> = records
        .iter()
        .map(|r| r.get(col).and_then(|v| v.parse::<f64>().ok()).filter(|v| v.is_finite()))
        .collect();

    match numeric {
        Some(values) => epoch_to_millis(&values).into_iter().map(Some).collect(),
        None => records
            .iter()
            .map(|r| r.get(col).and_then(parse_datetime_text))
            .collect(),
    }
}

fn parse_number(record: &StringRecord, col: usize) -> Option<f64> {
    record.get(col)?.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Load ticks from one file.
///
/// `.gz` files are gunzipped and every member of a `.zip` archive is parsed;
/// members that fail are skipped with a warning.
pub async fn load_tick_file(path: impl AsRef<Path>) -> Result<Vec<Tick>, DataError> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await?;

    let mut ticks: Vec<Tick> = Vec::new();
    let mut last_err = None;
    for (name, text) in decode_tick_bytes(path, &bytes)? {
        match parse_ticks(&text) {
            Ok(parsed) => ticks.extend(parsed),
            Err(e) => {
                warn!("Skipping {}: {}", name, e);
                last_err = Some(e);
            }
        }
    }

    if ticks.is_empty() {
        return Err(last_err.unwrap_or(DataError::NoDataAvailable));
    }
    ticks.sort_by_key(|t| t.timestamp);
    Ok(ticks)
}

/// Decompress a tick file into `(name, text)` pairs by extension.
fn decode_tick_bytes(path: &Path, bytes: &[u8]) -> Result<Vec<(String, String)>, DataError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let name = path.display().to_string();

    match extension.as_str() {
        "gz" => {
            let mut text = String::new();
            GzDecoder::new(bytes).read_to_string(&mut text)?;
            Ok(vec![(name, text)])
        }
        "zip" => {
            let zip_err = |e: zip::result::ZipError| DataError::ParseError(format!("{}: {}", name, e));
            let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(zip_err)?;
            let mut members = Vec::with_capacity(archive.len());
            for i in 0..archive.len() {
                let mut member = archive.by_index(i).map_err(zip_err)?;
                if member.is_dir() {
                    continue;
                }
                let mut text = String::new();
                member.read_to_string(&mut text)?;
                members.push((format!("{}:{}", name, member.name()), text));
            }
            Ok(members)
        }
        _ => {
            let text = String::from_utf8(bytes.to_vec())
                .map_err(|e| DataError::ParseError(format!("{}: {}", name, e)))?;
            Ok(vec![(name, text)])
        }
    }
}

/// Load and merge every tick file of a directory.
///
/// Files that fail to load are skipped with a warning. Duplicate timestamps
/// across files keep the tick loaded last.
pub async fn load_tick_dir(dir: impl AsRef<Path>) -> Result<Vec<Tick>, DataError> {
    let dir = dir.as_ref();
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut files: Vec<PathBuf> = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_tick_file = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| TICK_FILE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if path.is_file() && is_tick_file {
            files.push(path);
        }
    }
    files.sort();

    if files.is_empty() {
        return Err(DataError::NoDataAvailable);
    }

    let mut merged: Vec<Tick> = Vec::new();
    for file in &files {
        match load_tick_file(file).await {
            Ok(ticks) => {
                info!("Loaded {} ticks from {}", ticks.len(), file.display());
                merged.extend(ticks);
            }
            Err(e) => warn!("Skipping {}: {}", file.display(), e),
        }
    }

    if merged.is_empty() {
        return Err(DataError::NoDataAvailable);
    }

    merged.sort_by_key(|t| t.timestamp);
    let mut deduped: Vec<Tick> = Vec::with_capacity(merged.len());
    for tick in merged {
        match deduped.last_mut() {
            Some(last) if last.timestamp == tick.timestamp => *last = tick,
            _ => deduped.push(tick),
        }
    }

    info!("Merged {} ticks from {} files", deduped.len(), files.len());
    Ok(deduped)
}

/// Look up an IANA time zone name such as `Asia/Tokyo`.
pub fn parse_time_zone(name: &str) -> Result<Tz, DataError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| DataError::ParseError(format!("Unknown time zone '{}'", name)))
}

/// Offset of `tz` from UTC at `timestamp`, in milliseconds.
fn utc_offset_millis(tz: &Tz, timestamp: i64) -> i64 {
    Utc.timestamp_millis_opt(timestamp)
        .single()
        .map(|dt| tz.offset_from_utc_datetime(&dt.naive_utc()).fix().local_minus_utc() as i64 * 1000)
        .unwrap_or(0)
}

/// Aggregate ticks into OHLC bars; volume is the tick count.
///
/// Buckets are aligned to wall-clock time in `tz` (a daily bar in
/// `Asia/Tokyo` opens at local midnight); bar timestamps stay UTC.
/// Ticks must be sorted by timestamp. Empty buckets produce no bar.
pub fn resample(ticks: &[Tick], timeframe: Timeframe, tz: &Tz) -> Result<Vec<Bar>, DataError> {
    if !timeframe.is_fixed_length() {
        return Err(DataError::InvalidTimeframe(format!(
            "{} has no fixed length",
            timeframe
        )));
    }

    let mut buckets: BTreeMap<i64, Bar> = BTreeMap::new();
    for tick in ticks {
        let offset = utc_offset_millis(tz, tick.timestamp);
        let start = timeframe
            .bucket_start(tick.timestamp + offset)
            .ok_or_else(|| DataError::InvalidTimeframe(timeframe.to_string()))?
            - offset;
        buckets
            .entry(start)
            .and_modify(|bar| {
                bar.high = bar.high.max(tick.price);
                bar.low = bar.low.min(tick.price);
                bar.close = tick.price;
                bar.volume += 1.0;
            })
            .or_insert_with(|| Bar::new(start, tick.price, tick.price, tick.price, tick.price, 1.0));
    }

    Ok(buckets.into_values().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: i64 = 1_704_067_200_000; // 2024-01-01T00:00:00Z
    const MIN: i64 = 60_000;

    #[test]
    fn test_sniff_delimiter() {
        assert_eq!(sniff_delimiter("a;b;c\n1;2;3"), b';');
        assert_eq!(sniff_delimiter("a\tb\tc"), b'\t');
        assert_eq!(sniff_delimiter("a|b"), b'|');
        assert_eq!(sniff_delimiter("single"), b',');
    }

    #[test]
    fn test_bid_ask_mid_with_epoch_millis() {
        let text = "Timestamp;Bid;Ask\n1704067200000;1.0;1.2\n1704067201000;1.1;1.3\n";
        let ticks = parse_ticks(text).unwrap();
        assert_eq!(ticks.len(), 2);
        assert_eq!(ticks[0].timestamp, T0);
        assert!((ticks[0].price - 1.1).abs() < 1e-12);
    }

    #[test]
    fn test_date_and_time_columns_joined() {
        let text = "DATE,TIME,PRICE\n2024.01.01,00:00:05,150.25\n2024.01.01,00:00:10,150.30\n";
        let ticks = parse_ticks(text).unwrap();
        assert_eq!(ticks[0].timestamp, T0 + 5_000);
        assert_eq!(ticks[1].price, 150.30);
    }

    #[test]
    fn test_bad_rows_dropped() {
        let text = "time,last\n2024-01-01 00:00:00,1.5\nnot-a-time,1.6\n2024-01-01 00:00:01,\n";
        let ticks = parse_ticks(text).unwrap();
        assert_eq!(ticks, vec![Tick { timestamp: T0, price: 1.5 }]);
    }

    #[test]
    fn test_no_parseable_rows_is_error() {
        assert!(parse_ticks("time,price\nfoo,bar\n").is_err());
    }

    #[test]
    fn test_missing_price_column() {
        assert!(matches!(
            parse_ticks("time,size\n2024-01-01,3\n"),
            Err(DataError::MissingColumn { column, .. }) if column == "price"
        ));
    }

    #[test]
    fn test_resample_ohlc_and_counts() {
        let ticks = vec![
            Tick { timestamp: T0, price: 1.0 },
            Tick { timestamp: T0 + 10 * MIN, price: 1.5 },
            Tick { timestamp: T0 + 20 * MIN, price: 0.8 },
            Tick { timestamp: T0 + 59 * MIN, price: 1.2 },
            // empty hour in between
            Tick { timestamp: T0 + 150 * MIN, price: 2.0 },
        ];
        let bars = resample(&ticks, Timeframe::Hour1, &Tz::UTC).unwrap();

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0], Bar::new(T0, 1.0, 1.5, 0.8, 1.2, 4.0));
        assert_eq!(bars[1], Bar::new(T0 + 120 * MIN, 2.0, 2.0, 2.0, 2.0, 1.0));
    }

    #[test]
    fn test_resample_rejects_calendar_timeframes() {
        let ticks = vec![Tick { timestamp: T0, price: 1.0 }];
        assert!(matches!(
            resample(&ticks, Timeframe::Monthly, &Tz::UTC),
            Err(DataError::InvalidTimeframe(_))
        ));
        assert!(resample(&ticks, Timeframe::Weekly, &Tz::UTC).is_err());
    }

    #[tokio::test]
    async fn test_directory_merge_skips_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("2024-01.csv"),
            "time,price\n2024-01-01 00:00:00,1.0\n2024-01-01 00:00:01,1.1\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("2024-02.csv"),
            "time,price\n2024-01-01 00:00:01,9.9\n2024-01-01 00:00:02,1.2\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("broken.csv"), "nothing,useful\n1,2\n").unwrap();
        std::fs::write(dir.path().join("notes.md"), "ignored").unwrap();

        let ticks = load_tick_dir(dir.path()).await.unwrap();
        assert_eq!(ticks.len(), 3);
        // duplicate second keeps the later file's tick
        assert_eq!(ticks[1].price, 9.9);
    }

    #[test]
    fn test_daily_buckets_follow_local_midnight() {
        let tokyo = parse_time_zone("Asia/Tokyo").unwrap();
        let ticks = vec![
            Tick { timestamp: T0 + 14 * 60 * MIN, price: 1.0 }, // 23:00 JST
            Tick { timestamp: T0 + 16 * 60 * MIN, price: 2.0 }, // 01:00 JST next day
        ];

        let utc_bars = resample(&ticks, Timeframe::Daily, &Tz::UTC).unwrap();
        assert_eq!(utc_bars.len(), 1);

        let local_bars = resample(&ticks, Timeframe::Daily, &tokyo).unwrap();
        assert_eq!(local_bars.len(), 2);
        assert_eq!(local_bars[0].timestamp, T0 - 9 * 60 * MIN);
        assert_eq!(local_bars[1].timestamp, T0 + 15 * 60 * MIN);
    }

    #[test]
    fn test_half_hour_zone_shifts_hourly_buckets() {
        let kolkata = parse_time_zone("Asia/Kolkata").unwrap();
        let ticks = vec![
            Tick { timestamp: T0 + 20 * MIN, price: 1.0 },
            Tick { timestamp: T0 + 40 * MIN, price: 1.1 },
        ];
        let bars = resample(&ticks, Timeframe::Hour1, &kolkata).unwrap();

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].timestamp, T0 - 30 * MIN);
        assert_eq!(bars[1].timestamp, T0 + 30 * MIN);
    }

    #[test]
    fn test_unknown_time_zone() {
        assert!(matches!(parse_time_zone("Mars/Olympus"), Err(DataError::ParseError(_))));
        assert_eq!(parse_time_zone("UTC").unwrap(), Tz::UTC);
    }

    #[tokio::test]
    async fn test_gzipped_tick_file() {
        use flate2::{write::GzEncoder, Compression};
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(b"time,price\n2024-01-01 00:00:00,1.0\n2024-01-01 00:00:01,1.1\n")
            .unwrap();
        std::fs::write(dir.path().join("2024-01.csv.gz"), encoder.finish().unwrap()).unwrap();

        let ticks = load_tick_dir(dir.path()).await.unwrap();
        assert_eq!(ticks.len(), 2);
        assert_eq!(ticks[0], Tick { timestamp: T0, price: 1.0 });
    }

    #[tokio::test]
    async fn test_zipped_tick_file() {
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default();
        writer.start_file("2024-01.csv", options).unwrap();
        writer
            .write_all(b"time,price\n2024-01-01 00:00:00,1.0\n")
            .unwrap();
        writer.start_file("readme.txt", options).unwrap();
        writer.write_all(b"no ticks here").unwrap();
        writer.start_file("2024-02.csv", options).unwrap();
        writer
            .write_all(b"time,price\n2024-01-01 00:00:02,1.2\n")
            .unwrap();
        let archive = writer.finish().unwrap().into_inner();
        let path = dir.path().join("ticks.zip");
        std::fs::write(&path, archive).unwrap();

        let ticks = load_tick_file(&path).await.unwrap();
        assert_eq!(ticks.len(), 2);
        assert_eq!(ticks[1], Tick { timestamp: T0 + 2_000, price: 1.2 });

        // picked up by the directory filter too
        assert_eq!(load_tick_dir(dir.path()).await.unwrap(), ticks);
    }

    #[tokio::test]
    async fn test_corrupt_gzip_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv.gz");
        std::fs::write(&path, b"not gzip").unwrap();
        assert!(load_tick_file(&path).await.is_err());
    }

    #[tokio::test]
    async fn test_directory_without_ticks_fails() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.csv"), "nothing,useful\n1,2\n").unwrap();
        assert!(load_tick_dir(dir.path()).await.is_err());
    }
}
