//! Trade log persistence.

use csv::{ReaderBuilder, WriterBuilder};
use std::io::{Read, Write};
use std::path::Path;
use tracing::info;
use trading_core::error::DataError;
use trading_core::types::TradeRecord;

/// Write a trade log as CSV, one row per closed trade.
pub fn write_trades<W: Write>(writer: W, trades: &[TradeRecord]) -> Result<(), DataError> {
    let mut wtr = WriterBuilder::new().from_writer(writer);
    for trade in trades {
        wtr.serialize(trade)
            .map_err(|e| DataError::ParseError(e.to_string()))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Read a trade log written by [`write_trades`].
pub fn read_trades<R: Read>(reader: R) -> Result<Vec<TradeRecord>, DataError> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(reader);
    rdr.deserialize()
        .enumerate()
        .map(|(i, row)| {
            row.map_err(|e| DataError::ParseError(format!("Trade row {}: {}", i + 1, e)))
        })
        .collect()
}

/// Save a trade log to a file.
pub async fn save_trades(path: impl AsRef<Path>, trades: &[TradeRecord]) -> Result<(), DataError> {
    let path = path.as_ref();
    let mut buf = Vec::new();
    write_trades(&mut buf, trades)?;
    tokio::fs::write(path, buf).await?;
    info!("Wrote {} trades to {}", trades.len(), path.display());
    Ok(())
}

/// Load a trade log from a file.
pub async fn load_trades(path: impl AsRef<Path>) -> Result<Vec<TradeRecord>, DataError> {
    let bytes = tokio::fs::read(path.as_ref()).await?;
    read_trades(bytes.as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use trading_core::types::{ExitReason, Side};

    fn sample() -> Vec<TradeRecord> {
        vec![
            TradeRecord {
                timestamp: Utc.with_ymd_and_hms(2024, 1, 2, 3, 0, 0).unwrap(),
                entry_time: Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(),
                side: Side::Long,
                entry_price: 150.125,
                exit_price: 151.5,
                units: 666.0,
                pnl: 915.75,
                reason: ExitReason::TakeProfitMATurn,
            },
            TradeRecord {
                timestamp: Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap(),
                entry_time: Utc.with_ymd_and_hms(2024, 1, 2, 3, 0, 0).unwrap(),
                side: Side::Short,
                entry_price: 151.5,
                exit_price: 152.0,
                units: 600.0,
                pnl: -300.0,
                reason: ExitReason::ReverseToLong,
            },
        ]
    }

    #[test]
    fn test_csv_layout() {
        let mut buf = Vec::new();
        write_trades(&mut buf, &sample()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();

        assert_eq!(
            lines.next(),
            Some("timestamp,entry_time,side,entry_price,exit_price,units,pnl,reason")
        );
        let first = lines.next().unwrap();
        assert!(first.starts_with("2024-01-02T03:00:00Z,2024-01-01T09:00:00Z,LONG,"));
        assert!(first.ends_with(",TakeProfitMATurn"));
    }

    #[test]
    fn test_read_back() {
        let mut buf = Vec::new();
        write_trades(&mut buf, &sample()).unwrap();
        assert_eq!(read_trades(buf.as_slice()).unwrap(), sample());
    }

    #[test]
    fn test_bad_row_reports_index() {
        let text = "timestamp,entry_time,side,entry_price,exit_price,units,pnl,reason\n\
                    2024-01-02T03:00:00Z,2024-01-01T09:00:00Z,SIDEWAYS,1,1,1,0,FinalClose\n";
        match read_trades(text.as_bytes()) {
            Err(DataError::ParseError(msg)) => assert!(msg.starts_with("Trade row 1")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trades.csv");
        save_trades(&path, &sample()).await.unwrap();
        assert_eq!(load_trades(&path).await.unwrap().len(), 2);
    }
}
