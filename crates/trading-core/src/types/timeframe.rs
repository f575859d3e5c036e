//! Timeframe definitions for market data.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Timeframe for bars/candles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Timeframe {
    /// 1 minute bars
    #[serde(rename = "1m")]
    Minute1,
    /// 5 minute bars
    #[serde(rename = "5m")]
    Minute5,
    /// 15 minute bars
    #[serde(rename = "15m")]
    Minute15,
    /// 30 minute bars
    #[serde(rename = "30m")]
    Minute30,
    /// 1 hour bars
    #[serde(rename = "1h")]
    #[default]
    Hour1,
    /// 4 hour bars
    #[serde(rename = "4h")]
    Hour4,
    /// Daily bars
    #[serde(rename = "1d")]
    Daily,
    /// Weekly bars
    #[serde(rename = "1w")]
    Weekly,
    /// Monthly bars
    #[serde(rename = "1M")]
    Monthly,
}

impl Timeframe {
    /// Bar width in milliseconds, or `None` for calendar timeframes
    /// (weeks and months have no epoch-aligned fixed width).
    pub fn fixed_millis(&self) -> Option<i64> {
        const MINUTE: i64 = 60_000;
        let minutes = match self {
            Timeframe::Minute1 => 1,
            Timeframe::Minute5 => 5,
            Timeframe::Minute15 => 15,
            Timeframe::Minute30 => 30,
            Timeframe::Hour1 => 60,
            Timeframe::Hour4 => 240,
            Timeframe::Daily => 1440,
            Timeframe::Weekly | Timeframe::Monthly => return None,
        };
        Some(minutes * MINUTE)
    }

    pub fn is_fixed_length(&self) -> bool {
        self.fixed_millis().is_some()
    }

    /// Start (Unix ms) of the bucket containing `timestamp_ms`.
    pub fn bucket_start(&self, timestamp_ms: i64) -> Option<i64> {
        let width = self.fixed_millis()?;
        Some(timestamp_ms.div_euclid(width) * width)
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Timeframe::Minute1 => "1m",
            Timeframe::Minute5 => "5m",
            Timeframe::Minute15 => "15m",
            Timeframe::Minute30 => "30m",
            Timeframe::Hour1 => "1h",
            Timeframe::Hour4 => "4h",
            Timeframe::Daily => "1d",
            Timeframe::Weekly => "1w",
            Timeframe::Monthly => "1M",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // "1M" is the only case-sensitive spelling.
        if s == "1M" {
            return Ok(Timeframe::Monthly);
        }
        match s.to_lowercase().as_str() {
            "1m" | "1min" | "1t" | "minute" => Ok(Timeframe::Minute1),
            "5m" | "5min" | "5t" => Ok(Timeframe::Minute5),
            "15m" | "15min" | "15t" => Ok(Timeframe::Minute15),
            "30m" | "30min" | "30t" => Ok(Timeframe::Minute30),
            "1h" | "60min" | "1hour" | "hour" => Ok(Timeframe::Hour1),
            "4h" | "240min" | "4hour" => Ok(Timeframe::Hour4),
            "1d" | "d" | "day" | "daily" => Ok(Timeframe::Daily),
            "1w" | "w" | "week" | "weekly" => Ok(Timeframe::Weekly),
            "month" | "monthly" => Ok(Timeframe::Monthly),
            _ => Err(format!("Invalid timeframe: {}", s)),
        }
    }
}
