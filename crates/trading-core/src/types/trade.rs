//! Closed-trade records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::Side;

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExitReason {
    /// Fast MA turned against the position
    TakeProfitMATurn,
    /// Supertrend flipped against the position
    StopLossTrendFlip,
    /// Short closed by a buy signal
    ReverseToLong,
    /// Long closed by a sell signal
    ReverseToShort,
    /// Still open after the last bar
    FinalClose,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::TakeProfitMATurn => "TakeProfitMATurn",
            ExitReason::StopLossTrendFlip => "StopLossTrendFlip",
            ExitReason::ReverseToLong => "ReverseToLong",
            ExitReason::ReverseToShort => "ReverseToShort",
            ExitReason::FinalClose => "FinalClose",
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExitReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "TakeProfitMATurn" => Ok(ExitReason::TakeProfitMATurn),
            "StopLossTrendFlip" => Ok(ExitReason::StopLossTrendFlip),
            "ReverseToLong" => Ok(ExitReason::ReverseToLong),
            "ReverseToShort" => Ok(ExitReason::ReverseToShort),
            "FinalClose" => Ok(ExitReason::FinalClose),
            other => Err(format!("Invalid exit reason: {}", other)),
        }
    }
}

/// Record of a single closed trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    /// Exit time
    pub timestamp: DateTime<Utc>,
    /// Entry time
    pub entry_time: DateTime<Utc>,
    pub side: Side,
    pub entry_price: f64,
    pub exit_price: f64,
    pub units: f64,
    pub pnl: f64,
    pub reason: ExitReason,
}

impl TradeRecord {
    pub fn is_win(&self) -> bool {
        self.pnl > 0.0
    }
}
