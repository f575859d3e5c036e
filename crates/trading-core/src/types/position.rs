//! Position types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of an open position or of a closed trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// Get the opposite side.
    pub fn opposite(&self) -> Self {
        match self {
            Side::Long => Side::Short,
            Side::Short => Side::Long,
        }
    }

    /// Profit of moving `units` from `entry` to `exit` on this side.
    #[inline]
    pub fn pnl(&self, entry: f64, exit: f64, units: f64) -> f64 {
        match self {
            Side::Long => (exit - entry) * units,
            Side::Short => (entry - exit) * units,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => write!(f, "LONG"),
            Side::Short => write!(f, "SHORT"),
        }
    }
}

impl std::str::FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "LONG" => Ok(Side::Long),
            "SHORT" => Ok(Side::Short),
            other => Err(format!("Invalid side: {}", other)),
        }
    }
}

/// The single open position of a run.
///
/// Units and entry price only exist while a position is open, so a flat
/// book is represented by the absence of this value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpenPosition {
    /// Long or short
    pub side: Side,
    /// Position size (non-negative magnitude)
    pub units: f64,
    /// Fill price of the entry
    pub entry_price: f64,
    /// Entry time (Unix ms)
    pub entry_time: i64,
}

impl OpenPosition {
    /// Open a position.
    pub fn new(side: Side, units: f64, entry_price: f64, entry_time: i64) -> Self {
        Self {
            side,
            units,
            entry_price,
            entry_time,
        }
    }

    /// Unrealized P&L at the given price.
    #[inline]
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.side.pnl(self.entry_price, price, self.units)
    }

    pub fn is_long(&self) -> bool {
        self.side == Side::Long
    }

    pub fn is_short(&self) -> bool {
        self.side == Side::Short
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_pnl() {
        assert_eq!(Side::Long.pnl(100.0, 110.0, 2.0), 20.0);
        assert_eq!(Side::Short.pnl(100.0, 110.0, 2.0), -20.0);
        assert_eq!(Side::Long.opposite(), Side::Short);
    }

    #[test]
    fn test_side_parse_and_display() {
        assert_eq!("long".parse::<Side>().unwrap(), Side::Long);
        assert_eq!(Side::Short.to_string(), "SHORT");
        assert!("flat".parse::<Side>().is_err());
    }

    #[test]
    fn test_unrealized_pnl() {
        let pos = OpenPosition::new(Side::Short, 10.0, 150.0, 0);
        assert!((pos.unrealized_pnl(149.5) - 5.0).abs() < 1e-12);
        assert!(pos.is_short());
    }
}
