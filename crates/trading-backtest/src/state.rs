//! Position state machine.

use chrono::{DateTime, Utc};
use tracing::debug;
use trading_core::types::{ExitReason, OpenPosition, Side, TradeRecord};
use trading_strategies::ArmedFlags;

/// State threaded through one walk.
///
/// Equity is realized equity: it only changes when a position is closed.
#[derive(Debug, Clone, PartialEq)]
pub struct TradingState {
    pub position: Option<OpenPosition>,
    pub equity: f64,
    pub armed: ArmedFlags,
}

impl TradingState {
    pub fn new(initial_capital: f64) -> Self {
        Self {
            position: None,
            equity: initial_capital,
            armed: ArmedFlags::default(),
        }
    }

    /// Side of the open position, `None` when flat.
    pub fn side(&self) -> Option<Side> {
        self.position.map(|p| p.side)
    }

    pub fn is_flat(&self) -> bool {
        self.position.is_none()
    }

    pub fn is_long(&self) -> bool {
        self.side() == Some(Side::Long)
    }

    pub fn is_short(&self) -> bool {
        self.side() == Some(Side::Short)
    }

    /// Open a position sized from current equity.
    ///
    /// Must only be called while flat.
    pub fn open(&mut self, side: Side, price: f64, timestamp: i64, qty_pct: f64) {
        debug_assert!(self.is_flat());
        let units = if price > 0.0 {
            self.equity * qty_pct / 100.0 / price
        } else {
            0.0
        };
        debug!("open {} {:.6} units @ {:.5} (equity {:.2})", side, units, price, self.equity);
        self.position = Some(OpenPosition::new(side, units, price, timestamp));
    }

    /// Close the open position, realizing its pnl into equity.
    pub fn close(&mut self, price: f64, timestamp: i64, reason: ExitReason) -> Option<TradeRecord> {
        let position = self.position.take()?;
        let pnl = position.unrealized_pnl(price);
        self.equity += pnl;

        debug!(
            "close {} @ {:.5} pnl {:.2} ({}), equity {:.2}",
            position.side, price, pnl, reason, self.equity
        );

        Some(TradeRecord {
            timestamp: to_datetime(timestamp),
            entry_time: to_datetime(position.entry_time),
            side: position.side,
            entry_price: position.entry_price,
            exit_price: price,
            units: position.units,
            pnl,
            reason,
        })
    }

    /// Enter `side`, first closing an opposite position.
    ///
    /// The two steps are ordered: the opposite trade is realized, then the
    /// new position is sized from the updated equity. Returns the reversal
    /// trade if one was closed. Already holding `side` is a no-op.
    pub fn enter(&mut self, side: Side, price: f64, timestamp: i64, qty_pct: f64) -> Option<TradeRecord> {
        if self.side() == Some(side) {
            return None;
        }

        let reason = match side {
            Side::Long => ExitReason::ReverseToLong,
            Side::Short => ExitReason::ReverseToShort,
        };
        let reversal = self.close(price, timestamp, reason);
        self.open(side, price, timestamp, qty_pct);
        reversal
    }

    /// Realized equity plus the open position valued at `price`.
    pub fn mark_to_market(&self, price: f64) -> f64 {
        self.equity + self.position.map_or(0.0, |p| p.unrealized_pnl(price))
    }
}

fn to_datetime(timestamp: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(timestamp).unwrap_or(DateTime::UNIX_EPOCH)
}
