//! Core data types for the backtester.

mod ohlcv;
mod position;
mod timeframe;
mod trade;

pub use ohlcv::{sort_and_dedup, Bar};
pub use position::{OpenPosition, Side};
pub use timeframe::Timeframe;
pub use trade::{ExitReason, TradeRecord};
