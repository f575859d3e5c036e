//! Core types and traits for the backtester.
//!
//! This crate provides the foundational building blocks including:
//! - Market data types (Bar, Timeframe)
//! - Position and trade-log types
//! - Core traits for indicators, strategy configuration and touch margins

pub mod types;
pub mod traits;
pub mod error;

pub use error::{TradingError, TradingResult};
pub use types::*;
pub use traits::*;
