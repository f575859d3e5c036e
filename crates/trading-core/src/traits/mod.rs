//! Core traits for the backtester.

mod indicator;
mod margin;
mod strategy;

pub use indicator::{BarIndicator, Indicator};
pub use margin::MarginModel;
pub use strategy::StrategyConfig;
