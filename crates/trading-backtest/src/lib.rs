//! Backtesting engine.
//!
//! The engine walks indicator frames once, in order, threading a
//! `TradingState` through the MA-touch rules. Runs are independent, which
//! lets the parameter sweep fan them out over a rayon pool.

mod engine;
mod report;
mod state;
mod statistics;
mod sweep;

pub use engine::{BacktestConfig, BacktestEngine};
pub use report::{BacktestReport, RunStatus, TradeLogSummary};
pub use state::TradingState;
pub use statistics::{
    max_drawdown, EquityPoint, PerformanceSummary, ProfitFactor, SideBreakdown,
    INFINITE_PROFIT_FACTOR_RANK,
};
pub use sweep::{ParamGrid, ParamSweep, SweepEntry, SweepResults, DEFAULT_MAX_DRAWDOWN};
