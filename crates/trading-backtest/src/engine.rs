//! Backtesting engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use trading_core::error::{StrategyError, TradingError};
use trading_core::traits::{MarginModel, StrategyConfig};
use trading_core::types::{Bar, ExitReason, Side};
use trading_strategies::{build_frames, MaTouchConfig, MaTouchStrategy, PriceGranularity};

use crate::report::{BacktestReport, RunStatus};
use crate::state::TradingState;
use crate::statistics::{EquityPoint, PerformanceSummary};

/// Backtest configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    /// Initial capital
    pub initial_capital: f64,
    /// Percent of equity committed per entry
    pub qty_pct: f64,
    /// Strategy parameters
    pub strategy: MaTouchConfig,
    /// Inclusive start of the evaluated window
    pub start: Option<DateTime<Utc>>,
    /// Inclusive end of the evaluated window
    pub end: Option<DateTime<Utc>>,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_capital: 100_000.0,
            qty_pct: 100.0,
            strategy: MaTouchConfig::default(),
            start: None,
            end: None,
        }
    }
}

impl BacktestConfig {
    pub fn validate(&self) -> Result<(), StrategyError> {
        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return Err(StrategyError::InvalidConfig(
                "Initial capital must be positive".into(),
            ));
        }
        if !self.qty_pct.is_finite() || self.qty_pct <= 0.0 {
            return Err(StrategyError::InvalidConfig(
                "qty_pct must be positive".into(),
            ));
        }
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if start > end {
                return Err(StrategyError::InvalidConfig(format!(
                    "Window start {} is after end {}",
                    start, end
                )));
            }
        }
        self.strategy.validate()
    }

    /// Bars inside the configured window.
    pub fn window<'a>(&self, bars: &'a [Bar]) -> &'a [Bar] {
        let from = match self.start {
            Some(start) => bars.partition_point(|b| b.timestamp < start.timestamp_millis()),
            None => 0,
        };
        let to = match self.end {
            Some(end) => bars.partition_point(|b| b.timestamp <= end.timestamp_millis()),
            None => bars.len(),
        };
        &bars[from..to.max(from)]
    }
}

/// Backtesting engine.
///
/// A run is a pure function of the bars and the configuration; the engine
/// holds no state between runs.
pub struct BacktestEngine {
    config: BacktestConfig,
    margin_model: Box<dyn MarginModel>,
}

impl BacktestEngine {
    /// Create a new backtest engine with the price-granularity margin model.
    pub fn new(config: BacktestConfig) -> Self {
        Self {
            config,
            margin_model: Box::new(PriceGranularity::default()),
        }
    }

    /// Replace the touch-margin model.
    pub fn with_margin_model(mut self, model: Box<dyn MarginModel>) -> Self {
        self.margin_model = model;
        self
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Run a backtest over bars sorted ascending by timestamp.
    pub fn run(&self, bars: &[Bar]) -> Result<BacktestReport, TradingError> {
        self.config.validate()?;

        let bars = self.config.window(bars);
        let strategy_config = &self.config.strategy;
        let required = strategy_config.warmup_period();

        if !strategy_config.is_warmed_up(bars.len()) {
            return Ok(self.insufficient(required, bars.len()));
        }

        let frames = build_frames(bars, strategy_config)?;
        if frames.len() < 2 {
            return Ok(self.insufficient(required, bars.len()));
        }

        let closes: Vec<f64> = frames.iter().map(|f| f.bar.close).collect();
        let margin = self
            .margin_model
            .margin(&closes, strategy_config.touch_margin_pips);
        let strategy = MaTouchStrategy::new(strategy_config.clone(), margin);

        info!(
            "Running {} backtest: {} bars, {} frames, margin {:.6} ({})",
            strategy.name(),
            bars.len(),
            frames.len(),
            margin,
            self.margin_model.name()
        );

        let qty_pct = self.config.qty_pct;
        let mut state = TradingState::new(self.config.initial_capital);
        let mut trades = Vec::new();
        let mut equity_curve = Vec::with_capacity(frames.len() - 1);

        for pair in frames.windows(2) {
            let (prev, cur) = (&pair[0], &pair[1]);
            let price = cur.bar.close;
            let ts = cur.bar.timestamp;

            let (armed, signals) = strategy.evaluate(prev, cur, state.side(), state.armed);
            state.armed = armed;

            // Long block, then short block
            if signals.buy {
                trades.extend(state.enter(Side::Long, price, ts, qty_pct));
                state.armed.long = false;
            } else if let Some(reason) = signals.exit_long {
                if state.is_long() {
                    trades.extend(state.close(price, ts, reason));
                }
            }

            if signals.sell {
                trades.extend(state.enter(Side::Short, price, ts, qty_pct));
                state.armed.short = false;
            } else if let Some(reason) = signals.exit_short {
                if state.is_short() {
                    trades.extend(state.close(price, ts, reason));
                }
            }

            equity_curve.push(EquityPoint {
                timestamp: ts,
                equity: state.mark_to_market(price),
            });
        }

        if let Some(last) = frames.last() {
            if let Some(trade) = state.close(last.bar.close, last.bar.timestamp, ExitReason::FinalClose) {
                debug!("Force-closed {} at end of data", trade.side);
                trades.push(trade);
            }
        }

        let equity_values: Vec<f64> = equity_curve.iter().map(|p| p.equity).collect();
        let summary = PerformanceSummary::compute(
            self.config.initial_capital,
            state.equity,
            &trades,
            &equity_values,
        );

        info!(
            "Backtest complete: {} trades, net {:.2} ({:.2}%), max drawdown {:.2}",
            summary.total_trades, summary.net_pnl, summary.net_pct, summary.max_drawdown
        );

        Ok(BacktestReport {
            config: self.config.clone(),
            status: RunStatus::Completed,
            margin,
            summary,
            trades,
            equity_curve,
        })
    }

    fn insufficient(&self, required: usize, available: usize) -> BacktestReport {
        info!(
            "Insufficient data: {} bars available, {} required",
            available, required
        );
        BacktestReport {
            config: self.config.clone(),
            status: RunStatus::InsufficientData {
                required,
                available,
            },
            margin: 0.0,
            summary: PerformanceSummary::neutral(self.config.initial_capital),
            trades: Vec::new(),
            equity_curve: Vec::new(),
        }
    }
}
