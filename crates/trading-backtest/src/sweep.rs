//! Parameter sweep over strategy configurations.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::io;
use tracing::{debug, info, warn};
use trading_core::types::Bar;
use trading_indicators::MaType;
use trading_strategies::MaTouchConfig;

use crate::engine::{BacktestConfig, BacktestEngine};
use crate::report::RunStatus;
use crate::statistics::PerformanceSummary;

/// Default drawdown ceiling of the "safe" view, in currency units.
pub const DEFAULT_MAX_DRAWDOWN: f64 = 12_000.0;

/// Values to combine in a parameter sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamGrid {
    pub ma_fast_lens: Vec<usize>,
    pub ma_slow_lens: Vec<usize>,
    pub ma_types: Vec<MaType>,
    pub supertrend_factors: Vec<f64>,
    pub supertrend_periods: Vec<usize>,
    pub touch_margin_pips: Vec<f64>,
}

impl Default for ParamGrid {
    fn default() -> Self {
        Self {
            ma_fast_lens: vec![10, 20, 30],
            ma_slow_lens: vec![50, 100],
            ma_types: vec![MaType::SimpleMovingAverage, MaType::ExponentialMovingAverage],
            supertrend_factors: vec![2.0, 3.0],
            supertrend_periods: vec![10],
            touch_margin_pips: vec![1.0, 2.0, 3.0],
        }
    }
}

impl ParamGrid {
    /// Number of raw combinations, before skipping fast >= slow.
    pub fn size(&self) -> usize {
        self.ma_fast_lens.len()
            * self.ma_slow_lens.len()
            * self.ma_types.len()
            * self.supertrend_factors.len()
            * self.supertrend_periods.len()
            * self.touch_margin_pips.len()
    }

    /// Expand the grid around a base configuration.
    pub fn generate_configs(&self, base: &BacktestConfig) -> Vec<BacktestConfig> {
        let mut configs = Vec::new();

        for &fast in &self.ma_fast_lens {
            for &slow in &self.ma_slow_lens {
                if fast >= slow {
                    continue;
                }
                for &ma_type in &self.ma_types {
                    for &factor in &self.supertrend_factors {
                        for &period in &self.supertrend_periods {
                            for &pips in &self.touch_margin_pips {
                                let mut config = base.clone();
                                config.strategy = MaTouchConfig {
                                    ma_fast_len: fast,
                                    ma_slow_len: slow,
                                    ma_type,
                                    supertrend_factor: factor,
                                    supertrend_period: period,
                                    touch_margin_pips: pips,
                                    ..base.strategy.clone()
                                };
                                configs.push(config);
                            }
                        }
                    }
                }
            }
        }

        configs
    }
}

/// One evaluated configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepEntry {
    pub strategy: MaTouchConfig,
    pub summary: PerformanceSummary,
}

/// Flat CSV row of a sweep entry.
#[derive(Debug, Serialize)]
struct SweepRow {
    fast: usize,
    slow: usize,
    ma_type: String,
    st_factor: f64,
    st_period: usize,
    touch_pips: f64,
    net: f64,
    net_pct: f64,
    dd: f64,
    pf: f64,
    wr: f64,
    trades: usize,
}

impl From<&SweepEntry> for SweepRow {
    fn from(entry: &SweepEntry) -> Self {
        let s = &entry.summary;
        Self {
            fast: entry.strategy.ma_fast_len,
            slow: entry.strategy.ma_slow_len,
            ma_type: entry.strategy.ma_type.to_string(),
            st_factor: entry.strategy.supertrend_factor,
            st_period: entry.strategy.supertrend_period,
            touch_pips: entry.strategy.touch_margin_pips,
            net: s.net_pnl.round(),
            net_pct: round_to(s.net_pct, 3),
            dd: s.max_drawdown.round(),
            pf: round_to(s.profit_factor.ranking_value(), 3),
            wr: round_to(s.win_rate_pct, 2),
            trades: s.total_trades,
        }
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// Parameter sweep executor.
pub struct ParamSweep {
    parallel: bool,
}

impl Default for ParamSweep {
    fn default() -> Self {
        Self::new()
    }
}

impl ParamSweep {
    pub fn new() -> Self {
        Self { parallel: true }
    }

    /// Enables or disables parallel execution.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Run every configuration of the grid against the same bars.
    ///
    /// Failed runs and runs without trades are skipped.
    pub fn sweep(&self, grid: &ParamGrid, base: &BacktestConfig, bars: &[Bar]) -> SweepResults {
        let configs = grid.generate_configs(base);
        info!(
            "Sweeping {} configurations ({} in grid), parallel={}",
            configs.len(),
            grid.size(),
            self.parallel
        );

        let outcomes: Vec<Option<SweepEntry>> = if self.parallel {
            configs.into_par_iter().map(|config| Self::run_one(config, bars)).collect()
        } else {
            configs.into_iter().map(|config| Self::run_one(config, bars)).collect()
        };

        let evaluated = outcomes.len();
        let entries: Vec<SweepEntry> = outcomes.into_iter().flatten().collect();
        info!("Sweep complete: {} of {} configurations kept", entries.len(), evaluated);

        SweepResults {
            skipped: evaluated - entries.len(),
            entries,
        }
    }

    fn run_one(config: BacktestConfig, bars: &[Bar]) -> Option<SweepEntry> {
        let strategy = config.strategy.clone();
        match BacktestEngine::new(config).run(bars) {
            Ok(report) if report.status != RunStatus::Completed => {
                debug!("Skipping {:?}: {:?}", strategy, report.status);
                None
            }
            Ok(report) if report.summary.total_trades == 0 => {
                debug!("Skipping {:?}: no trades", strategy);
                None
            }
            Ok(report) => Some(SweepEntry {
                strategy,
                summary: report.summary,
            }),
            Err(e) => {
                warn!("Skipping {:?}: {}", strategy, e);
                None
            }
        }
    }
}

/// Results from a parameter sweep.
#[derive(Debug, Clone, Default)]
pub struct SweepResults {
    entries: Vec<SweepEntry>,
    skipped: usize,
}

impl SweepResults {
    pub fn new(entries: Vec<SweepEntry>) -> Self {
        Self { entries, skipped: 0 }
    }

    /// Entries in grid order.
    pub fn all(&self) -> &[SweepEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Configurations dropped for failing or not trading.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Best first: net pnl descending, then profit factor descending.
    pub fn ranked(&self) -> Vec<&SweepEntry> {
        let mut ranked: Vec<&SweepEntry> = self.entries.iter().collect();
        ranked.sort_by(|a, b| {
            desc(a.summary.net_pnl, b.summary.net_pnl).then_with(|| {
                desc(
                    a.summary.profit_factor.ranking_value(),
                    b.summary.profit_factor.ranking_value(),
                )
            })
        });
        ranked
    }

    /// Profitable runs within a drawdown ceiling: net descending, then
    /// drawdown ascending.
    pub fn safe(&self, max_drawdown: f64) -> Vec<&SweepEntry> {
        let mut safe: Vec<&SweepEntry> = self
            .entries
            .iter()
            .filter(|e| e.summary.net_pnl > 0.0 && e.summary.max_drawdown <= max_drawdown)
            .collect();
        safe.sort_by(|a, b| {
            desc(a.summary.net_pnl, b.summary.net_pnl)
                .then_with(|| a.summary.max_drawdown.total_cmp(&b.summary.max_drawdown))
        });
        safe
    }

    /// Write the ranked table as CSV.
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut wtr = csv::Writer::from_writer(writer);
        for entry in self.ranked() {
            wtr.serialize(SweepRow::from(entry))?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Render the top `n` entries of a view as a text table.
    pub fn render_table(entries: &[&SweepEntry], n: usize) -> String {
        if entries.is_empty() {
            return "  None\n".to_string();
        }

        let mut s = format!(
            "  {:>4} {:>4} {:>4} {:>5} {:>4} {:>5} {:>12} {:>8} {:>10} {:>8} {:>7} {:>6}\n",
            "fast", "slow", "ma", "st_f", "st_p", "pips", "net", "net%", "dd", "pf", "wr%", "trades"
        );
        for entry in entries.iter().take(n) {
            let row = SweepRow::from(*entry);
            s.push_str(&format!(
                "  {:>4} {:>4} {:>4} {:>5.2} {:>4} {:>5.2} {:>12.0} {:>8.3} {:>10.0} {:>8.3} {:>7.2} {:>6}\n",
                row.fast,
                row.slow,
                row.ma_type,
                row.st_factor,
                row.st_period,
                row.touch_pips,
                row.net,
                row.net_pct,
                row.dd,
                row.pf,
                row.wr,
                row.trades
            ));
        }
        s
    }
}

fn desc(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}
