//! Backtest statistics.

use serde::{Deserialize, Serialize};
use std::fmt;
use trading_core::types::{Side, TradeRecord};

/// Ranking value used for an infinite profit factor.
pub const INFINITE_PROFIT_FACTOR_RANK: f64 = 999.0;

/// Gross profit over absolute gross loss.
///
/// A run without a single losing trade has no finite profit factor; it is
/// reported as `Infinite` rather than a division by zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "ProfitFactorRepr", try_from = "ProfitFactorRepr")]
pub enum ProfitFactor {
    Finite(f64),
    Infinite,
}

impl ProfitFactor {
    /// Profit factor from gross profit and (non-positive) gross loss.
    pub fn from_gross(gross_profit: f64, gross_loss: f64) -> Self {
        if gross_loss < 0.0 {
            ProfitFactor::Finite(gross_profit / gross_loss.abs())
        } else {
            ProfitFactor::Infinite
        }
    }

    /// Numeric value for sorting result tables.
    pub fn ranking_value(&self) -> f64 {
        match self {
            ProfitFactor::Finite(v) => *v,
            ProfitFactor::Infinite => INFINITE_PROFIT_FACTOR_RANK,
        }
    }

    pub fn is_infinite(&self) -> bool {
        matches!(self, ProfitFactor::Infinite)
    }
}

impl fmt::Display for ProfitFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfitFactor::Finite(v) => write!(f, "{:.2}", v),
            ProfitFactor::Infinite => write!(f, "inf"),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ProfitFactorRepr {
    Number(f64),
    Text(String),
}

impl From<ProfitFactor> for ProfitFactorRepr {
    fn from(pf: ProfitFactor) -> Self {
        match pf {
            ProfitFactor::Finite(v) => ProfitFactorRepr::Number(v),
            ProfitFactor::Infinite => ProfitFactorRepr::Text("inf".into()),
        }
    }
}

impl TryFrom<ProfitFactorRepr> for ProfitFactor {
    type Error = String;

    fn try_from(repr: ProfitFactorRepr) -> Result<Self, Self::Error> {
        match repr {
            ProfitFactorRepr::Number(v) if v.is_finite() => Ok(ProfitFactor::Finite(v)),
            ProfitFactorRepr::Number(_) => Ok(ProfitFactor::Infinite),
            ProfitFactorRepr::Text(s) if s.eq_ignore_ascii_case("inf") => Ok(ProfitFactor::Infinite),
            ProfitFactorRepr::Text(s) => Err(format!("Invalid profit factor: {}", s)),
        }
    }
}

/// One point of the mark-to-market equity curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
    pub equity: f64,
}

/// Per-side trade breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SideBreakdown {
    pub side: Side,
    pub trades: usize,
    pub net_pnl: f64,
    pub win_rate_pct: f64,
}

/// Summary statistics of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub initial_capital: f64,
    pub final_equity: f64,
    pub net_pnl: f64,
    pub net_pct: f64,
    pub total_trades: usize,
    pub winning_trades: usize,
    /// Losing trades, breakeven included
    pub losing_trades: usize,
    pub win_rate_pct: f64,
    pub gross_profit: f64,
    /// Sum of non-positive pnls (never positive)
    pub gross_loss: f64,
    pub profit_factor: ProfitFactor,
    /// Largest peak-to-trough decline in currency units
    pub max_drawdown: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub by_side: Vec<SideBreakdown>,
}

impl PerformanceSummary {
    /// Summary of a run that never traded.
    pub fn neutral(initial_capital: f64) -> Self {
        Self::compute(initial_capital, initial_capital, &[], &[])
    }

    /// Aggregate a trade log and its equity curve.
    pub fn compute(
        initial_capital: f64,
        final_equity: f64,
        trades: &[TradeRecord],
        equity_curve: &[f64],
    ) -> Self {
        let pnls: Vec<f64> = trades.iter().map(|t| t.pnl).collect();
        let wins: Vec<f64> = pnls.iter().copied().filter(|p| *p > 0.0).collect();
        let losses: Vec<f64> = pnls.iter().copied().filter(|p| *p <= 0.0).collect();

        let gross_profit: f64 = wins.iter().sum();
        let gross_loss: f64 = losses.iter().sum();
        let net_pnl = final_equity - initial_capital;

        let by_side = [Side::Long, Side::Short]
            .into_iter()
            .map(|side| {
                let side_pnls: Vec<f64> = trades.iter().filter(|t| t.side == side).map(|t| t.pnl).collect();
                let side_wins = side_pnls.iter().filter(|p| **p > 0.0).count();
                SideBreakdown {
                    side,
                    trades: side_pnls.len(),
                    net_pnl: side_pnls.iter().sum(),
                    win_rate_pct: percent(side_wins, side_pnls.len()),
                }
            })
            .collect();

        Self {
            initial_capital,
            final_equity,
            net_pnl,
            net_pct: if initial_capital != 0.0 {
                net_pnl / initial_capital * 100.0
            } else {
                0.0
            },
            total_trades: trades.len(),
            winning_trades: wins.len(),
            losing_trades: losses.len(),
            win_rate_pct: percent(wins.len(), trades.len()),
            gross_profit,
            gross_loss,
            profit_factor: ProfitFactor::from_gross(gross_profit, gross_loss),
            max_drawdown: max_drawdown(equity_curve),
            avg_win: mean(&wins),
            avg_loss: mean(&losses),
            by_side,
        }
    }
}

/// Largest drop from the running maximum, in currency units.
pub fn max_drawdown(equity: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0_f64;

    for &value in equity {
        peak = peak.max(value);
        worst = worst.max(peak - value);
    }

    worst
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}
