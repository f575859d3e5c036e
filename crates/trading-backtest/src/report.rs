//! Backtest report generation.

use serde::{Deserialize, Serialize};
use trading_core::types::TradeRecord;

use crate::statistics::{EquityPoint, PerformanceSummary};
use crate::BacktestConfig;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    /// Too few bars to walk; the summary is neutral
    InsufficientData { required: usize, available: usize },
}

/// Complete backtest report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    /// Configuration used
    pub config: BacktestConfig,
    pub status: RunStatus,
    /// Touch margin in price units
    pub margin: f64,
    /// Statistics
    pub summary: PerformanceSummary,
    /// Closed trades in order
    pub trades: Vec<TradeRecord>,
    /// Mark-to-market equity, one point per walked bar
    pub equity_curve: Vec<EquityPoint>,
}

const RULE: &str = "═══════════════════════════════════════════════════════════\n";
const THIN_RULE: &str = "───────────────────────────────────────────────────────────\n";

impl BacktestReport {
    /// Generate a text summary.
    pub fn summary(&self) -> String {
        let mut s = String::new();
        let stats = &self.summary;
        let strategy = &self.config.strategy;

        s.push_str(RULE);
        s.push_str("                     BACKTEST REPORT                        \n");
        s.push_str(RULE);
        s.push('\n');

        s.push_str("STRATEGY\n");
        s.push_str(THIN_RULE);
        s.push_str(&format!(
            "  Moving Averages:     {} {}/{}\n",
            strategy.ma_type, strategy.ma_fast_len, strategy.ma_slow_len
        ));
        s.push_str(&format!(
            "  Supertrend:          {} x {:.2}\n",
            strategy.supertrend_period, strategy.supertrend_factor
        ));
        s.push_str(&format!(
            "  Touch Margin:        {:.2} pips ({:.6})\n",
            strategy.touch_margin_pips, self.margin
        ));
        s.push_str(&format!(
            "  Candles:             {}\n",
            if strategy.use_heikin_ashi { "Heikin-Ashi" } else { "Raw" }
        ));
        s.push('\n');

        if let RunStatus::InsufficientData { required, available } = self.status {
            s.push_str(&format!(
                "  INSUFFICIENT DATA: {} bars available, {} required\n\n",
                available, required
            ));
        }

        s.push_str("PERFORMANCE\n");
        s.push_str(THIN_RULE);
        s.push_str(&format!("  Initial Capital:     {:.2}\n", stats.initial_capital));
        s.push_str(&format!("  Final Equity:        {:.2}\n", stats.final_equity));
        s.push_str(&format!(
            "  Net P&L:             {:.2} ({:.2}%)\n",
            stats.net_pnl, stats.net_pct
        ));
        s.push_str(&format!("  Max Drawdown:        {:.2}\n", stats.max_drawdown));
        s.push_str(&format!("  Profit Factor:       {}\n", stats.profit_factor));
        s.push('\n');

        push_trade_statistics(&mut s, stats);

        s.push_str("EXECUTION\n");
        s.push_str(THIN_RULE);
        s.push_str(&format!("  Equity Points:       {}\n", self.equity_curve.len()));
        if let (Some(first), Some(last)) = (self.equity_curve.first(), self.equity_curve.last()) {
            s.push_str(&format!(
                "  Period:              {} .. {}\n",
                format_millis(first.timestamp),
                format_millis(last.timestamp)
            ));
        }
        s.push('\n');

        s.push_str(RULE);

        s
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export to CSV (equity curve only).
    pub fn equity_to_csv(&self) -> String {
        let mut csv = String::from("timestamp,equity\n");
        for point in &self.equity_curve {
            csv.push_str(&format!("{},{}\n", format_millis(point.timestamp), point.equity));
        }
        csv
    }
}

/// Aggregation of a persisted trade log.
///
/// Equity is rebuilt as initial capital plus cumulative pnl, one point per
/// trade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeLogSummary {
    pub summary: PerformanceSummary,
    pub first_trade: Option<String>,
    pub last_trade: Option<String>,
}

impl TradeLogSummary {
    pub fn from_trades(initial_capital: f64, trades: &[TradeRecord]) -> Self {
        let equity: Vec<f64> = trades
            .iter()
            .scan(initial_capital, |acc, t| {
                *acc += t.pnl;
                Some(*acc)
            })
            .collect();
        let final_equity = equity.last().copied().unwrap_or(initial_capital);

        Self {
            summary: PerformanceSummary::compute(initial_capital, final_equity, trades, &equity),
            first_trade: trades.first().map(|t| t.timestamp.to_rfc3339()),
            last_trade: trades.last().map(|t| t.timestamp.to_rfc3339()),
        }
    }

    /// Generate a text summary.
    pub fn render(&self) -> String {
        let mut s = String::new();
        let stats = &self.summary;

        s.push_str(RULE);
        s.push_str("                    TRADE LOG SUMMARY                       \n");
        s.push_str(RULE);
        s.push('\n');

        if let (Some(first), Some(last)) = (&self.first_trade, &self.last_trade) {
            s.push_str(&format!("  Period:              {} .. {}\n", first, last));
        }
        s.push_str(&format!("  Initial Capital:     {:.2}\n", stats.initial_capital));
        s.push_str(&format!("  Final Equity:        {:.2}\n", stats.final_equity));
        s.push_str(&format!(
            "  Net P&L:             {:.2} ({:.2}%)\n",
            stats.net_pnl, stats.net_pct
        ));
        s.push_str(&format!("  Max Drawdown:        {:.2}\n", stats.max_drawdown));
        s.push_str(&format!("  Profit Factor:       {}\n", stats.profit_factor));
        s.push('\n');

        push_trade_statistics(&mut s, stats);

        s.push_str(RULE);
        s
    }
}

fn push_trade_statistics(s: &mut String, stats: &PerformanceSummary) {
    s.push_str("TRADE STATISTICS\n");
    s.push_str(THIN_RULE);
    s.push_str(&format!("  Total Trades:        {}\n", stats.total_trades));
    s.push_str(&format!("  Winning Trades:      {}\n", stats.winning_trades));
    s.push_str(&format!("  Losing Trades:       {}\n", stats.losing_trades));
    s.push_str(&format!("  Win Rate:            {:.2}%\n", stats.win_rate_pct));
    s.push_str(&format!("  Gross Profit:        {:.2}\n", stats.gross_profit));
    s.push_str(&format!("  Gross Loss:          {:.2}\n", stats.gross_loss));
    s.push_str(&format!("  Avg Win:             {:.2}\n", stats.avg_win));
    s.push_str(&format!("  Avg Loss:            {:.2}\n", stats.avg_loss));
    s.push('\n');

    s.push_str("BY SIDE\n");
    s.push_str(THIN_RULE);
    for side in &stats.by_side {
        s.push_str(&format!(
            "  {:<6} trades {:>5}   net {:>14.2}   win rate {:>6.2}%\n",
            side.side.to_string(),
            side.trades,
            side.net_pnl,
            side.win_rate_pct
        ));
    }
    s.push('\n');
}

fn format_millis(ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| ms.to_string())
}
