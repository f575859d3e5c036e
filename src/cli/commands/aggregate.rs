//! Trade log aggregation command.

use anyhow::{Context, Result};
use std::path::Path;
use trading_backtest::TradeLogSummary;
use trading_data::load_trades;
use tracing::info;

use super::load_app_config;
use crate::cli::AggregateArgs;

pub async fn run(args: AggregateArgs, config_path: &Path) -> Result<()> {
    let app = load_app_config(config_path)?;
    let capital = args.capital.unwrap_or(app.backtest.initial_capital);

    let trades = load_trades(&args.trades)
        .await
        .with_context(|| format!("Failed to read trades from {}", args.trades.display()))?;
    info!("Loaded {} trades from {}", trades.len(), args.trades.display());

    let summary = TradeLogSummary::from_trades(capital, &trades);
    println!("{}", summary.render());
    Ok(())
}
