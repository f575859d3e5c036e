//! Backtest command implementation.

use anyhow::{Context, Result};
use std::path::Path;
use trading_backtest::BacktestEngine;
use trading_data::save_trades;
use tracing::info;

use super::{load_app_config, load_bars, parse_bound, resolve_data_path};
use crate::cli::{BacktestArgs, OutputFormat};

pub async fn run(args: BacktestArgs, config_path: &Path) -> Result<()> {
    let app = load_app_config(config_path)?;

    let mut config = app.backtest.clone();
    if let Some(capital) = args.capital {
        config.initial_capital = capital;
    }
    if let Some(ma_type) = args.ma_type {
        config.strategy.ma_type = ma_type.into();
    }
    if let Some(start) = &args.start {
        config.start = Some(parse_bound(start)?);
    }
    if let Some(end) = &args.end {
        config.end = Some(parse_bound(end)?);
    }

    let data_path = resolve_data_path(args.data.as_deref(), &app)?;
    let bars = load_bars(&data_path).await?;

    info!(
        "Starting backtest: {} {}/{}, supertrend {}x{}, touch {} pips",
        config.strategy.ma_type,
        config.strategy.ma_fast_len,
        config.strategy.ma_slow_len,
        config.strategy.supertrend_period,
        config.strategy.supertrend_factor,
        config.strategy.touch_margin_pips,
    );

    let engine = BacktestEngine::new(config);
    let report = engine.run(&bars).context("Backtest failed")?;

    match args.output {
        OutputFormat::Json => println!("{}", report.to_json()?),
        OutputFormat::Text => println!("{}", report.summary()),
    }

    if let Some(path) = &args.trades_out {
        save_trades(path, &report.trades)
            .await
            .with_context(|| format!("Failed to write trades to {}", path.display()))?;
    }

    if let Some(path) = &args.save {
        tokio::fs::write(path, report.to_json()?)
            .await
            .with_context(|| format!("Failed to save report to {}", path.display()))?;
        info!("Results saved to {}", path.display());
    }

    Ok(())
}
