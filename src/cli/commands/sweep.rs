//! Parameter sweep command.

use anyhow::{Context, Result};
use std::path::Path;
use trading_backtest::{ParamSweep, SweepResults};
use tracing::info;

use super::{load_app_config, load_bars, resolve_data_path};
use crate::cli::SweepArgs;

pub async fn run(args: SweepArgs, config_path: &Path) -> Result<()> {
    let app = load_app_config(config_path)?;
    let settings = &app.sweep;
    let max_drawdown = args.max_drawdown.unwrap_or(settings.max_drawdown);
    let top = args.top.unwrap_or(settings.top);

    let data_path = resolve_data_path(args.data.as_deref(), &app)?;
    let bars = load_bars(&data_path).await?;

    info!(
        "Sweeping {} parameter combinations over {} bars",
        settings.grid.size(),
        bars.len()
    );

    let sweep = ParamSweep::new().with_parallelism(settings.parallel && !args.sequential);
    let results = sweep.sweep(&settings.grid, &app.backtest, &bars);

    println!(
        "{} configurations produced trades ({} skipped)",
        results.len(),
        results.skipped()
    );

    if results.is_empty() {
        println!("No configuration produced any trades.");
    } else {
        println!();
        println!("Top {} by net profit:", top);
        println!("{}", SweepResults::render_table(&results.ranked(), top));

        let safe = results.safe(max_drawdown);
        println!();
        if safe.is_empty() {
            println!("No profitable configuration with drawdown <= {:.0}.", max_drawdown);
        } else {
            println!("Top {} with drawdown <= {:.0}:", top, max_drawdown);
            println!("{}", SweepResults::render_table(&safe, top));
        }
    }

    if let Some(path) = &args.out {
        let mut buf = Vec::new();
        results.write_csv(&mut buf)?;
        tokio::fs::write(path, buf)
            .await
            .with_context(|| format!("Failed to write sweep results to {}", path.display()))?;
        info!("Wrote {} sweep results to {}", results.len(), path.display());
    }

    Ok(())
}
