//! Tick resampling command.

use anyhow::{anyhow, Context, Result};
use std::path::Path;
use trading_core::types::Timeframe;
use trading_data::{load_tick_dir, load_tick_file, parse_time_zone, resample, save_bars};
use tracing::info;

use super::load_app_config;
use crate::cli::ResampleArgs;

pub async fn run(args: ResampleArgs, config_path: &Path) -> Result<()> {
    let app = load_app_config(config_path)?;
    let timeframe = match &args.timeframe {
        Some(tf) => tf.parse::<Timeframe>().map_err(|e| anyhow!(e))?,
        None => app.data.timeframe,
    };
    let tz = parse_time_zone(args.tz.as_deref().unwrap_or(app.data.tz.as_str()))?;

    let input = &args.input_dir;
    let ticks = if input.is_dir() {
        load_tick_dir(input).await
    } else {
        load_tick_file(input).await
    }
    .with_context(|| format!("Failed to load ticks from {}", input.display()))?;

    let bars = resample(&ticks, timeframe, &tz).context("Resampling failed")?;
    info!("Resampled {} ticks into {} {} bars ({})", ticks.len(), bars.len(), timeframe, tz);

    save_bars(&args.output, &bars, &tz)
        .await
        .with_context(|| format!("Failed to write bars to {}", args.output.display()))?;

    println!("Wrote {} bars to {}", bars.len(), args.output.display());
    Ok(())
}
