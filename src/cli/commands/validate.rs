//! Validate configuration command.

use anyhow::Result;
use std::path::Path;
use trading_config::load_config;
use trading_data::parse_time_zone;

pub async fn run(config_path: &Path) -> Result<()> {
    println!("Validating configuration: {}", config_path.display());

    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            println!("Configuration error: {}", e);
            return Err(e.into());
        }
    };

    if let Err(e) = parse_time_zone(&config.data.tz) {
        println!("Configuration error: {}", e);
        return Err(e.into());
    }

    let bt = &config.backtest;
    let st = &bt.strategy;
    println!("Configuration is valid!");
    println!();
    println!("App: {} ({})", config.app.name, config.app.environment);
    println!("Log level: {} ({})", config.logging.level, config.logging.format);
    println!("Resampling: {} bars in {}", config.data.timeframe, config.data.tz);
    println!("Initial capital: {:.2}", bt.initial_capital);
    println!("Order size: {}% of equity", bt.qty_pct);
    println!(
        "Strategy: {} {}/{}, supertrend {}x{}, touch {} pips, heikin-ashi {}",
        st.ma_type,
        st.ma_fast_len,
        st.ma_slow_len,
        st.supertrend_period,
        st.supertrend_factor,
        st.touch_margin_pips,
        if st.use_heikin_ashi { "on" } else { "off" }
    );
    if bt.start.is_some() || bt.end.is_some() {
        let fmt = |d: Option<chrono::DateTime<chrono::Utc>>| {
            d.map(|d| d.to_rfc3339()).unwrap_or_else(|| "-".to_string())
        };
        println!("Window: {} .. {}", fmt(bt.start), fmt(bt.end));
    }
    println!(
        "Sweep: {} combinations, safe drawdown <= {:.0}, top {}",
        config.sweep.grid.size(),
        config.sweep.max_drawdown,
        config.sweep.top
    );

    Ok(())
}
