//! Per-bar indicator frames.

use serde::{Deserialize, Serialize};
use trading_core::error::StrategyError;
use trading_core::traits::{BarIndicator, Indicator};
use trading_core::types::Bar;
use trading_indicators::{Atr, HeikinAshi, MovingAverage, Supertrend, TrendDirection, TrueRange};

use crate::ma_touch::MaTouchConfig;

/// Everything the walk needs to know about one bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorFrame {
    /// The bar being walked (Heikin-Ashi or raw, per configuration)
    pub bar: Bar,
    pub fast_ma: f64,
    pub slow_ma: f64,
    pub supertrend: f64,
    pub direction: TrendDirection,
    pub true_range: f64,
    pub atr: f64,
}

/// Compute indicator frames for a sorted bar sequence.
///
/// Indicators run over the full sequence first; rows where any indicator is
/// still undefined (the SMA warm-up) are dropped afterwards, so the
/// recursive indicators keep their full history.
pub fn build_frames(bars: &[Bar], config: &MaTouchConfig) -> Result<Vec<IndicatorFrame>, StrategyError> {
    let walked: Vec<Bar> = if config.use_heikin_ashi {
        HeikinAshi.calculate_bars(bars)
    } else {
        bars.to_vec()
    };

    let closes: Vec<f64> = walked.iter().map(|b| b.close).collect();
    let fast = MovingAverage::new(config.ma_type, config.ma_fast_len)?.calculate(&closes);
    let slow = MovingAverage::new(config.ma_type, config.ma_slow_len)?.calculate(&closes);

    let true_range = TrueRange.calculate_bars(&walked);
    let atr = Atr::new(config.supertrend_period)?.from_true_range(&true_range);
    let supertrend = Supertrend::new(config.supertrend_period, config.supertrend_factor)?
        .fold(&walked, &atr);

    let frames = walked
        .iter()
        .enumerate()
        .filter_map(|(i, bar)| {
            let (fast_ma, slow_ma) = (fast[i]?, slow[i]?);
            let st = supertrend[i];
            Some(IndicatorFrame {
                bar: *bar,
                fast_ma,
                slow_ma,
                supertrend: st.value,
                direction: st.direction,
                true_range: true_range[i],
                atr: atr[i],
            })
        })
        .filter(|f| f.fast_ma.is_finite() && f.slow_ma.is_finite() && f.supertrend.is_finite())
        .collect();

    Ok(frames)
}
