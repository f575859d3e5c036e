//! Heikin-Ashi synthetic candles.

use trading_core::traits::BarIndicator;
use trading_core::types::Bar;

/// Heikin-Ashi candle transform.
///
/// - close = mean of the source open, high, low, close
/// - open  = mean of the previous synthetic open and close; the first bar
///   uses the mean of its source open and close
/// - high/low = extremes of the source high/low and the synthetic open/close
///
/// The open is an ordered fold over the whole sequence. Timestamps and
/// volume carry over from the source bar.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeikinAshi;

impl HeikinAshi {
    pub fn new() -> Self {
        Self
    }
}

impl BarIndicator for HeikinAshi {
    type Output = Bar;

    fn calculate_bars(&self, bars: &[Bar]) -> Vec<Bar> {
        let mut result: Vec<Bar> = Vec::with_capacity(bars.len());

        for bar in bars {
            let close = bar.ohlc_mean();
            let open = match result.last() {
                Some(prev) => (prev.open + prev.close) / 2.0,
                None => (bar.open + bar.close) / 2.0,
            };
            let high = bar.high.max(open).max(close);
            let low = bar.low.min(open).min(close);

            result.push(Bar::new(bar.timestamp, open, high, low, close, bar.volume));
        }

        result
    }

    fn period(&self) -> usize {
        1
    }

    fn name(&self) -> &str {
        "Heikin-Ashi"
    }
}
