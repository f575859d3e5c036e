//! Touch-margin models.

use serde::{Deserialize, Serialize};
use trading_core::traits::MarginModel;

/// Infers the instrument's pip unit from the price granularity.
///
/// Closes are rounded to `decimals` places, deduplicated and sorted; the
/// smallest positive gap between neighbours is the minimum tick, and the pip
/// unit is that tick times `multiplier`. A flat or single-valued series has
/// no positive gap, in which case `fallback_tick` is used.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceGranularity {
    pub decimals: i32,
    pub multiplier: f64,
    pub fallback_tick: f64,
}

impl Default for PriceGranularity {
    fn default() -> Self {
        Self {
            decimals: 8,
            multiplier: 10.0,
            fallback_tick: 0.01,
        }
    }
}

impl PriceGranularity {
    /// Smallest positive gap between distinct rounded closes.
    pub fn min_tick(&self, closes: &[f64]) -> Option<f64> {
        let scale = 10f64.powi(self.decimals);
        let mut rounded: Vec<f64> = closes
            .iter()
            .filter(|c| c.is_finite())
            .map(|c| (c * scale).round() / scale)
            .collect();
        rounded.sort_by(f64::total_cmp);
        rounded.dedup();

        rounded
            .windows(2)
            .map(|w| (w[1] - w[0]).abs())
            .filter(|d| *d > 0.0)
            .min_by(f64::total_cmp)
    }
}

impl MarginModel for PriceGranularity {
    fn pip_unit(&self, closes: &[f64]) -> f64 {
        self.min_tick(closes).unwrap_or(self.fallback_tick) * self.multiplier
    }

    fn name(&self) -> &str {
        "price_granularity"
    }
}

/// A pip unit fixed per instrument (e.g. 0.01 for USD/JPY).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FixedPipUnit(pub f64);

impl MarginModel for FixedPipUnit {
    fn pip_unit(&self, _closes: &[f64]) -> f64 {
        self.0
    }

    fn name(&self) -> &str {
        "fixed"
    }
}
