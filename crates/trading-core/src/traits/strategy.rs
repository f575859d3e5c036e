//! Strategy trait definitions.

use crate::error::StrategyError;

/// Configuration trait for strategies.
pub trait StrategyConfig: Send + Sync + Clone + 'static {
    /// Validate the configuration.
    fn validate(&self) -> Result<(), StrategyError>;

    /// Number of raw bars needed before the strategy can walk at least one bar.
    fn warmup_period(&self) -> usize;

    /// Check if the strategy has enough data.
    fn is_warmed_up(&self, bars_available: usize) -> bool {
        bars_available >= self.warmup_period()
    }
}
