//! Moving-average touch strategy.
//!
//! While the fast MA sits above the slow MA (golden-cross regime) a long
//! setup is armed when a bar's low dips into the touch margin around either
//! MA, and disarmed when the low breaks below the slow MA. An armed setup
//! enters on the next bullish candle. Shorts mirror this in the dead-cross
//! regime. Open positions exit when the fast MA turns against them
//! (take-profit) or when the Supertrend flips against them (stop-loss).

use serde::{Deserialize, Serialize};
use tracing::debug;
use trading_core::{
    error::StrategyError,
    traits::StrategyConfig,
    types::{ExitReason, Side},
};
use trading_indicators::MaType;

use crate::frame::IndicatorFrame;

/// Configuration for the MA touch strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaTouchConfig {
    /// Fast moving average period
    pub ma_fast_len: usize,
    /// Slow moving average period
    pub ma_slow_len: usize,
    /// SMA or EMA
    pub ma_type: MaType,
    /// ATR multiplier of the Supertrend bands
    pub supertrend_factor: f64,
    /// ATR period of the Supertrend
    pub supertrend_period: usize,
    /// Touch tolerance in pips
    pub touch_margin_pips: f64,
    /// Walk Heikin-Ashi candles instead of raw bars
    pub use_heikin_ashi: bool,
}

impl Default for MaTouchConfig {
    fn default() -> Self {
        Self {
            ma_fast_len: 20,
            ma_slow_len: 50,
            ma_type: MaType::SimpleMovingAverage,
            supertrend_factor: 3.0,
            supertrend_period: 10,
            touch_margin_pips: 2.0,
            use_heikin_ashi: true,
        }
    }
}

impl StrategyConfig for MaTouchConfig {
    fn validate(&self) -> Result<(), StrategyError> {
        if self.ma_fast_len == 0 {
            return Err(StrategyError::InvalidConfig(
                "Fast MA length must be greater than 0".into(),
            ));
        }
        if self.ma_slow_len == 0 {
            return Err(StrategyError::InvalidConfig(
                "Slow MA length must be greater than 0".into(),
            ));
        }
        if self.supertrend_period == 0 {
            return Err(StrategyError::InvalidConfig(
                "Supertrend period must be greater than 0".into(),
            ));
        }
        if !self.supertrend_factor.is_finite() || self.supertrend_factor <= 0.0 {
            return Err(StrategyError::InvalidConfig(
                "Supertrend factor must be a positive number".into(),
            ));
        }
        if !self.touch_margin_pips.is_finite() || self.touch_margin_pips < 0.0 {
            return Err(StrategyError::InvalidConfig(
                "Touch margin must be a non-negative number of pips".into(),
            ));
        }
        Ok(())
    }

    fn warmup_period(&self) -> usize {
        self.ma_fast_len
            .max(self.ma_slow_len)
            .max(self.supertrend_period)
            + 1
    }
}

/// Setup flags carried from bar to bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmedFlags {
    pub long: bool,
    pub short: bool,
}

/// What the strategy wants to do on one bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BarSignals {
    /// Fast MA crossed above the slow MA on this bar
    pub bullish_cross: bool,
    /// Fast MA crossed below the slow MA on this bar
    pub bearish_cross: bool,
    /// Enter (or reverse into) a long position
    pub buy: bool,
    /// Enter (or reverse into) a short position
    pub sell: bool,
    /// Close an open long, with the reason
    pub exit_long: Option<ExitReason>,
    /// Close an open short, with the reason
    pub exit_short: Option<ExitReason>,
}

impl BarSignals {
    pub fn is_quiet(&self) -> bool {
        !self.buy && !self.sell && self.exit_long.is_none() && self.exit_short.is_none()
    }
}

/// Moving-average touch strategy.
///
/// Stateless apart from the resolved touch margin; the armed flags and the
/// position are owned by the caller and passed in on each bar.
#[derive(Debug, Clone)]
pub struct MaTouchStrategy {
    config: MaTouchConfig,
    margin: f64,
}

impl MaTouchStrategy {
    /// Create a strategy with an already resolved touch margin (price units).
    pub fn new(config: MaTouchConfig, margin: f64) -> Self {
        Self { config, margin }
    }

    pub fn name(&self) -> &str {
        "MA Touch"
    }

    pub fn description(&self) -> &str {
        "Enters on a bullish/bearish candle after price touches the MAs inside the cross regime"
    }

    pub fn config(&self) -> &MaTouchConfig {
        &self.config
    }

    /// Touch tolerance in price units.
    pub fn margin(&self) -> f64 {
        self.margin
    }

    /// Evaluate one bar against the previous one.
    ///
    /// `position` is the side held before this bar. Returns the updated armed
    /// flags together with the signals; entries do not clear the flags here,
    /// the caller does that once the entry is filled.
    pub fn evaluate(
        &self,
        prev: &IndicatorFrame,
        cur: &IndicatorFrame,
        position: Option<Side>,
        armed: ArmedFlags,
    ) -> (ArmedFlags, BarSignals) {
        let m = self.margin;
        let bar = &cur.bar;
        let is_long = position == Some(Side::Long);
        let is_short = position == Some(Side::Short);

        let golden = cur.fast_ma > cur.slow_ma;
        let dead = cur.fast_ma < cur.slow_ma;
        let bullish_cross = golden && prev.fast_ma <= prev.slow_ma;
        let bearish_cross = dead && prev.fast_ma >= prev.slow_ma;

        let mut armed = armed;

        // A fresh cross starts a new regime
        if bullish_cross {
            armed.long = false;
        }
        if bearish_cross {
            armed.short = false;
        }

        if golden && !is_long {
            if bar.low <= cur.fast_ma + m || bar.low <= cur.slow_ma + m {
                armed.long = true;
            }
            if bar.low < cur.slow_ma {
                armed.long = false;
            }
        }

        if dead && !is_short {
            if bar.high >= cur.fast_ma - m || bar.high >= cur.slow_ma - m {
                armed.short = true;
            }
            if bar.high > cur.slow_ma {
                armed.short = false;
            }
        }

        let buy = !is_long && golden && armed.long && bar.is_bullish();
        let sell = !is_short && dead && armed.short && bar.is_bearish();

        let fast_falling = cur.fast_ma < prev.fast_ma;
        let fast_rising = cur.fast_ma > prev.fast_ma;

        let exit_long = if is_long && !buy {
            if fast_falling {
                Some(ExitReason::TakeProfitMATurn)
            } else if cur.direction.is_down() {
                Some(ExitReason::StopLossTrendFlip)
            } else {
                None
            }
        } else {
            None
        };

        let exit_short = if is_short && !sell {
            if fast_rising {
                Some(ExitReason::TakeProfitMATurn)
            } else if cur.direction.is_up() {
                Some(ExitReason::StopLossTrendFlip)
            } else {
                None
            }
        } else {
            None
        };

        let signals = BarSignals {
            bullish_cross,
            bearish_cross,
            buy,
            sell,
            exit_long,
            exit_short,
        };

        if !signals.is_quiet() {
            debug!(
                "{} t={} fast={:.5} slow={:.5} dir={:?} -> {:?}",
                self.name(),
                bar.timestamp,
                cur.fast_ma,
                cur.slow_ma,
                cur.direction,
                signals
            );
        }

        (armed, signals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trading_core::types::Bar;
    use trading_indicators::TrendDirection;

    fn frame(fast: f64, slow: f64, open: f64, high: f64, low: f64, close: f64, dir: TrendDirection) -> IndicatorFrame {
        IndicatorFrame {
            bar: Bar::new(0, open, high, low, close, 0.0),
            fast_ma: fast,
            slow_ma: slow,
            supertrend: 0.0,
            direction: dir,
            true_range: high - low,
            atr: 1.0,
        }
    }

    fn strategy() -> MaTouchStrategy {
        MaTouchStrategy::new(MaTouchConfig::default(), 0.1)
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = MaTouchConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.warmup_period(), 51);
    }

    #[test]
    fn test_invalid_configs() {
        let cases = [
            MaTouchConfig { ma_fast_len: 0, ..Default::default() },
            MaTouchConfig { ma_slow_len: 0, ..Default::default() },
            MaTouchConfig { supertrend_period: 0, ..Default::default() },
            MaTouchConfig { supertrend_factor: 0.0, ..Default::default() },
            MaTouchConfig { supertrend_factor: f64::NAN, ..Default::default() },
            MaTouchConfig { touch_margin_pips: -1.0, ..Default::default() },
        ];
        for config in cases {
            assert!(config.validate().is_err(), "{:?} should be rejected", config);
        }
    }

    #[test]
    fn test_config_defaults_fill_missing_fields() {
        let config: MaTouchConfig = serde_json::from_str(r#"{"ma_fast_len": 5, "ma_type": "EMA"}"#).unwrap();
        assert_eq!(config.ma_fast_len, 5);
        assert_eq!(config.ma_slow_len, 50);
        assert_eq!(config.ma_type, MaType::ExponentialMovingAverage);
    }

    #[test]
    fn test_touch_arms_and_bullish_candle_buys() {
        let s = strategy();
        let prev = frame(101.0, 100.0, 102.0, 103.0, 101.5, 102.5, TrendDirection::Up);
        // low 101.05 is within 0.1 of the fast MA; bearish candle, so no entry yet
        let touch = frame(101.0, 100.0, 102.0, 102.2, 101.05, 101.5, TrendDirection::Up);
        let (armed, signals) = s.evaluate(&prev, &touch, None, ArmedFlags::default());
        assert!(armed.long);
        assert!(!signals.buy);

        let bullish = frame(101.1, 100.1, 101.5, 102.5, 101.4, 102.3, TrendDirection::Up);
        let (_, signals) = s.evaluate(&touch, &bullish, None, armed);
        assert!(signals.buy);
        assert!(!signals.sell);
    }

    #[test]
    fn test_break_below_slow_disarms() {
        let s = strategy();
        let prev = frame(101.0, 100.0, 102.0, 103.0, 101.5, 102.5, TrendDirection::Up);
        let pierce = frame(101.0, 100.0, 100.5, 101.0, 99.9, 100.8, TrendDirection::Up);
        let (armed, signals) = s.evaluate(&prev, &pierce, None, ArmedFlags { long: true, short: false });
        assert!(!armed.long);
        assert!(!signals.buy);
    }

    #[test]
    fn test_bullish_cross_resets_long_setup() {
        let s = strategy();
        let prev = frame(99.9, 100.0, 100.0, 100.5, 99.5, 100.2, TrendDirection::Up);
        // Crosses up on a bar far above both MAs: the stale flag must not carry over
        let cur = frame(100.2, 100.0, 103.0, 104.0, 102.0, 103.5, TrendDirection::Up);
        let (armed, signals) = s.evaluate(&prev, &cur, None, ArmedFlags { long: true, short: false });
        assert!(signals.bullish_cross);
        assert!(!armed.long);
        assert!(!signals.buy);
    }

    #[test]
    fn test_no_arming_while_long() {
        let s = strategy();
        let prev = frame(101.0, 100.0, 102.0, 103.0, 101.5, 102.5, TrendDirection::Up);
        let touch = frame(101.0, 100.0, 101.5, 102.0, 101.05, 101.8, TrendDirection::Up);
        let (armed, signals) = s.evaluate(&prev, &touch, Some(Side::Long), ArmedFlags::default());
        assert!(!armed.long);
        assert!(!signals.buy);
    }

    #[test]
    fn test_short_touch_and_bearish_candle_sells() {
        let s = strategy();
        let prev = frame(99.0, 100.0, 98.0, 98.5, 97.0, 97.5, TrendDirection::Down);
        let touch = frame(99.0, 100.0, 98.5, 98.95, 98.0, 98.8, TrendDirection::Down);
        let (armed, signals) = s.evaluate(&prev, &touch, None, ArmedFlags::default());
        assert!(armed.short);
        assert!(!signals.sell);

        let bearish = frame(98.9, 99.9, 98.8, 98.9, 97.9, 98.0, TrendDirection::Down);
        let (_, signals) = s.evaluate(&touch, &bearish, None, armed);
        assert!(signals.sell);
    }

    #[test]
    fn test_long_take_profit_precedes_stop_loss() {
        let s = strategy();
        let prev = frame(101.0, 100.0, 102.0, 103.0, 101.5, 102.5, TrendDirection::Up);
        let cur = frame(100.9, 100.0, 102.0, 103.0, 101.5, 102.5, TrendDirection::Down);
        let (_, signals) = s.evaluate(&prev, &cur, Some(Side::Long), ArmedFlags::default());
        assert_eq!(signals.exit_long, Some(ExitReason::TakeProfitMATurn));
    }

    #[test]
    fn test_long_stop_loss_on_trend_flip() {
        let s = strategy();
        let prev = frame(101.0, 100.0, 102.0, 103.0, 101.5, 102.5, TrendDirection::Up);
        let cur = frame(101.2, 100.0, 102.0, 103.0, 101.5, 102.5, TrendDirection::Down);
        let (_, signals) = s.evaluate(&prev, &cur, Some(Side::Long), ArmedFlags::default());
        assert_eq!(signals.exit_long, Some(ExitReason::StopLossTrendFlip));
        assert_eq!(signals.exit_short, None);
    }

    #[test]
    fn test_short_exits() {
        let s = strategy();
        let prev = frame(99.0, 100.0, 98.0, 98.5, 97.0, 97.5, TrendDirection::Down);

        let rising = frame(99.1, 100.0, 98.0, 98.5, 97.0, 97.5, TrendDirection::Up);
        let (_, signals) = s.evaluate(&prev, &rising, Some(Side::Short), ArmedFlags::default());
        assert_eq!(signals.exit_short, Some(ExitReason::TakeProfitMATurn));

        let flipped = frame(98.9, 100.0, 98.0, 98.5, 97.0, 97.5, TrendDirection::Up);
        let (_, signals) = s.evaluate(&prev, &flipped, Some(Side::Short), ArmedFlags::default());
        assert_eq!(signals.exit_short, Some(ExitReason::StopLossTrendFlip));

        let holding = frame(98.9, 100.0, 98.0, 98.5, 97.0, 97.5, TrendDirection::Down);
        let (_, signals) = s.evaluate(&prev, &holding, Some(Side::Short), ArmedFlags::default());
        assert!(signals.is_quiet());
    }

    #[test]
    fn test_flat_never_exits() {
        let s = strategy();
        let prev = frame(101.0, 100.0, 102.0, 103.0, 101.5, 102.5, TrendDirection::Up);
        let cur = frame(100.5, 100.0, 102.0, 103.0, 101.5, 102.5, TrendDirection::Down);
        let (_, signals) = s.evaluate(&prev, &cur, None, ArmedFlags::default());
        assert_eq!(signals.exit_long, None);
        assert_eq!(signals.exit_short, None);
    }
}
