//! Technical indicators.
//!
//! This crate provides the indicators the MA-touch strategy needs:
//! - Moving averages (SMA, EMA)
//! - Volatility indicators (true range, Wilder RMA, ATR, Supertrend)
//! - Heikin-Ashi synthetic candles
//!
//! Recursive indicators (RMA, EMA, Supertrend bands, Heikin-Ashi open) are
//! written as explicit ordered folds over the input.

pub mod heikin_ashi;
pub mod moving_average;
pub mod volatility;

pub use heikin_ashi::HeikinAshi;
pub use moving_average::{Ema, MaType, MovingAverage, Sma};
pub use volatility::{Atr, Rma, Supertrend, SupertrendPoint, TrendDirection, TrueRange};

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use trading_core::traits::{BarIndicator, Indicator};
    use trading_core::types::Bar;

    fn bars_strategy() -> impl Strategy<Value = Vec<Bar>> {
        prop::collection::vec((1.0f64..1000.0, 0.0f64..5.0, 0.0f64..5.0, -1.0f64..1.0), 1..120)
            .prop_map(|rows| {
                rows.into_iter()
                    .enumerate()
                    .map(|(i, (mid, up, down, body))| {
                        let high = mid + up;
                        let low = mid - down;
                        let open = (mid + body).clamp(low, high);
                        let close = (mid - body).clamp(low, high);
                        Bar::new(i as i64 * 60_000, open, high, low, close, 0.0)
                    })
                    .collect()
            })
    }

    proptest! {
        #[test]
        fn heikin_ashi_bounds_hold(bars in bars_strategy()) {
            for ha in HeikinAshi.calculate_bars(&bars) {
                prop_assert!(ha.high >= ha.open && ha.high >= ha.close);
                prop_assert!(ha.low <= ha.open && ha.low <= ha.close);
            }
        }

        #[test]
        fn supertrend_value_tracks_active_band(bars in bars_strategy()) {
            let points = Supertrend::new(10, 3.0).unwrap().calculate_bars(&bars);
            prop_assert_eq!(points.len(), bars.len());
            for p in points {
                match p.direction {
                    TrendDirection::Up => prop_assert_eq!(p.value, p.lower),
                    TrendDirection::Down => prop_assert_eq!(p.value, p.upper),
                }
            }
        }

        #[test]
        fn sma_defined_exactly_after_window(len in 1usize..30, data in prop::collection::vec(0.0f64..100.0, 0..60)) {
            let out = Sma::new(len).unwrap().calculate(&data);
            prop_assert_eq!(out.len(), data.len());
            for (i, v) in out.iter().enumerate() {
                prop_assert_eq!(v.is_some(), i + 1 >= len);
            }
        }
    }
}
