//! Stochastic RSI indicator.
//!
//! Applies the stochastic oscillator to RSI values rather than price:
//! raw %K = (RSI - min(RSI, w)) / (max(RSI, w) - min(RSI, w)) × 100,
//! smoothed by SMA(k); %D = SMA(d) of %K. A flat RSI window (max == min)
//! yields raw %K = 0.
//!
//! Default parameters: rsi_period=14, stoch_period=14, k=3, d=3.
//! A point is `None` until both %K and %D are defined.

use crate::domain::indicator::rsi::calculate_rsi;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::Bar;

pub fn calculate_stoch_rsi(
    bars: &[Bar],
    rsi_period: usize,
    stoch_period: usize,
    k: usize,
    d: usize,
) -> IndicatorSeries {
    let indicator_type = IndicatorType::StochRsi {
        rsi_period,
        stoch_period,
        k,
        d,
    };

    if rsi_period == 0 || stoch_period == 0 || k == 0 || d == 0 {
        return IndicatorSeries::empty(indicator_type);
    }

    let rsi_series = calculate_rsi(bars, rsi_period);
    let rsi: Vec<Option<f64>> = (0..bars.len()).map(|i| rsi_series.simple_at(i)).collect();

    // Raw stochastic over the RSI, defined once the RSI window is full.
    let raw: Vec<Option<f64>> = (0..bars.len())
        .map(|i| {
            if i + 1 < stoch_period {
                return None;
            }
            let window = &rsi[i + 1 - stoch_period..=i];
            if window.iter().any(|v| v.is_none()) {
                return None;
            }
            let vals: Vec<f64> = window.iter().map(|v| v.unwrap()).collect();
            let min = vals.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = vals.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            if max > min {
                Some((vals[vals.len() - 1] - min) / (max - min) * 100.0)
            } else {
                Some(0.0)
            }
        })
        .collect();

    let k_line = rolling_mean(&raw, k);
    let d_line = rolling_mean(&k_line, d);

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| IndicatorPoint {
            date: bar.date,
            value: match (k_line[i], d_line[i]) {
                (Some(k_val), Some(d_val)) => Some(IndicatorValue::Stochastic {
                    k: k_val,
                    d: d_val,
                }),
                _ => None,
            },
        })
        .collect();

    IndicatorSeries {
        indicator_type,
        values,
    }
}

fn rolling_mean(input: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    (0..input.len())
        .map(|i| {
            if i + 1 < window {
                return None;
            }
            let slice = &input[i + 1 - window..=i];
            if slice.iter().any(|v| v.is_none()) {
                return None;
            }
            Some(slice.iter().map(|v| v.unwrap()).sum::<f64>() / window as f64)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::IndicatorField;
    use chrono::NaiveDate;

    fn make_bars(prices: &[f64]) -> Vec<Bar> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                symbol: "TEST".into(),
                date: NaiveDate::from_ymd_opt(2024, 1, 1)
                    .unwrap()
                    .checked_add_days(chrono::Days::new(i as u64))
                    .unwrap(),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000,
            })
            .collect()
    }

    fn oscillating(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + (i as f64 * 0.9).sin() * 8.0)
            .collect()
    }

    #[test]
    fn stoch_rsi_warmup() {
        let bars = make_bars(&oscillating(40));
        let series = calculate_stoch_rsi(&bars, 14, 14, 3, 3);

        // RSI needs 14 changes, stoch 14 RSI values, k and d two more each.
        let first_defined = series
            .values
            .iter()
            .position(|p| p.value.is_some())
            .unwrap();
        assert_eq!(first_defined, 14 + 13 + 2 + 2);
        for p in &series.values[first_defined..] {
            assert!(p.value.is_some());
        }
    }

    #[test]
    fn stoch_rsi_in_range() {
        let bars = make_bars(&oscillating(60));
        let series = calculate_stoch_rsi(&bars, 14, 14, 3, 3);

        for i in 0..bars.len() {
            if let Some(k) = series.field_at(i, IndicatorField::StochK) {
                assert!((0.0..=100.0).contains(&k), "%K {} out of range", k);
            }
            if let Some(d) = series.field_at(i, IndicatorField::StochD) {
                assert!((0.0..=100.0).contains(&d), "%D {} out of range", d);
            }
        }
    }

    #[test]
    fn stoch_rsi_flat_rsi_window_is_zero() {
        // Monotonic rise → RSI pinned at 100 → flat window → raw %K 0.
        let prices: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let bars = make_bars(&prices);
        let series = calculate_stoch_rsi(&bars, 14, 14, 3, 3);

        let last = bars.len() - 1;
        let k = series.field_at(last, IndicatorField::StochK).unwrap();
        assert!(k.abs() < 1e-9);
    }

    #[test]
    fn stoch_rsi_short_series_all_none() {
        let bars = make_bars(&oscillating(20));
        let series = calculate_stoch_rsi(&bars, 14, 14, 3, 3);
        assert!(series.values.iter().all(|p| p.value.is_none()));
    }

    #[test]
    fn stoch_rsi_degenerate_params() {
        let bars = make_bars(&oscillating(5));
        assert!(calculate_stoch_rsi(&bars, 0, 14, 3, 3).values.is_empty());
        assert!(calculate_stoch_rsi(&bars, 14, 14, 0, 3).values.is_empty());
    }
}
