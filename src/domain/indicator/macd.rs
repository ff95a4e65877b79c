//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! Default parameters: fast=12, slow=26, signal=9
//! Warmup: (slow - 1) + (signal - 1) bars.

use crate::domain::indicator::ema::ema_raw;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::Bar;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

pub fn calculate_macd(
    bars: &[Bar],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> IndicatorSeries {
    let indicator_type = IndicatorType::Macd {
        fast,
        slow,
        signal: signal_period,
    };

    if bars.is_empty() || fast == 0 || slow == 0 || signal_period == 0 {
        return IndicatorSeries::empty(indicator_type);
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let ema_fast = ema_raw(&closes, fast);
    let ema_slow = ema_raw(&closes, slow);

    let macd_line: Vec<f64> = ema_fast
        .iter()
        .zip(ema_slow.iter())
        .map(|(f, s)| f - s)
        .collect();

    // Signal line: EMA of the MACD line, seeded with an SMA over the first
    // signal_period values after the MACD warm-up.
    let k = 2.0 / (signal_period as f64 + 1.0);
    let mut signal_line = vec![0.0; bars.len()];
    let macd_warmup = slow - 1;

    if macd_warmup + signal_period <= bars.len() {
        let seed: f64 = macd_line[macd_warmup..macd_warmup + signal_period]
            .iter()
            .sum::<f64>()
            / signal_period as f64;

        let mut signal_ema = seed;
        signal_line[macd_warmup + signal_period - 1] = signal_ema;

        for i in (macd_warmup + signal_period)..bars.len() {
            signal_ema = macd_line[i] * k + signal_ema * (1.0 - k);
            signal_line[i] = signal_ema;
        }
    }

    let signal_warmup = slow - 1 + signal_period - 1;

    let mut values = Vec::with_capacity(bars.len());
    for (i, bar) in bars.iter().enumerate() {
        let value = if i >= signal_warmup {
            Some(IndicatorValue::Macd {
                line: macd_line[i],
                signal: signal_line[i],
                histogram: macd_line[i] - signal_line[i],
            })
        } else {
            None
        };
        values.push(IndicatorPoint {
            date: bar.date,
            value,
        });
    }

    IndicatorSeries {
        indicator_type,
        values,
    }
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

    #[test]
    fn macd_warmup_length() {
        let prices: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let bars = make_bars(&prices);
        let series = calculate_macd(&bars, 12, 26, 9);

        let warmup = 26 - 1 + 9 - 1; // 33
        for i in 0..warmup {
            assert!(series.values[i].value.is_none(), "bar {} should warm up", i);
        }
        assert!(series.values[warmup].value.is_some());
    }

    #[test]
    fn macd_constant_prices_are_zero() {
        let prices = vec![100.0; 40];
        let bars = make_bars(&prices);
        let series = calculate_macd(&bars, 12, 26, 9);

        let line = series.field_at(35, IndicatorField::MacdLine).unwrap();
        let signal = series.field_at(35, IndicatorField::MacdSignal).unwrap();
        let hist = series.field_at(35, IndicatorField::MacdHistogram).unwrap();
        assert!(line.abs() < 1e-9);
        assert!(signal.abs() < 1e-9);
        assert!(hist.abs() < 1e-9);
    }

    #[test]
    fn macd_uptrend_line_above_signal() {
        // Accelerating uptrend keeps the fast EMA pulling away from the slow,
        // so the MACD line sits above its own (lagging) signal.
        let prices: Vec<f64> = (0..60).map(|i| 100.0 * 1.01f64.powi(i)).collect();
        let bars = make_bars(&prices);
        let series = calculate_macd(&bars, 12, 26, 9);

        let i = bars.len() - 1;
        let line = series.field_at(i, IndicatorField::MacdLine).unwrap();
        let signal = series.field_at(i, IndicatorField::MacdSignal).unwrap();
        assert!(line > signal);
    }

    #[test]
    fn macd_histogram_is_line_minus_signal() {
        let prices: Vec<f64> = (0..50).map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0).collect();
        let bars = make_bars(&prices);
        let series = calculate_macd(&bars, 12, 26, 9);

        for i in 34..bars.len() {
            let line = series.field_at(i, IndicatorField::MacdLine).unwrap();
            let signal = series.field_at(i, IndicatorField::MacdSignal).unwrap();
            let hist = series.field_at(i, IndicatorField::MacdHistogram).unwrap();
            assert!((hist - (line - signal)).abs() < 1e-12);
        }
    }

    #[test]
    fn macd_degenerate_params() {
        let bars = make_bars(&[100.0, 101.0]);
        assert!(calculate_macd(&bars, 0, 26, 9).values.is_empty());
        assert!(calculate_macd(&bars, 12, 0, 9).values.is_empty());
        assert!(calculate_macd(&bars, 12, 26, 0).values.is_empty());
        assert!(calculate_macd(&[], 12, 26, 9).values.is_empty());
    }

    #[test]
    fn macd_short_series_all_none() {
        let prices: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let bars = make_bars(&prices);
        let series = calculate_macd(&bars, 12, 26, 9);
        assert!(series.values.iter().all(|p| p.value.is_none()));
    }
}
