//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1), seed with first SMA, then EMA[i] = C[i]*k + EMA[i-1]*(1-k).
//! Warmup: first (n-1) bars are `None`.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::Bar;

pub fn calculate_ema(bars: &[Bar], period: usize) -> IndicatorSeries {
    if period == 0 || bars.is_empty() {
        return IndicatorSeries::empty(IndicatorType::Ema(period));
    }

    let mut values = Vec::with_capacity(bars.len());
    let k = 2.0 / (period as f64 + 1.0);
    let mut ema = 0.0;
    let mut sum = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        if i < period - 1 {
            sum += bar.close;
            values.push(IndicatorPoint {
                date: bar.date,
                value: None,
            });
        } else if i == period - 1 {
            sum += bar.close;
            ema = sum / period as f64;
            values.push(IndicatorPoint {
                date: bar.date,
                value: Some(IndicatorValue::Simple(ema)),
            });
        } else {
            ema = bar.close * k + ema * (1.0 - k);
            values.push(IndicatorPoint {
                date: bar.date,
                value: Some(IndicatorValue::Simple(ema)),
            });
        }
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Ema(period),
        values,
    }
}

/// Raw EMA values without warm-up tracking, for composition (MACD, Keltner).
/// Entries before index (period-1) hold the partial running value and must
/// not be read by callers.
pub(crate) fn ema_raw(closes: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![0.0; closes.len()];
    if period == 0 || closes.is_empty() {
        return out;
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut sum = 0.0;
    let mut ema = 0.0;

    for (i, &c) in closes.iter().enumerate() {
        if i < period - 1 {
            sum += c;
        } else if i == period - 1 {
            sum += c;
            ema = sum / period as f64;
            out[i] = ema;
        } else {
            ema = c * k + ema * (1.0 - k);
            out[i] = ema;
        }
    }
    out
}
