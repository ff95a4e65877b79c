//! Average True Range (Wilder smoothing).
//!
//! Seed: mean of the first n true ranges; then
//! ATR[i] = (ATR[i-1] * (n-1) + TR[i]) / n.
//! Warmup: first (n-1) bars are `None`.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::Bar;

pub fn calculate_atr(bars: &[Bar], period: usize) -> IndicatorSeries {
    if period == 0 {
        return IndicatorSeries::empty(IndicatorType::Atr(period));
    }

    let mut tr_values = Vec::with_capacity(bars.len());
    for (i, bar) in bars.iter().enumerate() {
        let tr = if i == 0 {
            bar.high - bar.low
        } else {
            bar.true_range(bars[i - 1].close)
        };
        tr_values.push(tr);
    }

    let mut values = Vec::with_capacity(bars.len());
    let mut atr = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        let value = if i < period - 1 {
            None
        } else {
            if i == period - 1 {
                atr = tr_values[..period].iter().sum::<f64>() / period as f64;
            } else {
                atr = (atr * (period - 1) as f64 + tr_values[i]) / period as f64;
            }
            Some(IndicatorValue::Simple(atr))
        };
        values.push(IndicatorPoint {
            date: bar.date,
            value,
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Atr(period),
        values,
    }
}
