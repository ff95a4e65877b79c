//! RSI (Relative Strength Index) indicator.
//!
//! Uses Wilder's smoothing for average gain/loss:
//! - First average: simple mean of gains/losses over the first n changes
//! - Subsequent: avg = (prev_avg * (n-1) + current) / n
//!
//! RSI = 100 - (100 / (1 + avg_gain / avg_loss)); 100 when avg_loss == 0.
//! Warmup: first n bars are `None` (n price changes needed).

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::Bar;

pub const DEFAULT_PERIOD: usize = 14;

pub fn calculate_rsi(bars: &[Bar], period: usize) -> IndicatorSeries {
    let indicator_type = IndicatorType::Rsi(period);

    if period == 0 || bars.len() < 2 {
        let values = bars
            .iter()
            .map(|b| IndicatorPoint {
                date: b.date,
                value: None,
            })
            .collect();
        return IndicatorSeries {
            indicator_type,
            values,
        };
    }

    let mut gains = Vec::with_capacity(bars.len() - 1);
    let mut losses = Vec::with_capacity(bars.len() - 1);
    for i in 1..bars.len() {
        let change = bars[i].close - bars[i - 1].close;
        gains.push(change.max(0.0));
        losses.push((-change).max(0.0));
    }

    let mut values = Vec::with_capacity(bars.len());
    values.push(IndicatorPoint {
        date: bars[0].date,
        value: None,
    });

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;

    for (i, bar) in bars.iter().enumerate().skip(1) {
        let change_idx = i - 1;

        let value = if change_idx < period - 1 {
            None
        } else {
            if change_idx == period - 1 {
                avg_gain = gains[..period].iter().sum::<f64>() / period as f64;
                avg_loss = losses[..period].iter().sum::<f64>() / period as f64;
            } else {
                avg_gain = (avg_gain * (period - 1) as f64 + gains[change_idx]) / period as f64;
                avg_loss = (avg_loss * (period - 1) as f64 + losses[change_idx]) / period as f64;
            }
            let rsi = if avg_loss == 0.0 {
                100.0
            } else {
                100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
            };
            Some(IndicatorValue::Simple(rsi))
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
