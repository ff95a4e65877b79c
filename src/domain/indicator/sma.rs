//! Simple Moving Average indicator.
//!
//! Arithmetic mean of the last n closes. Warmup: first (n-1) bars are `None`.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::Bar;

pub fn calculate_sma(bars: &[Bar], period: usize) -> IndicatorSeries {
    if period == 0 {
        return IndicatorSeries::empty(IndicatorType::Sma(period));
    }

    let mut values = Vec::with_capacity(bars.len());
    let mut sum = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        sum += bar.close;
        if i >= period {
            sum -= bars[i - period].close;
        }

        let value = if i + 1 >= period {
            Some(IndicatorValue::Simple(sum / period as f64))
        } else {
            None
        };
        values.push(IndicatorPoint {
            date: bar.date,
            value,
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Sma(period),
        values,
    }
}
