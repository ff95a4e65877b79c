//! Bollinger Bands indicator.
//!
//! Middle: SMA over n periods; Upper/Lower: Middle ± multiplier × StdDev,
//! where StdDev is population standard deviation (divides by N).
//!
//! Default parameters: period=20, multiplier=2.0.
//! Warmup: first (period-1) bars are `None`.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::Bar;

pub fn calculate_bollinger(bars: &[Bar], period: usize, stddev_mult_x100: u32) -> IndicatorSeries {
    let indicator_type = IndicatorType::Bollinger {
        period,
        stddev_mult_x100,
    };

    if period == 0 {
        return IndicatorSeries::empty(indicator_type);
    }

    let mult = stddev_mult_x100 as f64 / 100.0;
    let mut values = Vec::with_capacity(bars.len());

    for i in 0..bars.len() {
        let value = if i + 1 >= period {
            let window = &bars[i + 1 - period..=i];
            let middle = window.iter().map(|b| b.close).sum::<f64>() / period as f64;
            let variance = window
                .iter()
                .map(|b| {
                    let diff = b.close - middle;
                    diff * diff
                })
                .sum::<f64>()
                / period as f64;
            let stddev = variance.sqrt();

            Some(IndicatorValue::Bands {
                upper: middle + mult * stddev,
                middle,
                lower: middle - mult * stddev,
            })
        } else {
            None
        };

        values.push(IndicatorPoint {
            date: bars[i].date,
            value,
        });
    }

    IndicatorSeries {
        indicator_type,
        values,
    }
}
