//! Fibonacci retracement levels over a rolling high/low window.
//!
//! For each bar, take the max(High)/min(Low) of the trailing `window` bars
//! and place retracement levels at 23.6/38.2/50/61.8/78.6% below the high.
//! Warmup: first (window-1) bars are `None`.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::Bar;

pub const DEFAULT_WINDOW: usize = 50;

const RETRACEMENTS: [f64; 5] = [0.236, 0.382, 0.5, 0.618, 0.786];

pub fn calculate_fibonacci(bars: &[Bar], window: usize) -> IndicatorSeries {
    if window == 0 {
        return IndicatorSeries::empty(IndicatorType::Fibonacci(window));
    }

    let mut values = Vec::with_capacity(bars.len());

    for i in 0..bars.len() {
        let value = if i + 1 >= window {
            let slice = &bars[i + 1 - window..=i];
            let high = slice.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
            let low = slice.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
            let range = high - low;

            let mut levels = [0.0; 5];
            for (slot, pct) in levels.iter_mut().zip(RETRACEMENTS.iter()) {
                *slot = high - range * pct;
            }

            Some(IndicatorValue::Fibonacci { high, low, levels })
        } else {
            None
        };

        values.push(IndicatorPoint {
            date: bars[i].date,
            value,
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Fibonacci(window),
        values,
    }
}
