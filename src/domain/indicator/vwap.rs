//! Volume Weighted Average Price.
//!
//! Cumulative sum(typical_price × volume) / cumulative sum(volume), taken
//! over the entire supplied series. There is no per-session reset: callers
//! feeding multi-day series get a multi-day VWAP. Known approximation,
//! pending product confirmation (see DESIGN.md).
//!
//! Defined from the first bar; only an all-zero-volume prefix yields `None`.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::Bar;

pub fn calculate_vwap(bars: &[Bar]) -> IndicatorSeries {
    let mut values = Vec::with_capacity(bars.len());
    let mut cum_pv = 0.0;
    let mut cum_vol = 0.0;

    for bar in bars {
        cum_pv += bar.typical_price() * bar.volume as f64;
        cum_vol += bar.volume as f64;

        let value = if cum_vol > 0.0 {
            Some(IndicatorValue::Simple(cum_pv / cum_vol))
        } else {
            None
        };
        values.push(IndicatorPoint {
            date: bar.date,
            value,
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Vwap,
        values,
    }
}
