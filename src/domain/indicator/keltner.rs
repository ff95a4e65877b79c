//! Keltner Channels indicator.
//!
//! Middle: EMA(period) of close; Upper/Lower: Middle ± multiplier × ATR(period).
//!
//! Canonical multiplier for this codebase is 1.5 (`DEFAULT_ATR_MULT_X100`);
//! it is applied at every call site, including the TTM squeeze.
//! Warmup: first (period-1) bars are `None` (EMA and ATR share the window).

use crate::domain::indicator::atr::calculate_atr;
use crate::domain::indicator::ema::ema_raw;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::Bar;

pub const DEFAULT_PERIOD: usize = 20;
pub const DEFAULT_ATR_MULT_X100: u32 = 150;

pub fn calculate_keltner(bars: &[Bar], period: usize, atr_mult_x100: u32) -> IndicatorSeries {
    let indicator_type = IndicatorType::Keltner {
        period,
        atr_mult_x100,
    };

    if period == 0 {
        return IndicatorSeries::empty(indicator_type);
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let ema = ema_raw(&closes, period);
    let atr = calculate_atr(bars, period);
    let mult = atr_mult_x100 as f64 / 100.0;

    let mut values = Vec::with_capacity(bars.len());
    for (i, bar) in bars.iter().enumerate() {
        let value = atr.simple_at(i).map(|atr_val| {
            let middle = ema[i];
            IndicatorValue::Bands {
                upper: middle + mult * atr_val,
                middle,
                lower: middle - mult * atr_val,
            }
        });
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
