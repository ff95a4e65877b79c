//! Indicator-enriched series: the bars of one symbol plus computed indicator
//! columns, keyed by [`IndicatorType`]. Columns are an append-only derivation;
//! bar fields are never mutated.

use std::collections::HashMap;

use crate::domain::indicator::atr::calculate_atr;
use crate::domain::indicator::bollinger::calculate_bollinger;
use crate::domain::indicator::ema::calculate_ema;
use crate::domain::indicator::fibonacci::{self, calculate_fibonacci};
use crate::domain::indicator::keltner::{self, calculate_keltner};
use crate::domain::indicator::macd::{self, calculate_macd};
use crate::domain::indicator::rsi::{self, calculate_rsi};
use crate::domain::indicator::sma::calculate_sma;
use crate::domain::indicator::stoch_rsi::calculate_stoch_rsi;
use crate::domain::indicator::vwap::calculate_vwap;
use crate::domain::indicator::{IndicatorField, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::Bar;

#[derive(Debug, Clone)]
pub struct IndicatorFrame {
    pub symbol: String,
    pub bars: Vec<Bar>,
    columns: HashMap<IndicatorType, IndicatorSeries>,
}

impl IndicatorFrame {
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Self {
        IndicatorFrame {
            symbol: symbol.into(),
            bars,
            columns: HashMap::new(),
        }
    }

    /// Frame with the standard indicator catalogue used by the twin state:
    /// EMA 9/20/50, SMA 20, VWAP, MACD(12,26,9), RSI(14), Bollinger(20, 2σ),
    /// Keltner(20, 1.5×ATR), ATR(14), Stochastic RSI(14,14,3,3), Fib(50).
    pub fn standard(symbol: impl Into<String>, bars: Vec<Bar>) -> Self {
        let mut frame = Self::new(symbol, bars);
        for period in [9, 20, 50] {
            frame.add(calculate_ema(&frame.bars, period));
        }
        frame.add(calculate_sma(&frame.bars, 20));
        frame.add(calculate_vwap(&frame.bars));
        frame.add(calculate_macd(
            &frame.bars,
            macd::DEFAULT_FAST,
            macd::DEFAULT_SLOW,
            macd::DEFAULT_SIGNAL,
        ));
        frame.add(calculate_rsi(&frame.bars, rsi::DEFAULT_PERIOD));
        frame.add(calculate_bollinger(&frame.bars, 20, 200));
        frame.add(calculate_keltner(
            &frame.bars,
            keltner::DEFAULT_PERIOD,
            keltner::DEFAULT_ATR_MULT_X100,
        ));
        frame.add(calculate_atr(&frame.bars, 14));
        frame.add(calculate_stoch_rsi(&frame.bars, 14, 14, 3, 3));
        frame.add(calculate_fibonacci(&frame.bars, fibonacci::DEFAULT_WINDOW));
        frame
    }

    pub fn add(&mut self, series: IndicatorSeries) {
        self.columns.insert(series.indicator_type.clone(), series);
    }

    pub fn series(&self, indicator_type: &IndicatorType) -> Option<&IndicatorSeries> {
        self.columns.get(indicator_type)
    }

    /// Simple value of `indicator_type` at `index`; `None` when the column is
    /// absent, the index is out of range, or the window is still warming up.
    pub fn simple(&self, indicator_type: &IndicatorType, index: usize) -> Option<f64> {
        self.columns
            .get(indicator_type)
            .and_then(|s| s.simple_at(index))
    }

    pub fn field(
        &self,
        indicator_type: &IndicatorType,
        field: IndicatorField,
        index: usize,
    ) -> Option<f64> {
        self.columns
            .get(indicator_type)
            .and_then(|s| s.field_at(index, field))
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last_index(&self) -> Option<usize> {
        self.bars.len().checked_sub(1)
    }
}
