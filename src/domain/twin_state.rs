//! Twin state: the flattened snapshot of the latest indicator and pattern
//! values for one symbol, used as the input to decision-making and alerting.
//!
//! The snapshot is a pure function of the frame tail — recomputed fully on
//! each request, never persisted. Missing indicator values (warm-up) make the
//! derived boolean fields false rather than erroring.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

use crate::domain::frame::IndicatorFrame;
use crate::domain::indicator::{safe_above, IndicatorField, IndicatorType};
use crate::domain::ohlcv::Bar;
use crate::domain::patterns::{PatternSet, Trend};

/// A named signal contributing to the bullish/bearish tally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Signal {
    #[serde(rename = "Golden Cross")]
    GoldenCross,
    #[serde(rename = "MACD Bullish")]
    MacdBullish,
    #[serde(rename = "RSI Oversold")]
    RsiOversold,
    #[serde(rename = "RSI Overbought")]
    RsiOverbought,
    #[serde(rename = "TTM Squeeze")]
    TtmSqueeze,
    /// Produced by the EMA-bounce strategy, not by the standard snapshot.
    #[serde(rename = "EMA bounce")]
    EmaBounce,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::GoldenCross => write!(f, "Golden Cross"),
            Signal::MacdBullish => write!(f, "MACD Bullish"),
            Signal::RsiOversold => write!(f, "RSI Oversold"),
            Signal::RsiOverbought => write!(f, "RSI Overbought"),
            Signal::TtmSqueeze => write!(f, "TTM Squeeze"),
            Signal::EmaBounce => write!(f, "EMA bounce"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TwinState {
    pub symbol: String,
    pub date: NaiveDate,
    #[serde(rename = "Close")]
    pub close: f64,
    #[serde(rename = "Above_EMA_9")]
    pub above_ema_9: bool,
    #[serde(rename = "Above_EMA_20")]
    pub above_ema_20: bool,
    #[serde(rename = "Above_EMA_50")]
    pub above_ema_50: bool,
    #[serde(rename = "Above_SMA_20")]
    pub above_sma_20: bool,
    #[serde(rename = "Above_VWAP")]
    pub above_vwap: bool,
    #[serde(rename = "MACD_Cross")]
    pub macd_cross: bool,
    #[serde(rename = "MACD")]
    pub macd_line: Option<f64>,
    #[serde(rename = "MACD_Signal")]
    pub macd_signal: Option<f64>,
    #[serde(rename = "RSI")]
    pub rsi: Option<f64>,
    #[serde(rename = "Squeeze_On")]
    pub squeeze_on: bool,
    #[serde(rename = "Golden_Cross")]
    pub golden_cross: bool,
    #[serde(rename = "Trend")]
    pub trend: Trend,
    #[serde(rename = "Support")]
    pub support: f64,
    #[serde(rename = "Resistance")]
    pub resistance: f64,
    #[serde(rename = "Signals")]
    pub signals: Vec<Signal>,
    #[serde(rename = "Confirmation")]
    pub confirmation: bool,
}

impl TwinState {
    /// Build the standard frame and patterns for `bars` and snapshot the tail.
    /// `None` when the series is empty.
    pub fn snapshot(symbol: &str, bars: Vec<Bar>) -> Option<TwinState> {
        let frame = IndicatorFrame::standard(symbol, bars);
        let patterns = PatternSet::detect(&frame);
        Self::from_frame(&frame, &patterns)
    }

    /// Snapshot the last row of an already-enriched frame.
    pub fn from_frame(frame: &IndicatorFrame, patterns: &PatternSet) -> Option<TwinState> {
        let i = frame.last_index()?;
        let bar = &frame.bars[i];
        let close = Some(bar.close);

        let macd_type = IndicatorType::Macd {
            fast: 12,
            slow: 26,
            signal: 9,
        };
        let macd_line = frame.field(&macd_type, IndicatorField::MacdLine, i);
        let macd_signal = frame.field(&macd_type, IndicatorField::MacdSignal, i);
        let macd_cross = safe_above(macd_line, macd_signal);

        let rsi = frame.simple(&IndicatorType::Rsi(14), i);
        let squeeze_on = patterns.squeeze_on[i].unwrap_or(false);
        let golden_cross = patterns.golden_cross[i];

        let mut signals = Vec::new();
        if golden_cross {
            signals.push(Signal::GoldenCross);
        }
        if macd_cross {
            signals.push(Signal::MacdBullish);
        }
        if matches!(rsi, Some(v) if v < 30.0) {
            signals.push(Signal::RsiOversold);
        }
        if matches!(rsi, Some(v) if v > 70.0) {
            signals.push(Signal::RsiOverbought);
        }
        if squeeze_on {
            signals.push(Signal::TtmSqueeze);
        }

        let above_ema_9 = safe_above(close, frame.simple(&IndicatorType::Ema(9), i));
        let above_vwap = safe_above(close, frame.simple(&IndicatorType::Vwap, i));

        let confirmations = [above_ema_9, above_vwap, macd_cross, golden_cross]
            .iter()
            .filter(|&&c| c)
            .count();

        Some(TwinState {
            symbol: frame.symbol.clone(),
            date: bar.date,
            close: bar.close,
            above_ema_9,
            above_ema_20: safe_above(close, frame.simple(&IndicatorType::Ema(20), i)),
            above_ema_50: safe_above(close, frame.simple(&IndicatorType::Ema(50), i)),
            above_sma_20: safe_above(close, frame.simple(&IndicatorType::Sma(20), i)),
            above_vwap,
            macd_cross,
            macd_line,
            macd_signal,
            rsi,
            squeeze_on,
            golden_cross,
            trend: patterns.trend[i],
            support: patterns.support[i],
            resistance: patterns.resistance[i],
            signals,
            confirmation: confirmations >= 3,
        })
    }

    pub fn has_signal(&self, signal: Signal) -> bool {
        self.signals.contains(&signal)
    }
}
