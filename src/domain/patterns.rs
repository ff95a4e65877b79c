//! Pattern and event detection over an indicator frame: moving-average
//! crossovers, trend classification, support/resistance, TTM squeeze.

use serde::Serialize;
use std::fmt;

use crate::domain::frame::IndicatorFrame;
use crate::domain::indicator::{IndicatorField, IndicatorType};

pub const SUPPORT_RESISTANCE_WINDOW: usize = 20;
pub const TREND_EMA_PERIOD: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Trend {
    #[serde(rename = "Trending Up")]
    TrendingUp,
    #[serde(rename = "Trending Down")]
    TrendingDown,
    #[serde(rename = "Consolidating")]
    Consolidating,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::TrendingUp => write!(f, "Trending Up"),
            Trend::TrendingDown => write!(f, "Trending Down"),
            Trend::Consolidating => write!(f, "Consolidating"),
        }
    }
}

/// Per-bar pattern columns aligned with the frame's bars.
#[derive(Debug, Clone)]
pub struct PatternSet {
    pub golden_cross: Vec<bool>,
    pub trend: Vec<Trend>,
    pub support: Vec<f64>,
    pub resistance: Vec<f64>,
    /// `None` while Bollinger or Keltner bands are still warming up.
    pub squeeze_on: Vec<Option<bool>>,
}

impl PatternSet {
    /// Detect the standard pattern columns: golden cross of EMA(50) over
    /// EMA(20), trend vs EMA(20), 20-bar support/resistance, and the TTM
    /// squeeze from Bollinger(20, 2σ) inside Keltner(20, 1.5×ATR).
    pub fn detect(frame: &IndicatorFrame) -> Self {
        PatternSet {
            golden_cross: detect_golden_cross(
                frame,
                &IndicatorType::Ema(50),
                &IndicatorType::Ema(20),
            ),
            trend: classify_trend(frame, TREND_EMA_PERIOD),
            support: rolling_support(frame, SUPPORT_RESISTANCE_WINDOW),
            resistance: rolling_resistance(frame, SUPPORT_RESISTANCE_WINDOW),
            squeeze_on: detect_squeeze(frame),
        }
    }
}

/// True only on the bar where `fast` transitions from ≤ `slow` to > `slow`.
/// Equality counts as not crossed; missing values make the bar false.
pub fn detect_golden_cross(
    frame: &IndicatorFrame,
    fast: &IndicatorType,
    slow: &IndicatorType,
) -> Vec<bool> {
    (0..frame.len())
        .map(|i| {
            if i == 0 {
                return false;
            }
            match (
                frame.simple(fast, i),
                frame.simple(slow, i),
                frame.simple(fast, i - 1),
                frame.simple(slow, i - 1),
            ) {
                (Some(f_curr), Some(s_curr), Some(f_prev), Some(s_prev)) => {
                    f_curr > s_curr && f_prev <= s_prev
                }
                _ => false,
            }
        })
        .collect()
}

/// Close above EMA(n) ⇒ trending up, below ⇒ trending down; exact equality
/// and EMA warm-up both classify as consolidating.
pub fn classify_trend(frame: &IndicatorFrame, ema_period: usize) -> Vec<Trend> {
    let ema_type = IndicatorType::Ema(ema_period);
    (0..frame.len())
        .map(|i| match frame.simple(&ema_type, i) {
            Some(ema) if frame.bars[i].close > ema => Trend::TrendingUp,
            Some(ema) if frame.bars[i].close < ema => Trend::TrendingDown,
            _ => Trend::Consolidating,
        })
        .collect()
}

/// Rolling min(Low), inclusive of the current bar, minimum period 1 — defined
/// from the first bar, degenerate until the window fills.
pub fn rolling_support(frame: &IndicatorFrame, window: usize) -> Vec<f64> {
    (0..frame.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            frame.bars[start..=i]
                .iter()
                .map(|b| b.low)
                .fold(f64::INFINITY, f64::min)
        })
        .collect()
}

/// Rolling max(High), same window semantics as [`rolling_support`].
pub fn rolling_resistance(frame: &IndicatorFrame, window: usize) -> Vec<f64> {
    (0..frame.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            frame.bars[start..=i]
                .iter()
                .map(|b| b.high)
                .fold(f64::NEG_INFINITY, f64::max)
        })
        .collect()
}

/// TTM squeeze: on when the Bollinger Bands sit strictly inside the Keltner
/// Channels (BB_lower > KC_lower AND BB_upper < KC_upper).
pub fn detect_squeeze(frame: &IndicatorFrame) -> Vec<Option<bool>> {
    let bb = IndicatorType::Bollinger {
        period: 20,
        stddev_mult_x100: 200,
    };
    let kc = IndicatorType::Keltner {
        period: 20,
        atr_mult_x100: 150,
    };

    (0..frame.len())
        .map(|i| {
            let bb_upper = frame.field(&bb, IndicatorField::BandUpper, i)?;
            let bb_lower = frame.field(&bb, IndicatorField::BandLower, i)?;
            let kc_upper = frame.field(&kc, IndicatorField::BandUpper, i)?;
            let kc_lower = frame.field(&kc, IndicatorField::BandLower, i)?;
            Some(bb_lower > kc_lower && bb_upper < kc_upper)
        })
        .collect()
}
