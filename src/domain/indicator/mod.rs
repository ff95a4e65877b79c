//! Technical indicator implementations.
//!
//! Every indicator is a pure function `calculate_x(bars, params) -> IndicatorSeries`
//! producing one point per input bar. Rolling-window indicators carry `None`
//! until the window fills: a missing value means "insufficient history", not
//! zero, and any comparison against a missing value evaluates to false
//! (see [`safe_above`]).

pub mod sma;
pub mod ema;
pub mod vwap;
pub mod macd;
pub mod rsi;
pub mod atr;
pub mod bollinger;
pub mod keltner;
pub mod stoch_rsi;
pub mod fibonacci;

use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    /// `None` while the indicator's window is still warming up.
    pub value: Option<IndicatorValue>,
}

#[derive(Debug, Clone)]
pub enum IndicatorValue {
    Simple(f64),
    Macd {
        line: f64,
        signal: f64,
        histogram: f64,
    },
    Stochastic {
        k: f64,
        d: f64,
    },
    Bands {
        upper: f64,
        middle: f64,
        lower: f64,
    },
    Fibonacci {
        high: f64,
        low: f64,
        levels: [f64; 5],
    },
}

/// Indicator identity + parameters. Serves as the column key in an
/// [`IndicatorFrame`](crate::domain::frame::IndicatorFrame).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Atr(usize),
    Vwap,
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Bollinger {
        period: usize,
        stddev_mult_x100: u32,
    },
    Keltner {
        period: usize,
        atr_mult_x100: u32,
    },
    StochRsi {
        rsi_period: usize,
        stoch_period: usize,
        k: usize,
        d: usize,
    },
    Fibonacci(usize),
}

/// Which component of a multi-value indicator to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorField {
    Value,
    MacdLine,
    MacdSignal,
    MacdHistogram,
    StochK,
    StochD,
    BandUpper,
    BandMiddle,
    BandLower,
    FibHigh,
    FibLow,
    Fib236,
    Fib382,
    Fib500,
    Fib618,
    Fib786,
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorPoint {
    /// The single value of a `Simple` point, `None` during warm-up or for
    /// multi-value indicators.
    pub fn simple(&self) -> Option<f64> {
        match self.value {
            Some(IndicatorValue::Simple(v)) => Some(v),
            _ => None,
        }
    }

    pub fn field(&self, field: IndicatorField) -> Option<f64> {
        let value = self.value.as_ref()?;
        extract_field(value, field)
    }
}

impl IndicatorSeries {
    pub fn empty(indicator_type: IndicatorType) -> Self {
        IndicatorSeries {
            indicator_type,
            values: Vec::new(),
        }
    }

    /// Simple value at `index`, `None` out of range or during warm-up.
    pub fn simple_at(&self, index: usize) -> Option<f64> {
        self.values.get(index).and_then(IndicatorPoint::simple)
    }

    pub fn field_at(&self, index: usize, field: IndicatorField) -> Option<f64> {
        self.values.get(index).and_then(|p| p.field(field))
    }
}

fn extract_field(value: &IndicatorValue, field: IndicatorField) -> Option<f64> {
    match (value, field) {
        (IndicatorValue::Simple(v), IndicatorField::Value) => Some(*v),
        (IndicatorValue::Macd { line, .. }, IndicatorField::MacdLine) => Some(*line),
        (IndicatorValue::Macd { signal, .. }, IndicatorField::MacdSignal) => Some(*signal),
        (IndicatorValue::Macd { histogram, .. }, IndicatorField::MacdHistogram) => {
            Some(*histogram)
        }
        (IndicatorValue::Stochastic { k, .. }, IndicatorField::StochK) => Some(*k),
        (IndicatorValue::Stochastic { d, .. }, IndicatorField::StochD) => Some(*d),
        (IndicatorValue::Bands { upper, .. }, IndicatorField::BandUpper) => Some(*upper),
        (IndicatorValue::Bands { middle, .. }, IndicatorField::BandMiddle) => Some(*middle),
        (IndicatorValue::Bands { lower, .. }, IndicatorField::BandLower) => Some(*lower),
        (IndicatorValue::Fibonacci { high, .. }, IndicatorField::FibHigh) => Some(*high),
        (IndicatorValue::Fibonacci { low, .. }, IndicatorField::FibLow) => Some(*low),
        (IndicatorValue::Fibonacci { levels, .. }, IndicatorField::Fib236) => Some(levels[0]),
        (IndicatorValue::Fibonacci { levels, .. }, IndicatorField::Fib382) => Some(levels[1]),
        (IndicatorValue::Fibonacci { levels, .. }, IndicatorField::Fib500) => Some(levels[2]),
        (IndicatorValue::Fibonacci { levels, .. }, IndicatorField::Fib618) => Some(levels[3]),
        (IndicatorValue::Fibonacci { levels, .. }, IndicatorField::Fib786) => Some(levels[4]),
        _ => None,
    }
}

/// `a > b`, false when either operand is missing.
pub fn safe_above(a: Option<f64>, b: Option<f64>) -> bool {
    matches!((a, b), (Some(x), Some(y)) if x > y)
}

/// `a < b`, false when either operand is missing.
pub fn safe_below(a: Option<f64>, b: Option<f64>) -> bool {
    matches!((a, b), (Some(x), Some(y)) if x < y)
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Atr(period) => write!(f, "ATR({})", period),
            IndicatorType::Vwap => write!(f, "VWAP"),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
            } => {
                let mult = *stddev_mult_x100 as f64 / 100.0;
                write!(f, "BOLLINGER({},{})", period, mult)
            }
            IndicatorType::Keltner {
                period,
                atr_mult_x100,
            } => {
                let mult = *atr_mult_x100 as f64 / 100.0;
                write!(f, "KELTNER({},{})", period, mult)
            }
            IndicatorType::StochRsi {
                rsi_period,
                stoch_period,
                k,
                d,
            } => write!(f, "STOCHRSI({},{},{},{})", rsi_period, stoch_period, k, d),
            IndicatorType::Fibonacci(window) => write!(f, "FIB({})", window),
        }
    }
}
