//! Rule-based decision engine: maps a twin state to a buy/sell/wait decision
//! with a confidence score and a human-readable explanation.
//!
//! Confidence is a signal-alignment ratio — the dominant bucket's share of
//! all triggered signals — not a calibrated probability.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::domain::error::TwinError;
use crate::domain::patterns::Trend;
use crate::domain::twin_state::{Signal, TwinState};
use crate::ports::data_port::DataPort;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Buy,
    Sell,
    Wait,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Buy => write!(f, "buy"),
            Action::Sell => write!(f, "sell"),
            Action::Wait => write!(f, "wait"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Decision {
    pub decision: Action,
    pub confidence: f64,
    pub explanation: String,
}

/// Single-symbol goals collapse to a bare decision; multi-symbol goals map
/// symbol → decision. The collapse is part of the API contract.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum DecisionOutcome {
    Single(Decision),
    Multi(BTreeMap<String, Decision>),
}

/// Decision engine over a data port. The port is injected; the engine holds
/// no global state and every call recomputes from a fresh series snapshot.
pub struct DecisionEngine<'a> {
    data: &'a dyn DataPort,
}

impl<'a> DecisionEngine<'a> {
    pub fn new(data: &'a dyn DataPort) -> Self {
        DecisionEngine { data }
    }

    /// Decide for a plain-language goal naming one or more known symbols.
    /// Data gaps are absorbed: the result is always a well-formed decision.
    pub fn decide(&self, goal: &str) -> Result<DecisionOutcome, TwinError> {
        let symbols = self.extract_symbols(goal)?;
        if symbols.is_empty() {
            return Ok(DecisionOutcome::Single(Decision {
                decision: Action::Wait,
                confidence: 0.0,
                explanation: "No symbol found in request.".into(),
            }));
        }

        let mut results = BTreeMap::new();
        for symbol in &symbols {
            let bars = self.data.fetch_ohlcv(symbol, None, None)?;
            let decision = match TwinState::snapshot(symbol, bars) {
                Some(state) => reason(&state),
                None => Decision {
                    decision: Action::Wait,
                    confidence: 0.0,
                    explanation: format!("No data found for {}.", symbol),
                },
            };
            results.insert(symbol.clone(), decision);
        }

        if results.len() == 1 {
            let (_, decision) = results.into_iter().next().unwrap();
            Ok(DecisionOutcome::Single(decision))
        } else {
            Ok(DecisionOutcome::Multi(results))
        }
    }

    /// Candidate symbols: tokens of 1-5 uppercase ASCII letters, filtered
    /// against the known-symbol catalogue. Unknown tokens are dropped
    /// silently. First occurrence wins; duplicates are collapsed.
    fn extract_symbols(&self, goal: &str) -> Result<Vec<String>, TwinError> {
        let known = self.data.list_symbols()?;
        let mut seen = Vec::new();

        for token in goal.split(|c: char| !c.is_ascii_alphabetic()) {
            if token.is_empty() || token.len() > 5 {
                continue;
            }
            if !token.chars().all(|c| c.is_ascii_uppercase()) {
                continue;
            }
            if known.iter().any(|s| s == token) && !seen.iter().any(|s| s == token) {
                seen.push(token.to_string());
            }
        }
        Ok(seen)
    }
}

/// Tally bullish and bearish checks over a state and resolve them to a
/// decision. The TTM squeeze contributes to both buckets: compression says
/// a move is coming but not its direction.
pub fn reason(state: &TwinState) -> Decision {
    let mut bullish: Vec<&str> = Vec::new();
    let mut bearish: Vec<&str> = Vec::new();

    if state.above_ema_9 && state.above_ema_20 && state.above_vwap {
        bullish.push("Price above EMAs and VWAP");
    }
    if state.macd_cross {
        bullish.push("MACD bullish crossover");
    }
    if state.golden_cross {
        bullish.push("Golden cross event");
    }
    if matches!(state.rsi, Some(rsi) if rsi < 35.0) {
        bullish.push("RSI oversold");
    }
    if state.has_signal(Signal::EmaBounce) {
        bullish.push("EMA bounce");
    }
    if state.squeeze_on {
        bullish.push("TTM Squeeze (potential breakout)");
    }

    if !state.above_ema_9 && !state.above_ema_20 && !state.above_vwap {
        bearish.push("Price below EMAs and VWAP");
    }
    if !state.macd_cross {
        bearish.push("MACD bearish or no cross");
    }
    if matches!(state.rsi, Some(rsi) if rsi > 70.0) {
        bearish.push("RSI overbought");
    }
    if state.trend == Trend::TrendingDown {
        bearish.push("Downtrend");
    }
    if state.squeeze_on {
        bearish.push("TTM Squeeze (potential breakdown)");
    }

    let nb = bullish.len();
    let nn = bearish.len();
    let total = nb + nn;

    let confidence = if total > 0 {
        round2(nb.max(nn) as f64 / total as f64)
    } else {
        0.0
    };

    let (decision, explain) = if nb >= 3 && nb > nn {
        (Action::Buy, bullish.join("; "))
    } else if nn >= 3 && nn > nb {
        (Action::Sell, bearish.join("; "))
    } else if total == 0 || nb.abs_diff(nn) < 2 {
        (
            Action::Wait,
            "Signals are mixed or unclear. No strong recommendation.".into(),
        )
    } else {
        (Action::Wait, "No clear alignment of signals.".into())
    };

    Decision {
        decision,
        confidence,
        explanation: explain,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn base_state() -> TwinState {
        TwinState {
            symbol: "TEST".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            close: 100.0,
            above_ema_9: false,
            above_ema_20: false,
            above_ema_50: false,
            above_sma_20: false,
            above_vwap: false,
            macd_cross: true,
            macd_line: Some(1.0),
            macd_signal: Some(0.5),
            rsi: Some(50.0),
            squeeze_on: false,
            golden_cross: false,
            trend: Trend::Consolidating,
            support: 95.0,
            resistance: 105.0,
            signals: vec![],
            confirmation: false,
        }
    }

    #[test]
    fn three_bullish_zero_bearish_is_buy_full_confidence() {
        let state = TwinState {
            above_ema_9: true,
            above_ema_20: true,
            above_vwap: true,
            macd_cross: true,
            golden_cross: true,
            ..base_state()
        };
        let d = reason(&state);

        assert_eq!(d.decision, Action::Buy);
        assert_eq!(d.confidence, 1.0);
        assert!(d.explanation.contains("Price above EMAs and VWAP"));
        assert!(d.explanation.contains("Golden cross event"));
    }

    #[test]
    fn two_vs_two_is_wait() {
        // Bullish: joint-above, MACD cross. Bearish: RSI overbought, downtrend.
        let state = TwinState {
            above_ema_9: true,
            above_ema_20: true,
            above_vwap: true,
            macd_cross: true,
            rsi: Some(75.0),
            trend: Trend::TrendingDown,
            ..base_state()
        };
        let d = reason(&state);

        assert_eq!(d.decision, Action::Wait);
        assert_eq!(d.confidence, 0.5);
        assert!(d.explanation.contains("mixed or unclear"));
    }

    #[test]
    fn bearish_alignment_is_sell() {
        let state = TwinState {
            macd_cross: false,
            rsi: Some(80.0),
            trend: Trend::TrendingDown,
            ..base_state()
        };
        // Bearish: below all, no MACD cross, RSI overbought, downtrend = 4.
        let d = reason(&state);

        assert_eq!(d.decision, Action::Sell);
        assert_eq!(d.confidence, 1.0);
        assert!(d.explanation.contains("Downtrend"));
    }

    #[test]
    fn squeeze_counts_both_ways() {
        let state = TwinState {
            squeeze_on: true,
            macd_cross: true,
            ..base_state()
        };
        // Bullish: MACD, squeeze. Bearish: squeeze. |2-1| < 2 → wait.
        let d = reason(&state);
        assert_eq!(d.decision, Action::Wait);
    }

    #[test]
    fn single_signal_is_mixed_wait() {
        let state = TwinState {
            above_ema_9: true, // breaks the joint-below check
            macd_cross: true,
            ..base_state()
        };
        let d = reason(&state);
        assert_eq!(d.decision, Action::Wait);
        // bullish: MACD only → 1 vs 0 → |1-0| < 2 → mixed.
        assert!(d.explanation.contains("mixed or unclear"));
    }

    #[test]
    fn missing_rsi_triggers_neither_rsi_check() {
        let state = TwinState {
            rsi: None,
            macd_cross: true,
            above_ema_9: true,
            ..base_state()
        };
        let d = reason(&state);
        assert!(!d.explanation.contains("RSI"));
    }

    #[test]
    fn confidence_bounds_and_rounding() {
        // 3 bullish vs 2 bearish → 3/5 = 0.6.
        let state = TwinState {
            above_ema_9: true,
            above_ema_20: true,
            above_vwap: true,
            macd_cross: true,
            squeeze_on: true,
            rsi: Some(75.0),
            ..base_state()
        };
        let d = reason(&state);
        assert_eq!(d.decision, Action::Buy);
        assert_eq!(d.confidence, 0.6);
    }

    mod engine {
        use super::*;
        use crate::domain::ohlcv::Bar;
        use std::collections::HashMap;

        struct MockPort {
            bars: HashMap<String, Vec<Bar>>,
        }

        impl MockPort {
            fn new() -> Self {
                MockPort {
                    bars: HashMap::new(),
                }
            }

            fn with_bars(mut self, symbol: &str, bars: Vec<Bar>) -> Self {
                self.bars.insert(symbol.to_string(), bars);
                self
            }
        }

        impl DataPort for MockPort {
            fn fetch_ohlcv(
                &self,
                symbol: &str,
                _start: Option<NaiveDate>,
                _end: Option<NaiveDate>,
            ) -> Result<Vec<Bar>, TwinError> {
                Ok(self.bars.get(symbol).cloned().unwrap_or_default())
            }

            fn list_symbols(&self) -> Result<Vec<String>, TwinError> {
                let mut symbols: Vec<String> = self.bars.keys().cloned().collect();
                symbols.sort();
                Ok(symbols)
            }

            fn get_data_range(
                &self,
                symbol: &str,
            ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, TwinError> {
                Ok(self.bars.get(symbol).and_then(|bars| {
                    Some((bars.first()?.date, bars.last()?.date, bars.len()))
                }))
            }
        }

        fn make_bars(symbol: &str, prices: &[f64]) -> Vec<Bar> {
            prices
                .iter()
                .enumerate()
                .map(|(i, &close)| Bar {
                    symbol: symbol.into(),
                    date: NaiveDate::from_ymd_opt(2024, 1, 1)
                        .unwrap()
                        .checked_add_days(chrono::Days::new(i as u64))
                        .unwrap(),
                    open: close,
                    high: close + 2.0,
                    low: close - 2.0,
                    close,
                    volume: 1000,
                })
                .collect()
        }

        /// Zigzag uptrend: +0.6/-0.4 alternation keeps RSI moderate while the
        /// wide daily range keeps the Bollinger bands inside Keltner (squeeze).
        fn zigzag_uptrend(n: usize) -> Vec<f64> {
            (0..n)
                .map(|i| {
                    let alt = if i % 2 == 1 { 0.25 } else { -0.25 };
                    100.0 + 0.1 * i as f64 + alt
                })
                .collect()
        }

        #[test]
        fn no_symbol_in_goal() {
            let port = MockPort::new().with_bars("ZZZ", vec![]);
            let engine = DecisionEngine::new(&port);

            let outcome = engine.decide("should i buy something?").unwrap();
            match outcome {
                DecisionOutcome::Single(d) => {
                    assert_eq!(d.decision, Action::Wait);
                    assert_eq!(d.confidence, 0.0);
                    assert_eq!(d.explanation, "No symbol found in request.");
                }
                _ => panic!("expected single decision"),
            }
        }

        #[test]
        fn unknown_tokens_silently_dropped() {
            let port = MockPort::new().with_bars("ZZZ", make_bars("ZZZ", &zigzag_uptrend(60)));
            let engine = DecisionEngine::new(&port);

            // "I" and "BUY"-like uppercase words are not in the catalogue.
            let outcome = engine.decide("Should I buy ZZZ or QQQQ?").unwrap();
            assert!(matches!(outcome, DecisionOutcome::Single(_)));
        }

        #[test]
        fn no_data_for_symbol() {
            let port = MockPort::new().with_bars("ZZZ", vec![]);
            let engine = DecisionEngine::new(&port);

            let outcome = engine.decide("Should I buy ZZZ?").unwrap();
            match outcome {
                DecisionOutcome::Single(d) => {
                    assert_eq!(d.decision, Action::Wait);
                    assert_eq!(d.confidence, 0.0);
                    assert_eq!(d.explanation, "No data found for ZZZ.");
                }
                _ => panic!("expected single decision"),
            }
        }

        #[test]
        fn uptrending_series_yields_buy() {
            let port = MockPort::new().with_bars("ZZZ", make_bars("ZZZ", &zigzag_uptrend(60)));
            let engine = DecisionEngine::new(&port);

            let outcome = engine.decide("Should I buy ZZZ?").unwrap();
            match outcome {
                DecisionOutcome::Single(d) => {
                    assert_eq!(d.decision, Action::Buy);
                    assert!(d.confidence > 0.5);
                }
                _ => panic!("expected single decision"),
            }
        }

        #[test]
        fn multi_symbol_goal_returns_map() {
            let port = MockPort::new()
                .with_bars("AAA", make_bars("AAA", &zigzag_uptrend(60)))
                .with_bars("BBB", vec![]);
            let engine = DecisionEngine::new(&port);

            let outcome = engine.decide("Compare AAA and BBB").unwrap();
            match outcome {
                DecisionOutcome::Multi(map) => {
                    assert_eq!(map.len(), 2);
                    assert_eq!(map["BBB"].decision, Action::Wait);
                }
                _ => panic!("expected multi decision"),
            }
        }

        #[test]
        fn decide_is_idempotent() {
            let port = MockPort::new().with_bars("ZZZ", make_bars("ZZZ", &zigzag_uptrend(60)));
            let engine = DecisionEngine::new(&port);

            let a = serde_json::to_string(&engine.decide("Should I buy ZZZ?").unwrap()).unwrap();
            let b = serde_json::to_string(&engine.decide("Should I buy ZZZ?").unwrap()).unwrap();
            assert_eq!(a, b);
        }
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn arb_state() -> impl Strategy<Value = TwinState> {
            (
                any::<bool>(),
                any::<bool>(),
                any::<bool>(),
                any::<bool>(),
                any::<bool>(),
                any::<bool>(),
                proptest::option::of(0.0..100.0f64),
                prop_oneof![
                    Just(Trend::TrendingUp),
                    Just(Trend::TrendingDown),
                    Just(Trend::Consolidating)
                ],
            )
                .prop_map(
                    |(e9, e20, vwap, macd, golden, squeeze, rsi, trend)| TwinState {
                        symbol: "P".into(),
                        date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                        close: 100.0,
                        above_ema_9: e9,
                        above_ema_20: e20,
                        above_ema_50: e20,
                        above_sma_20: e20,
                        above_vwap: vwap,
                        macd_cross: macd,
                        macd_line: None,
                        macd_signal: None,
                        rsi,
                        squeeze_on: squeeze,
                        golden_cross: golden,
                        trend,
                        support: 90.0,
                        resistance: 110.0,
                        signals: vec![],
                        confirmation: false,
                    },
                )
        }

        proptest! {
            #[test]
            fn confidence_always_in_unit_interval(state in arb_state()) {
                let d = reason(&state);
                prop_assert!((0.0..=1.0).contains(&d.confidence));
                // Rounded to 2 decimals.
                prop_assert!((d.confidence * 100.0 - (d.confidence * 100.0).round()).abs() < 1e-9);
            }

            #[test]
            fn decision_is_always_well_formed(state in arb_state()) {
                let d = reason(&state);
                prop_assert!(matches!(d.decision, Action::Buy | Action::Sell | Action::Wait));
                prop_assert!(!d.explanation.is_empty());
            }
        }
    }
}
