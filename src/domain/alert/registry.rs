//! Rule registry: maps the function names used in alert config to condition,
//! confidence and summary functions over a [`TwinState`]. Built once at
//! startup. Unknown names resolve to inert functions (condition never fires,
//! confidence 1.0, summary empty) and are logged rather than failing the run.

use std::collections::HashMap;

use crate::domain::twin_state::TwinState;

pub type ConditionFn = fn(&TwinState) -> bool;
pub type ConfidenceFn = fn(&TwinState) -> f64;
pub type SummaryFn = fn(&TwinState) -> String;

pub struct RuleRegistry {
    conditions: HashMap<&'static str, ConditionFn>,
    confidences: HashMap<&'static str, ConfidenceFn>,
    summaries: HashMap<&'static str, SummaryFn>,
}

impl RuleRegistry {
    pub fn builtin() -> Self {
        let mut conditions: HashMap<&'static str, ConditionFn> = HashMap::new();
        conditions.insert("macd_bullish_crossover", macd_bullish_crossover);
        conditions.insert("rsi_oversold", rsi_oversold);
        conditions.insert("golden_cross", golden_cross);
        conditions.insert("squeeze_on", squeeze_on);
        conditions.insert("confirmation", confirmation);

        let mut confidences: HashMap<&'static str, ConfidenceFn> = HashMap::new();
        confidences.insert("macd_confidence", macd_confidence);
        confidences.insert("rsi_confidence", rsi_confidence);

        let mut summaries: HashMap<&'static str, SummaryFn> = HashMap::new();
        summaries.insert("macd_summary", macd_summary);
        summaries.insert("rsi_summary", rsi_summary);

        RuleRegistry {
            conditions,
            confidences,
            summaries,
        }
    }

    /// Unknown names warn once here and never trigger.
    pub fn condition(&self, name: &str) -> ConditionFn {
        match self.conditions.get(name) {
            Some(&f) => f,
            None => {
                log::warn!("unknown alert condition '{name}', rule will never trigger");
                |_| false
            }
        }
    }

    /// `None` or an unknown name scores a flat 1.0.
    pub fn confidence(&self, name: Option<&str>) -> ConfidenceFn {
        match name {
            None => |_| 1.0,
            Some(name) => match self.confidences.get(name) {
                Some(&f) => f,
                None => {
                    log::warn!("unknown confidence scorer '{name}', scoring 1.0");
                    |_| 1.0
                }
            },
        }
    }

    /// `None` or an unknown name formats an empty summary.
    pub fn summary(&self, name: Option<&str>) -> SummaryFn {
        match name {
            None => |_| String::new(),
            Some(name) => match self.summaries.get(name) {
                Some(&f) => f,
                None => {
                    log::warn!("unknown summary formatter '{name}', formatting empty");
                    |_| String::new()
                }
            },
        }
    }
}

fn macd_bullish_crossover(state: &TwinState) -> bool {
    state.macd_cross
}

fn macd_confidence(state: &TwinState) -> f64 {
    if state.macd_cross { 0.8 } else { 0.0 }
}

fn macd_summary(state: &TwinState) -> String {
    format!(
        "MACD bullish crossover detected. MACD: {}, Signal: {}",
        fmt_opt(state.macd_line),
        fmt_opt(state.macd_signal)
    )
}

fn rsi_oversold(state: &TwinState) -> bool {
    matches!(state.rsi, Some(v) if v < 30.0)
}

fn rsi_confidence(state: &TwinState) -> f64 {
    match state.rsi {
        Some(v) if v < 20.0 => 1.0,
        Some(v) if v < 30.0 => 0.8,
        _ => 0.0,
    }
}

fn rsi_summary(state: &TwinState) -> String {
    format!("RSI oversold: {}", fmt_opt(state.rsi))
}

fn golden_cross(state: &TwinState) -> bool {
    state.golden_cross
}

fn squeeze_on(state: &TwinState) -> bool {
    state.squeeze_on
}

fn confirmation(state: &TwinState) -> bool {
    state.confirmation
}

fn fmt_opt(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.4}"),
        None => "n/a".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::patterns::Trend;
    use chrono::NaiveDate;

    fn state() -> TwinState {
        TwinState {
            symbol: "TEST".into(),
            date: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            close: 100.0,
            above_ema_9: true,
            above_ema_20: true,
            above_ema_50: true,
            above_sma_20: true,
            above_vwap: true,
            macd_cross: true,
            macd_line: Some(1.25),
            macd_signal: Some(1.0),
            rsi: Some(25.0),
            squeeze_on: false,
            golden_cross: false,
            trend: Trend::TrendingUp,
            support: 95.0,
            resistance: 105.0,
            signals: vec![],
            confirmation: true,
        }
    }

    #[test]
    fn macd_rule_triad() {
        let registry = RuleRegistry::builtin();
        let s = state();

        assert!(registry.condition("macd_bullish_crossover")(&s));
        assert_eq!(registry.confidence(Some("macd_confidence"))(&s), 0.8);
        let summary = registry.summary(Some("macd_summary"))(&s);
        assert!(summary.contains("1.2500"));
        assert!(summary.contains("1.0000"));
    }

    #[test]
    fn rsi_confidence_tiers() {
        let registry = RuleRegistry::builtin();
        let scorer = registry.confidence(Some("rsi_confidence"));

        let mut s = state();
        s.rsi = Some(15.0);
        assert_eq!(scorer(&s), 1.0);
        s.rsi = Some(25.0);
        assert_eq!(scorer(&s), 0.8);
        s.rsi = Some(50.0);
        assert_eq!(scorer(&s), 0.0);
        s.rsi = None;
        assert_eq!(scorer(&s), 0.0);
    }

    #[test]
    fn rsi_oversold_false_on_missing() {
        let registry = RuleRegistry::builtin();
        let mut s = state();
        s.rsi = None;
        assert!(!registry.condition("rsi_oversold")(&s));
    }

    #[test]
    fn unknown_names_are_inert() {
        let registry = RuleRegistry::builtin();
        let s = state();

        assert!(!registry.condition("does_not_exist")(&s));
        assert_eq!(registry.confidence(Some("does_not_exist"))(&s), 1.0);
        assert_eq!(registry.summary(Some("does_not_exist"))(&s), "");
    }

    #[test]
    fn absent_scorer_and_formatter_defaults() {
        let registry = RuleRegistry::builtin();
        let s = state();
        assert_eq!(registry.confidence(None)(&s), 1.0);
        assert_eq!(registry.summary(None)(&s), "");
    }

    #[test]
    fn supplementary_conditions() {
        let registry = RuleRegistry::builtin();
        let mut s = state();

        assert!(!registry.condition("golden_cross")(&s));
        s.golden_cross = true;
        assert!(registry.condition("golden_cross")(&s));

        s.squeeze_on = true;
        assert!(registry.condition("squeeze_on")(&s));
        assert!(registry.condition("confirmation")(&s));
    }
}
