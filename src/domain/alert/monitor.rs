//! Polling alert monitor. Each tick loads every configured symbol through the
//! injected data port, snapshots its twin state, and evaluates the resolved
//! rules against it. Triggered alerts are deduplicated per (symbol, rule,
//! latest bar date), fanned out to the channels, and appended to the log.

use std::thread;
use std::time::Duration;

use crate::domain::alert::channels::{self, Channel};
use crate::domain::alert::config::AlertConfig;
use crate::domain::alert::log::{Alert, AlertLog};
use crate::domain::alert::registry::{ConditionFn, ConfidenceFn, RuleRegistry, SummaryFn};
use crate::domain::error::TwinError;
use crate::domain::twin_state::TwinState;
use crate::ports::data_port::DataPort;

struct ResolvedRule {
    name: String,
    condition: ConditionFn,
    confidence: ConfidenceFn,
    summary: SummaryFn,
    simulate_trade: bool,
    min_confidence: f64,
}

pub struct AlertMonitor<'a> {
    check_interval: Duration,
    channels: Vec<Channel>,
    rules: Vec<(String, Vec<ResolvedRule>)>,
    log: AlertLog,
    data: &'a dyn DataPort,
}

impl<'a> AlertMonitor<'a> {
    /// Resolves every configured rule name against the registry up front so
    /// unknown names warn once, not every tick.
    pub fn new(config: &AlertConfig, data: &'a dyn DataPort) -> Result<Self, TwinError> {
        config.validate()?;
        let registry = RuleRegistry::builtin();
        let rules = config
            .symbols
            .iter()
            .map(|(symbol, specs)| {
                let resolved = specs
                    .iter()
                    .map(|spec| ResolvedRule {
                        name: spec.name.clone(),
                        condition: registry.condition(&spec.condition),
                        confidence: registry.confidence(spec.confidence.as_deref()),
                        summary: registry.summary(spec.summary.as_deref()),
                        simulate_trade: spec.simulate_trade,
                        min_confidence: spec.min_confidence,
                    })
                    .collect();
                (symbol.clone(), resolved)
            })
            .collect();

        Ok(AlertMonitor {
            check_interval: Duration::from_secs(config.check_interval),
            channels: Channel::parse_all(&config.channels),
            rules,
            log: AlertLog::open(&config.alert_log)?,
            data,
        })
    }

    /// One evaluation pass over all symbols; returns the alerts dispatched.
    pub fn tick(&mut self) -> Result<Vec<Alert>, TwinError> {
        let mut dispatched = Vec::new();

        for (symbol, rules) in &self.rules {
            let bars = match self.data.fetch_ohlcv(symbol, None, None) {
                Ok(bars) => bars,
                Err(e) => {
                    log::warn!("skipping {symbol}: {e}");
                    continue;
                }
            };
            let Some(state) = TwinState::snapshot(symbol, bars) else {
                log::debug!("skipping {symbol}: no data");
                continue;
            };

            for rule in rules {
                if !(rule.condition)(&state) {
                    continue;
                }
                let alert_id = format!("{symbol}:{}:{}", rule.name, state.date);
                if self.log.is_duplicate(&alert_id) {
                    log::debug!("suppressing duplicate alert {alert_id}");
                    continue;
                }

                let alert = Alert {
                    symbol: symbol.clone(),
                    rule: rule.name.clone(),
                    confidence: (rule.confidence)(&state),
                    summary: (rule.summary)(&state),
                    timestamp: state.date,
                };
                channels::dispatch(&alert, &self.channels);
                self.log.append(&alert_id, &alert)?;
                if rule.simulate_trade && alert.confidence >= rule.min_confidence {
                    simulate_trade(&alert);
                }
                dispatched.push(alert);
            }
        }

        Ok(dispatched)
    }

    /// Blocking poll loop.
    pub fn run(&mut self) -> Result<(), TwinError> {
        loop {
            let alerts = self.tick()?;
            log::info!("tick complete, {} alert(s) dispatched", alerts.len());
            thread::sleep(self.check_interval);
        }
    }
}

/// Logging-only trade execution for strong signals. No broker is attached.
fn simulate_trade(alert: &Alert) {
    log::info!(
        "[SIM TRADE] would execute trade for {} on {} (confidence: {})",
        alert.symbol,
        alert.rule,
        alert.confidence
    );
}
