//! Alert monitor configuration. A TOML document mapping symbols to rule
//! specifications; malformed or inconsistent config is fatal at load time.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::domain::error::TwinError;

pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 300;
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.7;

#[derive(Debug, Clone, Deserialize)]
pub struct AlertConfig {
    #[serde(default = "default_channels")]
    pub channels: Vec<String>,
    /// Seconds between monitor ticks.
    #[serde(default = "default_check_interval")]
    pub check_interval: u64,
    #[serde(default = "default_alert_log")]
    pub alert_log: PathBuf,
    /// Data source, one of the two. The CLI may override both.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default)]
    pub db_path: Option<PathBuf>,
    pub symbols: BTreeMap<String, Vec<RuleSpec>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RuleSpec {
    pub name: String,
    /// Registry name of the condition function.
    pub condition: String,
    /// Registry name of the confidence scorer; absent scores 1.0.
    #[serde(default)]
    pub confidence: Option<String>,
    /// Registry name of the summary formatter; absent formats empty.
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub simulate_trade: bool,
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
}

fn default_channels() -> Vec<String> {
    vec!["console".to_string()]
}

fn default_check_interval() -> u64 {
    DEFAULT_CHECK_INTERVAL_SECS
}

fn default_alert_log() -> PathBuf {
    PathBuf::from("alerts.log")
}

fn default_min_confidence() -> f64 {
    DEFAULT_MIN_CONFIDENCE
}

impl AlertConfig {
    pub fn load(path: &Path) -> Result<Self, TwinError> {
        let raw = std::fs::read_to_string(path).map_err(|e| TwinError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let config: AlertConfig =
            toml::from_str(&raw).map_err(|e| TwinError::ConfigParse {
                file: path.display().to_string(),
                reason: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), TwinError> {
        if self.check_interval == 0 {
            return Err(TwinError::ConfigInvalid {
                reason: "check_interval must be greater than zero".to_string(),
            });
        }
        if self.symbols.is_empty() {
            return Err(TwinError::ConfigInvalid {
                reason: "no symbols configured".to_string(),
            });
        }
        for (symbol, rules) in &self.symbols {
            for rule in rules {
                if !(0.0..=1.0).contains(&rule.min_confidence) {
                    return Err(TwinError::ConfigInvalid {
                        reason: format!(
                            "rule '{}' for {} has min_confidence {} outside [0, 1]",
                            rule.name, symbol, rule.min_confidence
                        ),
                    });
                }
            }
        }
        Ok(())
    }
}
