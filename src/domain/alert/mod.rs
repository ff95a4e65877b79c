//! Rule-driven alerting over twin-state snapshots: TOML configuration, an
//! explicit rule registry, an append-only deduplicating JSONL log, pluggable
//! notification channels, and the polling monitor that ties them together.

pub mod channels;
pub mod config;
pub mod log;
pub mod monitor;
pub mod registry;

pub use channels::Channel;
pub use config::{AlertConfig, RuleSpec};
pub use log::{Alert, AlertLog};
pub use monitor::AlertMonitor;
pub use registry::RuleRegistry;
