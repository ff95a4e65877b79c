//! Notification channels. Console is built in; an alert fans out to every
//! configured channel.

use crate::domain::alert::log::Alert;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Console,
}

impl Channel {
    /// Unrecognised names are dropped with a warning, not fatal.
    pub fn parse_all(names: &[String]) -> Vec<Channel> {
        names
            .iter()
            .filter_map(|name| match name.as_str() {
                "console" => Some(Channel::Console),
                other => {
                    log::warn!("unknown alert channel '{other}', ignoring");
                    None
                }
            })
            .collect()
    }

    pub fn send(&self, alert: &Alert) {
        match self {
            Channel::Console => {
                println!(
                    "[ALERT] {} | {} | {} | {} | Confidence: {}",
                    alert.timestamp, alert.symbol, alert.rule, alert.summary, alert.confidence
                );
            }
        }
    }
}

pub fn dispatch(alert: &Alert, channels: &[Channel]) {
    for channel in channels {
        channel.send(alert);
    }
}
