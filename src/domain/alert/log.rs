//! Append-only JSON-lines alert log with startup deduplication. The full log
//! is replayed once at open to rebuild the in-memory set of already-fired
//! alert ids; unparseable lines are skipped.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::domain::error::TwinError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub symbol: String,
    pub rule: String,
    pub confidence: f64,
    pub summary: String,
    pub timestamp: NaiveDate,
}

#[derive(Debug, Serialize, Deserialize)]
struct AlertRecord {
    alert_id: String,
    #[serde(flatten)]
    alert: Alert,
}

#[derive(Debug)]
pub struct AlertLog {
    path: PathBuf,
    logged: HashSet<String>,
}

impl AlertLog {
    pub fn open(path: &Path) -> Result<Self, TwinError> {
        let mut logged = HashSet::new();
        if path.exists() {
            let file = File::open(path)?;
            for line in BufReader::new(file).lines() {
                let line = line?;
                if let Ok(record) = serde_json::from_str::<AlertRecord>(line.trim()) {
                    logged.insert(record.alert_id);
                }
            }
        }
        Ok(AlertLog {
            path: path.to_path_buf(),
            logged,
        })
    }

    pub fn is_duplicate(&self, alert_id: &str) -> bool {
        self.logged.contains(alert_id)
    }

    pub fn append(&mut self, alert_id: &str, alert: &Alert) -> Result<(), TwinError> {
        let record = AlertRecord {
            alert_id: alert_id.to_string(),
            alert: alert.clone(),
        };
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut line = serde_json::to_string(&record)?;
        line.push('\n');
        file.write_all(line.as_bytes())?;
        self.logged.insert(alert_id.to_string());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.logged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logged.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn sample_alert() -> Alert {
        Alert {
            symbol: "AAPL".into(),
            rule: "macd_buy".into(),
            confidence: 0.8,
            summary: "MACD bullish crossover detected.".into(),
            timestamp: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
        }
    }

    #[test]
    fn missing_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = AlertLog::open(&dir.path().join("alerts.log")).unwrap();
        assert!(log.is_empty());
    }

    #[test]
    fn append_then_dedup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alerts.log");
        let mut log = AlertLog::open(&path).unwrap();

        let id = "AAPL:macd_buy:2024-06-03";
        assert!(!log.is_duplicate(id));
        log.append(id, &sample_alert()).unwrap();
        assert!(log.is_duplicate(id));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn dedup_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alerts.log");
        let id = "AAPL:macd_buy:2024-06-03";

        {
            let mut log = AlertLog::open(&path).unwrap();
            log.append(id, &sample_alert()).unwrap();
        }

        let reopened = AlertLog::open(&path).unwrap();
        assert!(reopened.is_duplicate(id));
        assert!(!reopened.is_duplicate("AAPL:macd_buy:2024-06-04"));
    }

    #[test]
    fn unparseable_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alerts.log");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "not json at all").unwrap();
        writeln!(
            file,
            r#"{{"alert_id":"AAPL:r:2024-06-03","symbol":"AAPL","rule":"r","confidence":1.0,"summary":"","timestamp":"2024-06-03"}}"#
        )
        .unwrap();

        let log = AlertLog::open(&path).unwrap();
        assert_eq!(log.len(), 1);
        assert!(log.is_duplicate("AAPL:r:2024-06-03"));
    }

    #[test]
    fn records_round_trip_as_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alerts.log");
        let mut log = AlertLog::open(&path).unwrap();
        log.append("AAPL:macd_buy:2024-06-03", &sample_alert()).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let record: AlertRecord = serde_json::from_str(contents.trim()).unwrap();
        assert_eq!(record.alert_id, "AAPL:macd_buy:2024-06-03");
        assert_eq!(record.alert.symbol, "AAPL");
        assert_eq!(record.alert.confidence, 0.8);
    }
}
