//! CSV directory data adapter. One `SYMBOL.csv` per symbol with a
//! `date,open,high,low,close,volume` header, dates ascending or not — rows
//! are keyed by date, so output is always sorted and deduplicated
//! (last row wins).

use crate::domain::error::TwinError;
use crate::domain::ohlcv::Bar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{symbol}.csv"))
    }

    fn read_all(&self, symbol: &str) -> Result<BTreeMap<NaiveDate, Bar>, TwinError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| TwinError::DataSource {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = BTreeMap::new();

        for result in rdr.records() {
            let record = result.map_err(|e| TwinError::DataSource {
                reason: format!("CSV parse error: {e}"),
            })?;

            let field = |i: usize, name: &str| {
                record.get(i).ok_or_else(|| TwinError::DataSource {
                    reason: format!("missing {name} column"),
                })
            };

            let date = NaiveDate::parse_from_str(field(0, "date")?, "%Y-%m-%d").map_err(
                |e| TwinError::DataSource {
                    reason: format!("invalid date format: {e}"),
                },
            )?;
            let parse_f64 = |i: usize, name: &str| -> Result<f64, TwinError> {
                field(i, name)?.parse().map_err(|e| TwinError::DataSource {
                    reason: format!("invalid {name} value: {e}"),
                })
            };

            let open = parse_f64(1, "open")?;
            let high = parse_f64(2, "high")?;
            let low = parse_f64(3, "low")?;
            let close = parse_f64(4, "close")?;
            let volume: i64 =
                field(5, "volume")?
                    .parse()
                    .map_err(|e| TwinError::DataSource {
                        reason: format!("invalid volume value: {e}"),
                    })?;

            bars.insert(
                date,
                Bar {
                    symbol: symbol.to_string(),
                    date,
                    open,
                    high,
                    low,
                    close,
                    volume,
                },
            );
        }

        Ok(bars)
    }
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<Bar>, TwinError> {
        let bars = self.read_all(symbol)?;
        Ok(bars
            .into_values()
            .filter(|bar| start.is_none_or(|s| bar.date >= s))
            .filter(|bar| end.is_none_or(|e| bar.date <= e))
            .collect())
    }

    fn list_symbols(&self) -> Result<Vec<String>, TwinError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| TwinError::DataSource {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| TwinError::DataSource {
                reason: format!("directory entry error: {e}"),
            })?;
            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if let Some(symbol) = name_str.strip_suffix(".csv") {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, TwinError> {
        if !self.csv_path(symbol).exists() {
            return Ok(None);
        }
        let bars = self.read_all(symbol)?;
        let first = bars.keys().next().copied();
        let last = bars.keys().next_back().copied();
        Ok(match (first, last) {
            (Some(min), Some(max)) => Some((min, max, bars.len())),
            _ => None,
        })
    }
}
