//! Shared test fixtures: an in-memory data port and bar generators.

use chrono::NaiveDate;
use markettwin::domain::error::TwinError;
use markettwin::domain::ohlcv::Bar;
use markettwin::ports::data_port::DataPort;
use std::collections::BTreeMap;

pub struct MockDataPort {
    bars: BTreeMap<String, Vec<Bar>>,
}

impl MockDataPort {
    pub fn new() -> Self {
        MockDataPort {
            bars: BTreeMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<Bar>) -> Self {
        self.bars.insert(symbol.to_string(), bars);
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<Bar>, TwinError> {
        Ok(self
            .bars
            .get(symbol)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|bar| start.is_none_or(|s| bar.date >= s))
            .filter(|bar| end.is_none_or(|e| bar.date <= e))
            .collect())
    }

    fn list_symbols(&self) -> Result<Vec<String>, TwinError> {
        Ok(self.bars.keys().cloned().collect())
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, TwinError> {
        Ok(self
            .bars
            .get(symbol)
            .and_then(|bars| Some((bars.first()?.date, bars.last()?.date, bars.len()))))
    }
}

pub fn make_bars(symbol: &str, prices: &[f64]) -> Vec<Bar> {
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

/// Monotonic rise of 1.0 per bar.
pub fn uptrend(n: usize) -> Vec<f64> {
    (0..n).map(|i| 100.0 + i as f64).collect()
}

/// Gentle rise with alternation: RSI stays moderate and the narrow closes
/// inside a wide daily range keep the Bollinger bands inside Keltner.
pub fn zigzag_uptrend(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let alt = if i % 2 == 1 { 0.25 } else { -0.25 };
            100.0 + 0.1 * i as f64 + alt
        })
        .collect()
}

/// Write one `SYMBOL.csv` per entry into `dir`.
pub fn write_csv_dir(dir: &std::path::Path, data: &[(&str, &[f64])]) {
    for (symbol, prices) in data {
        let mut content = String::from("date,open,high,low,close,volume\n");
        for bar in make_bars(symbol, prices) {
            content.push_str(&format!(
                "{},{},{},{},{},{}\n",
                bar.date, bar.open, bar.high, bar.low, bar.close, bar.volume
            ));
        }
        std::fs::write(dir.join(format!("{symbol}.csv")), content).unwrap();
    }
}
