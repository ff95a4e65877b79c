//! SQLite data adapter. The `ohlcv` table is keyed (symbol, date) and
//! ingestion uses INSERT OR REPLACE, so re-ingesting a date is last-write-wins.

use crate::domain::error::TwinError;
use crate::domain::ohlcv::Bar;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use std::path::Path;

pub struct SqliteAdapter {
    conn: Connection,
}

fn db_err(e: rusqlite::Error) -> TwinError {
    TwinError::DataSource {
        reason: e.to_string(),
    }
}

impl SqliteAdapter {
    pub fn open(path: &Path) -> Result<Self, TwinError> {
        let conn = Connection::open(path).map_err(db_err)?;
        Ok(Self { conn })
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TwinError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| TwinError::ConfigInvalid {
                    reason: "missing [sqlite] path".into(),
                })?;
        Self::open(Path::new(&db_path))
    }

    pub fn in_memory() -> Result<Self, TwinError> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        Ok(Self { conn })
    }

    pub fn initialize_schema(&self) -> Result<(), TwinError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS ohlcv (
                    symbol TEXT NOT NULL,
                    date TEXT NOT NULL,
                    open REAL NOT NULL,
                    high REAL NOT NULL,
                    low REAL NOT NULL,
                    close REAL NOT NULL,
                    volume INTEGER NOT NULL,
                    PRIMARY KEY (symbol, date)
                );
                CREATE INDEX IF NOT EXISTS idx_ohlcv_symbol ON ohlcv(symbol);
                CREATE INDEX IF NOT EXISTS idx_ohlcv_date ON ohlcv(date);",
            )
            .map_err(db_err)?;
        Ok(())
    }

    pub fn insert_bars(&mut self, bars: &[Bar]) -> Result<(), TwinError> {
        let tx = self.conn.transaction().map_err(db_err)?;
        for bar in bars {
            tx.execute(
                "INSERT OR REPLACE INTO ohlcv (symbol, date, open, high, low, close, volume)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    bar.symbol,
                    bar.date.format("%Y-%m-%d").to_string(),
                    bar.open,
                    bar.high,
                    bar.low,
                    bar.close,
                    bar.volume
                ],
            )
            .map_err(db_err)?;
        }
        tx.commit().map_err(db_err)?;
        Ok(())
    }
}

fn parse_date(date_str: &str) -> Result<NaiveDate, rusqlite::Error> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            date_str.len(),
            rusqlite::types::Type::Text,
            Box::new(e),
        )
    })
}

impl DataPort for SqliteAdapter {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<Bar>, TwinError> {
        // Lexicographic comparison on ISO dates matches chronological order.
        let start_str = start
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "0000-00-00".to_string());
        let end_str = end
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "9999-99-99".to_string());

        let mut stmt = self
            .conn
            .prepare(
                "SELECT symbol, date, open, high, low, close, volume
                 FROM ohlcv
                 WHERE symbol = ?1 AND date >= ?2 AND date <= ?3
                 ORDER BY date ASC",
            )
            .map_err(db_err)?;

        let rows = stmt
            .query_map(params![symbol, start_str, end_str], |row| {
                let date_str: String = row.get(1)?;
                Ok(Bar {
                    symbol: row.get(0)?,
                    date: parse_date(&date_str)?,
                    open: row.get(2)?,
                    high: row.get(3)?,
                    low: row.get(4)?,
                    close: row.get(5)?,
                    volume: row.get(6)?,
                })
            })
            .map_err(db_err)?;

        let mut bars = Vec::new();
        for row in rows {
            bars.push(row.map_err(db_err)?);
        }
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, TwinError> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT symbol FROM ohlcv ORDER BY symbol")
            .map_err(db_err)?;

        let rows = stmt.query_map([], |row| row.get(0)).map_err(db_err)?;
        let mut symbols = Vec::new();
        for row in rows {
            symbols.push(row.map_err(db_err)?);
        }
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, TwinError> {
        let result: (Option<String>, Option<String>, i64) = self
            .conn
            .query_row(
                "SELECT MIN(date), MAX(date), COUNT(*) FROM ohlcv WHERE symbol = ?1",
                params![symbol],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .map_err(db_err)?;

        match result {
            (Some(min_str), Some(max_str), count) if count > 0 => {
                let min = parse_date(&min_str).map_err(db_err)?;
                let max = parse_date(&max_str).map_err(db_err)?;
                Ok(Some((min, max, count as usize)))
            }
            _ => Ok(None),
        }
    }
}
