//! Data access port trait.
//!
//! Implementations must return bars deduplicated by (symbol, date) and
//! sorted ascending by date. An empty result is not an error — the engine
//! layers absorb it as "no data".

use crate::domain::error::TwinError;
use crate::domain::ohlcv::Bar;
use chrono::NaiveDate;

pub trait DataPort {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<Bar>, TwinError>;

    /// The symbol catalogue used by the decision engine's token filter.
    fn list_symbols(&self) -> Result<Vec<String>, TwinError>;

    fn get_data_range(&self, symbol: &str)
        -> Result<Option<(NaiveDate, NaiveDate, usize)>, TwinError>;
}
