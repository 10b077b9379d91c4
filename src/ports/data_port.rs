//! Data access port trait.

use crate::domain::error::TrendtraderError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

pub trait DataPort {
    fn fetch_ohlcv(
        &self,
        code: &str,
        exchange: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, TrendtraderError>;

    fn list_symbols(&self, exchange: &str) -> Result<Vec<String>, TrendtraderError>;
}
