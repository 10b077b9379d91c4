//! Daily OHLCV bar as loaded from data files.

use chrono::NaiveDate;

#[derive(Debug, Clone)]
pub struct OhlcvBar {
    pub code: String,
    pub exchange: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl OhlcvBar {
    /// A bar is usable when every price is finite and positive and the
    /// high/low range contains open and close.
    pub fn is_consistent(&self) -> bool {
        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| !p.is_finite() || *p <= 0.0) {
            return false;
        }
        self.low <= self.high
            && (self.low..=self.high).contains(&self.open)
            && (self.low..=self.high).contains(&self.close)
    }
}
