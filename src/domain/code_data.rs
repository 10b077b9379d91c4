//! Per-code price history and the unified date timeline.

use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};
use tracing::warn;

#[derive(Debug, Clone)]
pub struct CodeData {
    pub code: String,
    pub exchange: String,
    pub ohlcv: Vec<OhlcvBar>,
    pub date_index: HashMap<NaiveDate, usize>,
}

impl CodeData {
    /// Inconsistent bars (non-positive prices, close outside high/low) are
    /// dropped so they never reach a strategy.
    pub fn new(code: String, exchange: String, ohlcv: Vec<OhlcvBar>) -> Self {
        let before = ohlcv.len();
        let mut ohlcv: Vec<OhlcvBar> = ohlcv.into_iter().filter(|b| b.is_consistent()).collect();
        if ohlcv.len() < before {
            warn!(
                code = %code,
                dropped = before - ohlcv.len(),
                "dropping inconsistent bars"
            );
        }
        ohlcv.sort_by_key(|b| b.date);

        let date_index = ohlcv
            .iter()
            .enumerate()
            .map(|(i, bar)| (bar.date, i))
            .collect();
        Self {
            code,
            exchange,
            ohlcv,
            date_index,
        }
    }

    pub fn bar_count(&self) -> usize {
        self.ohlcv.len()
    }

    pub fn get_bar(&self, date: NaiveDate) -> Option<&OhlcvBar> {
        self.date_index.get(&date).map(|&i| &self.ohlcv[i])
    }

    pub fn closes(&self) -> Vec<f64> {
        self.ohlcv.iter().map(|b| b.close).collect()
    }
}

pub fn build_unified_timeline(codes: &[CodeData]) -> Vec<NaiveDate> {
    let unique_dates: BTreeSet<NaiveDate> = codes
        .iter()
        .flat_map(|cd| cd.ohlcv.iter().map(|bar| bar.date))
        .collect();
    unique_dates.into_iter().collect()
}
