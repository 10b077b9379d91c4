//! Market snapshot delivered to strategies once per simulated step.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use super::code_data::CodeData;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quote {
    pub price: f64,
}

/// All quotes observed on one date, keyed by instrument code.
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub date: NaiveDate,
    pub quotes: BTreeMap<String, Quote>,
}

impl Tick {
    pub fn new(date: NaiveDate) -> Self {
        Tick {
            date,
            quotes: BTreeMap::new(),
        }
    }

    pub fn with_price(mut self, code: &str, price: f64) -> Self {
        self.quotes.insert(code.to_string(), Quote { price });
        self
    }

    pub fn price(&self, code: &str) -> Option<f64> {
        self.quotes.get(code).map(|q| q.price)
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.quotes.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }
}

/// Build one tick per timeline date from closing prices. Codes without a bar
/// on a date are absent from that tick.
pub fn build_ticks(codes: &[CodeData], timeline: &[NaiveDate]) -> Vec<Tick> {
    timeline
        .iter()
        .map(|&date| {
            let quotes = codes
                .iter()
                .filter_map(|cd| {
                    cd.get_bar(date)
                        .map(|bar| (cd.code.clone(), Quote { price: bar.close }))
                })
                .collect();
            Tick { date, quotes }
        })
        .collect()
}
