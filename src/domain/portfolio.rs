//! Portfolio state and equity tracking.

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};

use super::position::Holding;

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub cash: f64,
    pub initial_capital: f64,
    pub holdings: BTreeMap<String, Holding>,
    pub realized_pnl: f64,
    pub commissions_paid: f64,
    pub equity_curve: Vec<EquityPoint>,
}

impl Portfolio {
    pub fn new(initial_capital: f64) -> Self {
        Portfolio {
            cash: initial_capital,
            initial_capital,
            holdings: BTreeMap::new(),
            realized_pnl: 0.0,
            commissions_paid: 0.0,
            equity_curve: Vec::new(),
        }
    }

    pub fn get_holding(&self, code: &str) -> Option<&Holding> {
        self.holdings.get(code)
    }

    /// Signed share count held in `code`, zero when flat.
    pub fn quantity_of(&self, code: &str) -> i64 {
        self.holdings.get(code).map_or(0, |h| h.quantity)
    }

    pub fn holding_count(&self) -> usize {
        self.holdings.len()
    }

    /// Settle a signed fill: cash moves by the notional plus commission,
    /// the holding is updated and dropped once flat.
    pub fn apply_fill(&mut self, code: &str, quantity: i64, price: f64, commission: f64) -> f64 {
        self.cash -= quantity as f64 * price + commission;
        self.commissions_paid += commission;

        let holding = self
            .holdings
            .entry(code.to_string())
            .or_insert_with(|| Holding {
                code: code.to_string(),
                quantity: 0,
                average_price: 0.0,
            });
        let realized = holding.apply_fill(quantity, price);
        if holding.quantity == 0 {
            self.holdings.remove(code);
        }

        self.realized_pnl += realized;
        realized
    }

    pub fn record_equity(&mut self, date: NaiveDate, equity: f64) {
        self.equity_curve.push(EquityPoint { date, equity });
    }

    /// Cash plus signed market value. Holdings without a price are valued
    /// at their average entry price.
    pub fn total_equity(&self, price_map: &HashMap<String, f64>) -> f64 {
        let holdings_value: f64 = self
            .holdings
            .values()
            .map(|h| {
                let price = price_map.get(&h.code).copied().unwrap_or(h.average_price);
                h.market_value(price)
            })
            .sum();
        self.cash + holdings_value
    }
}
