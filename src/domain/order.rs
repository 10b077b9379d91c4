//! Order instructions exchanged between strategies, routers and execution.

use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Signed order: positive buys, negative sells.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub code: String,
    pub quantity: f64,
}

impl Order {
    pub fn new(code: impl Into<String>, quantity: f64) -> Self {
        Order {
            code: code.into(),
            quantity,
        }
    }

    pub fn is_buy(&self) -> bool {
        self.quantity > 0.0
    }

    pub fn is_sell(&self) -> bool {
        self.quantity < 0.0
    }
}

/// Instrument code to signed quantity.
pub type OrderBook = BTreeMap<String, f64>;

/// Instrument code to signal value (the observed price for buy-and-hold).
pub type Signals = BTreeMap<String, f64>;

/// A pending user instruction surfaced by an order router.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub date: NaiveDate,
    pub command: String,
    pub asset: Option<String>,
    pub amount: Option<f64>,
}

impl Instruction {
    /// An `order` command carrying an amount.
    pub fn is_order(&self) -> bool {
        self.command == "order" && self.amount.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instruction(command: &str, amount: Option<f64>) -> Instruction {
        Instruction {
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            command: command.into(),
            asset: Some("BHP".into()),
            amount,
        }
    }

    #[test]
    fn order_direction() {
        assert!(Order::new("BHP", 25.0).is_buy());
        assert!(Order::new("BHP", -30.0).is_sell());
        let flat = Order::new("BHP", 0.0);
        assert!(!flat.is_buy());
        assert!(!flat.is_sell());
    }

    #[test]
    fn order_instruction_requires_amount() {
        assert!(instruction("order", Some(100.0)).is_order());
        assert!(!instruction("order", None).is_order());
        assert!(!instruction("rebalance", Some(100.0)).is_order());
    }
}
