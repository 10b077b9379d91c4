//! Order routing port: turns signals into orders and owns portfolio persistence.

use chrono::NaiveDate;

use crate::domain::error::TrendtraderError;
use crate::domain::order::{Instruction, OrderBook, Signals};
use crate::domain::portfolio::Portfolio;

pub trait OrderRouter {
    /// Observe the current portfolio. May persist it when `save` is set and
    /// may hand back one pending user instruction.
    fn update(
        &mut self,
        portfolio: &Portfolio,
        date: NaiveDate,
        save: bool,
    ) -> Result<Option<Instruction>, TrendtraderError>;

    /// Translate signals (code to observed price) into signed quantities.
    fn trade_signals_handler(&mut self, signals: &Signals) -> OrderBook;

    fn save_portfolio(&mut self, portfolio: &Portfolio) -> Result<(), TrendtraderError>;
}
