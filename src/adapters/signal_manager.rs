//! Signal manager: the [`OrderRouter`] used by live configurations.
//!
//! Splits a fraction of available cash equally across incoming signals,
//! hands out dated user instructions, and persists portfolio snapshots as
//! CSV.

use chrono::NaiveDate;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::domain::error::TrendtraderError;
use crate::domain::order::{Instruction, OrderBook, Signals};
use crate::domain::portfolio::Portfolio;
use crate::ports::config_port::ConfigPort;
use crate::ports::order_router::OrderRouter;

#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotRow {
    pub kind: String,
    pub code: String,
    pub quantity: i64,
    pub value: f64,
}

/// Portfolio as last saved: one `cash` row then one `holding` row per code.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PortfolioSnapshot {
    pub rows: Vec<SnapshotRow>,
}

impl PortfolioSnapshot {
    pub fn from_portfolio(portfolio: &Portfolio) -> Self {
        let mut rows = vec![SnapshotRow {
            kind: "cash".to_string(),
            code: String::new(),
            quantity: 0,
            value: portfolio.cash,
        }];
        rows.extend(portfolio.holdings.values().map(|h| SnapshotRow {
            kind: "holding".to_string(),
            code: h.code.clone(),
            quantity: h.quantity,
            value: h.quantity as f64 * h.average_price,
        }));
        PortfolioSnapshot { rows }
    }

    pub fn cash(&self) -> Option<f64> {
        self.rows.iter().find(|r| r.kind == "cash").map(|r| r.value)
    }

    pub fn quantity_of(&self, code: &str) -> i64 {
        self.rows
            .iter()
            .find(|r| r.kind == "holding" && r.code == code)
            .map_or(0, |r| r.quantity)
    }
}

#[derive(Debug, Clone)]
pub struct SignalManager {
    position_size: f64,
    instructions: VecDeque<Instruction>,
    portfolio_path: Option<PathBuf>,
    cash: f64,
    snapshot: Option<PortfolioSnapshot>,
}

impl SignalManager {
    pub fn new(position_size: f64) -> Self {
        SignalManager {
            position_size,
            instructions: VecDeque::new(),
            portfolio_path: None,
            cash: 0.0,
            snapshot: None,
        }
    }

    /// Queue instructions, oldest first.
    pub fn with_instructions(mut self, instructions: impl IntoIterator<Item = Instruction>) -> Self {
        let mut all: Vec<Instruction> = self.instructions.drain(..).chain(instructions).collect();
        all.sort_by_key(|i| i.date);
        self.instructions = all.into();
        self
    }

    pub fn with_portfolio_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.portfolio_path = Some(path.into());
        self
    }

    /// Build from the `[manager]` section. Relative paths resolve against
    /// `base_dir`.
    pub fn from_config(config: &dyn ConfigPort, base_dir: &Path) -> Result<Self, TrendtraderError> {
        let mut manager = SignalManager::new(config.get_double("manager", "position_size", 1.0));

        if let Some(path) = config.get_string("manager", "instructions") {
            let path = base_dir.join(path.trim());
            manager = manager.with_instructions(load_instructions(&path)?);
        }
        if let Some(path) = config.get_string("manager", "portfolio_path") {
            manager = manager.with_portfolio_path(base_dir.join(path.trim()));
        }
        Ok(manager)
    }

    pub fn position_size(&self) -> f64 {
        self.position_size
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn pending_instructions(&self) -> usize {
        self.instructions.len()
    }

    pub fn last_snapshot(&self) -> Option<&PortfolioSnapshot> {
        self.snapshot.as_ref()
    }
}

impl OrderRouter for SignalManager {
    fn update(
        &mut self,
        portfolio: &Portfolio,
        date: NaiveDate,
        save: bool,
    ) -> Result<Option<Instruction>, TrendtraderError> {
        self.cash = portfolio.cash;
        if save {
            self.save_portfolio(portfolio)?;
        }

        match self.instructions.front() {
            Some(next) if next.date <= date => Ok(self.instructions.pop_front()),
            _ => Ok(None),
        }
    }

    fn trade_signals_handler(&mut self, signals: &Signals) -> OrderBook {
        let mut book = OrderBook::new();
        if signals.is_empty() {
            return book;
        }

        let allocation = self.cash * self.position_size / signals.len() as f64;
        for (code, &price) in signals {
            if !(price.is_finite() && price > 0.0) {
                debug!(code = %code, price, "skipping signal without usable price");
                continue;
            }
            let quantity = (allocation / price).floor();
            if quantity >= 1.0 {
                book.insert(code.clone(), quantity);
            }
        }
        book
    }

    fn save_portfolio(&mut self, portfolio: &Portfolio) -> Result<(), TrendtraderError> {
        let snapshot = PortfolioSnapshot::from_portfolio(portfolio);
        if let Some(path) = &self.portfolio_path {
            write_snapshot(path, &snapshot)?;
            info!(path = %path.display(), holdings = portfolio.holding_count(), "portfolio saved");
        }
        self.snapshot = Some(snapshot);
        Ok(())
    }
}

fn persistence(what: &Path, reason: impl std::fmt::Display) -> TrendtraderError {
    TrendtraderError::Persistence {
        what: what.display().to_string(),
        reason: reason.to_string(),
    }
}

fn write_snapshot(path: &Path, snapshot: &PortfolioSnapshot) -> Result<(), TrendtraderError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| persistence(path, e))?;
    writer
        .write_record(["kind", "code", "quantity", "value"])
        .map_err(|e| persistence(path, e))?;
    for row in &snapshot.rows {
        writer
            .write_record([
                row.kind.as_str(),
                row.code.as_str(),
                &row.quantity.to_string(),
                &row.value.to_string(),
            ])
            .map_err(|e| persistence(path, e))?;
    }
    writer.flush()?;
    Ok(())
}

/// Load `date,command,asset,amount` rows. `asset` and `amount` may be blank.
pub fn load_instructions(path: &Path) -> Result<Vec<Instruction>, TrendtraderError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| TrendtraderError::Data {
            reason: format!("failed to read instructions {}: {}", path.display(), e),
        })?;

    let mut instructions = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| TrendtraderError::Data {
            reason: format!("{}: CSV parse error: {}", path.display(), e),
        })?;
        let line = record.position().map_or(0, |p| p.line());
        let invalid = |what: &str| TrendtraderError::Data {
            reason: format!("{} line {}: {}", path.display(), line, what),
        };

        let date = record
            .get(0)
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
            .ok_or_else(|| invalid("invalid date"))?;
        let command = record
            .get(1)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| invalid("missing command"))?
            .to_lowercase();
        let asset = record
            .get(2)
            .filter(|s| !s.is_empty())
            .map(str::to_uppercase);
        let amount = match record.get(3).filter(|s| !s.is_empty()) {
            Some(raw) => Some(raw.parse::<f64>().map_err(|_| invalid("invalid amount"))?),
            None => None,
        };

        instructions.push(Instruction {
            date,
            command,
            asset,
            amount,
        });
    }

    instructions.sort_by_key(|i| i.date);
    Ok(instructions)
}
