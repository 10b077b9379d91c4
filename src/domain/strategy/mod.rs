//! Strategy plugin contract.
//!
//! A strategy is driven by the backtest loop: [`Strategy::initialize`] once,
//! [`Strategy::handle_data`] once per tick, [`Strategy::stop_trading`] once at
//! the end. Orders and recorded values go through the per-tick
//! [`AlgoContext`]; the loop executes them after `handle_data` returns.

pub mod buy_and_hold;
pub mod follow_trend;

pub use buy_and_hold::BuyAndHold;
pub use follow_trend::FollowTrend;

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::domain::error::TrendtraderError;
use crate::domain::order::Order;
use crate::domain::portfolio::Portfolio;
use crate::domain::record::{Record, RecordValue};
use crate::domain::tick::Tick;
use crate::ports::config_port::ConfigPort;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgoState {
    Idle,
    Running,
    Stopped,
}

impl fmt::Display for AlgoState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlgoState::Idle => write!(f, "idle"),
            AlgoState::Running => write!(f, "running"),
            AlgoState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Guarded `Idle -> Running -> Stopped` transitions.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    name: &'static str,
    state: AlgoState,
}

impl Lifecycle {
    pub fn new(name: &'static str) -> Self {
        Lifecycle {
            name,
            state: AlgoState::Idle,
        }
    }

    pub fn state(&self) -> AlgoState {
        self.state
    }

    /// Move `Idle -> Running`. Returns true only on that transition.
    pub fn start(&mut self) -> bool {
        if self.state == AlgoState::Idle {
            self.state = AlgoState::Running;
            true
        } else {
            false
        }
    }

    pub fn ensure_active(&self) -> Result<(), TrendtraderError> {
        if self.state == AlgoState::Stopped {
            return Err(TrendtraderError::AlreadyStopped {
                name: self.name.to_string(),
            });
        }
        Ok(())
    }

    pub fn stop(&mut self) -> Result<(), TrendtraderError> {
        self.ensure_active()?;
        self.state = AlgoState::Stopped;
        Ok(())
    }
}

/// Parameters handed to [`Strategy::initialize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrategyProperties {
    pub refresh_period: usize,
    pub window_length: usize,
}

impl Default for StrategyProperties {
    fn default() -> Self {
        StrategyProperties {
            refresh_period: 1,
            window_length: 50,
        }
    }
}

impl StrategyProperties {
    pub fn from_config(config: &dyn ConfigPort) -> Self {
        let defaults = Self::default();
        StrategyProperties {
            refresh_period: config.get_usize("strategy", "refresh_period", defaults.refresh_period),
            window_length: config.get_usize("strategy", "window_length", defaults.window_length),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    BuyAndHold,
    FollowTrend,
}

impl FromStr for StrategyKind {
    type Err = TrendtraderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "buyandhold" => Ok(StrategyKind::BuyAndHold),
            "followtrend" => Ok(StrategyKind::FollowTrend),
            _ => Err(TrendtraderError::UnknownStrategy {
                name: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::BuyAndHold => write!(f, "buy_and_hold"),
            StrategyKind::FollowTrend => write!(f, "follow_trend"),
        }
    }
}

/// What a strategy sees and emits during one tick.
#[derive(Debug)]
pub struct AlgoContext<'a> {
    date: NaiveDate,
    portfolio: &'a Portfolio,
    orders: Vec<Order>,
    values: BTreeMap<String, RecordValue>,
}

impl<'a> AlgoContext<'a> {
    pub fn new(date: NaiveDate, portfolio: &'a Portfolio) -> Self {
        AlgoContext {
            date,
            portfolio,
            orders: Vec::new(),
            values: BTreeMap::new(),
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn portfolio(&self) -> &'a Portfolio {
        self.portfolio
    }

    /// Submit a signed order. At most one order per instrument per tick; a
    /// second one is dropped and `false` returned.
    pub fn order(&mut self, code: &str, quantity: f64) -> bool {
        if self.orders.iter().any(|o| o.code == code) {
            warn!(code, date = %self.date, "order already submitted this tick, ignoring");
            return false;
        }
        self.orders.push(Order::new(code, quantity));
        true
    }

    pub fn record(&mut self, name: &str, value: impl Into<RecordValue>) {
        self.values.insert(name.to_string(), value.into());
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn recorded(&self, name: &str) -> Option<RecordValue> {
        self.values.get(name).copied()
    }

    pub fn into_parts(self) -> (Vec<Order>, Option<Record>) {
        let record = if self.values.is_empty() {
            None
        } else {
            Some(Record {
                date: self.date,
                values: self.values,
            })
        };
        (self.orders, record)
    }
}

pub trait Strategy {
    fn name(&self) -> &str;

    fn initialize(&mut self, properties: &StrategyProperties) -> Result<(), TrendtraderError>;

    fn handle_data(
        &mut self,
        tick: &Tick,
        ctx: &mut AlgoContext<'_>,
    ) -> Result<(), TrendtraderError>;

    /// One-shot terminal transition. Fails if already stopped.
    fn stop_trading(&mut self, portfolio: &Portfolio) -> Result<(), TrendtraderError>;

    fn state(&self) -> AlgoState;
}
