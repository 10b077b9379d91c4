//! Backtest engine and event loop.
//!
//! Drives one strategy through a sequence of ticks: initialize, one
//! `handle_data` per tick with submitted orders filled at that tick's
//! price, then `stop_trading` once the data runs out.

use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use super::error::TrendtraderError;
use super::execution::{execute_order, ExecutionConfig, FillResult};
use super::order::Order;
use super::portfolio::Portfolio;
use super::record::Record;
use super::strategy::{AlgoContext, AlgoState, Strategy, StrategyProperties};
use super::tick::Tick;

#[derive(Debug, Clone)]
pub struct BacktestConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: f64,
    pub commission_per_trade: f64,
    pub commission_pct: f64,
    pub slippage_pct: f64,
    pub allow_shorting: bool,
    pub risk_free_rate: f64,
}

impl BacktestConfig {
    pub fn execution_config(&self) -> ExecutionConfig {
        ExecutionConfig {
            commission_per_trade: self.commission_per_trade,
            commission_pct: self.commission_pct,
            slippage_pct: self.slippage_pct,
            allow_shorting: self.allow_shorting,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }
}

/// An order as submitted and what execution made of it.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderEvent {
    pub date: NaiveDate,
    pub order: Order,
    pub result: FillResult,
}

impl OrderEvent {
    pub fn is_filled(&self) -> bool {
        matches!(self.result, FillResult::Filled { .. })
    }
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub strategy: String,
    pub portfolio: Portfolio,
    pub fills: Vec<OrderEvent>,
    pub records: Vec<Record>,
    pub ticks_processed: usize,
    pub final_state: AlgoState,
    /// Last known price per code at the end of the run.
    pub last_prices: HashMap<String, f64>,
}

impl BacktestResult {
    pub fn filled_count(&self) -> usize {
        self.fills.iter().filter(|e| e.is_filled()).count()
    }

    pub fn rejected_count(&self) -> usize {
        self.fills.len() - self.filled_count()
    }
}

pub fn run_backtest(
    ticks: &[Tick],
    strategy: &mut dyn Strategy,
    properties: &StrategyProperties,
    config: &BacktestConfig,
) -> Result<BacktestResult, TrendtraderError> {
    let exec_config = config.execution_config();
    let mut portfolio = Portfolio::new(config.initial_capital);
    let mut last_prices: HashMap<String, f64> = HashMap::new();
    let mut fills = Vec::new();
    let mut records = Vec::new();
    let mut ticks_processed = 0usize;

    strategy.initialize(properties)?;
    info!(
        strategy = strategy.name(),
        start = %config.start_date,
        end = %config.end_date,
        "backtest starting"
    );

    for tick in ticks.iter().filter(|t| config.contains(t.date)) {
        if strategy.state() == AlgoState::Stopped {
            debug!(date = %tick.date, "strategy stopped, ending data feed");
            break;
        }

        let mut ctx = AlgoContext::new(tick.date, &portfolio);
        strategy.handle_data(tick, &mut ctx)?;
        let (orders, record) = ctx.into_parts();

        for (code, quote) in &tick.quotes {
            last_prices.insert(code.clone(), quote.price);
        }

        for order in orders {
            let result = execute_order(&mut portfolio, &order, tick.price(&order.code), &exec_config);
            match &result {
                FillResult::Filled {
                    quantity,
                    execution_price,
                    ..
                } => debug!(
                    date = %tick.date,
                    code = %order.code,
                    quantity,
                    price = execution_price,
                    "order filled"
                ),
                FillResult::Rejected(reason) => warn!(
                    date = %tick.date,
                    code = %order.code,
                    requested = order.quantity,
                    %reason,
                    "order rejected"
                ),
            }
            fills.push(OrderEvent {
                date: tick.date,
                order,
                result,
            });
        }

        let equity = portfolio.total_equity(&last_prices);
        portfolio.record_equity(tick.date, equity);

        if let Some(record) = record {
            records.push(record);
        }
        ticks_processed += 1;
    }

    if strategy.state() != AlgoState::Stopped {
        strategy.stop_trading(&portfolio)?;
    }

    info!(
        strategy = strategy.name(),
        ticks = ticks_processed,
        orders = fills.len(),
        "backtest finished"
    );

    Ok(BacktestResult {
        strategy: strategy.name().to_string(),
        portfolio,
        fills,
        records,
        ticks_processed,
        final_state: strategy.state(),
        last_prices,
    })
}
