//! Order execution and fill simulation.
//!
//! Orders fill at the bar price adjusted for slippage, pay a flat plus
//! percentage commission, and are sized in whole shares.

use super::order::Order;
use super::portfolio::Portfolio;

/// Configuration for backtest execution parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionConfig {
    pub commission_per_trade: f64,
    pub commission_pct: f64,
    pub slippage_pct: f64,
    pub allow_shorting: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        ExecutionConfig {
            commission_per_trade: 0.0,
            commission_pct: 0.0,
            slippage_pct: 0.0,
            allow_shorting: false,
        }
    }
}

/// Calculate commission: flat_fee + (trade_value * pct / 100).
pub fn calculate_commission(trade_value: f64, config: &ExecutionConfig) -> f64 {
    config.commission_per_trade + (trade_value * config.commission_pct / 100.0)
}

/// Buys pay up: market_price * (1 + slippage_pct / 100)
pub fn apply_slippage_buy(market_price: f64, slippage_pct: f64) -> f64 {
    market_price * (1.0 + slippage_pct / 100.0)
}

/// Sells give up: market_price * (1 - slippage_pct / 100)
pub fn apply_slippage_sell(market_price: f64, slippage_pct: f64) -> f64 {
    market_price * (1.0 - slippage_pct / 100.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    ZeroQuantity,
    NoPrice,
    NoHolding,
    InsufficientCapital,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RejectReason::ZeroQuantity => "zero quantity",
            RejectReason::NoPrice => "no price",
            RejectReason::NoHolding => "nothing to sell",
            RejectReason::InsufficientCapital => "insufficient capital",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FillResult {
    Filled {
        quantity: i64,
        execution_price: f64,
        commission: f64,
        realized_pnl: f64,
    },
    Rejected(RejectReason),
}

/// Fitted quantities within this distance of a whole share count as that share.
const QUANTITY_EPSILON: f64 = 1e-6;

/// Whole shares in a requested quantity, truncated toward zero after
/// absorbing float error from upstream arithmetic.
pub fn whole_shares(requested: f64) -> i64 {
    let nearest = requested.round();
    if (requested - nearest).abs() < QUANTITY_EPSILON {
        nearest as i64
    } else {
        requested.trunc() as i64
    }
}

/// Execute one order against the portfolio.
///
/// 1. Truncate the requested quantity toward zero
/// 2. Clamp sells to the current holding when shorting is disabled
/// 3. Apply slippage by direction
/// 4. Reject buys whose cost plus commission exceeds cash
/// 5. Settle cash and holding
pub fn execute_order(
    portfolio: &mut Portfolio,
    order: &Order,
    market_price: Option<f64>,
    config: &ExecutionConfig,
) -> FillResult {
    let mut quantity = whole_shares(order.quantity);
    if quantity == 0 {
        return FillResult::Rejected(RejectReason::ZeroQuantity);
    }

    let market_price = match market_price {
        Some(p) if p.is_finite() && p > 0.0 => p,
        _ => return FillResult::Rejected(RejectReason::NoPrice),
    };

    if quantity < 0 && !config.allow_shorting {
        let held = portfolio.quantity_of(&order.code).max(0);
        if held == 0 {
            return FillResult::Rejected(RejectReason::NoHolding);
        }
        quantity = quantity.max(-held);
    }

    let execution_price = if quantity > 0 {
        apply_slippage_buy(market_price, config.slippage_pct)
    } else {
        apply_slippage_sell(market_price, config.slippage_pct)
    };

    let value = quantity.unsigned_abs() as f64 * execution_price;
    let commission = calculate_commission(value, config);

    if quantity > 0 && value + commission > portfolio.cash {
        return FillResult::Rejected(RejectReason::InsufficientCapital);
    }

    let realized_pnl = portfolio.apply_fill(&order.code, quantity, execution_price, commission);

    FillResult::Filled {
        quantity,
        execution_price,
        commission,
        realized_pnl,
    }
}
