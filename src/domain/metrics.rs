//! Performance summary of a finished backtest.

use super::backtest::BacktestResult;
use super::execution::FillResult;
use super::portfolio::EquityPoint;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub final_equity: f64,
    pub total_return: f64,
    pub annualized_return: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub max_drawdown: f64,
    pub max_drawdown_duration: i64,
    pub orders_filled: usize,
    pub orders_rejected: usize,
    pub shares_bought: i64,
    pub shares_sold: i64,
    pub realized_pnl: f64,
    /// Open holdings marked at their last price, or entry price if none was seen.
    pub unrealized_pnl: f64,
    pub commissions_paid: f64,
}

impl Metrics {
    pub fn compute(result: &BacktestResult, risk_free_rate: f64) -> Self {
        let portfolio = &result.portfolio;
        let equity_curve = &portfolio.equity_curve;
        let initial_capital = portfolio.initial_capital;

        let final_equity = equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(initial_capital);

        let total_return = if initial_capital > 0.0 {
            (final_equity - initial_capital) / initial_capital
        } else {
            0.0
        };

        let years = equity_curve.len() as f64 / TRADING_DAYS_PER_YEAR;
        let annualized_return = if years > 0.0 && total_return.is_finite() && total_return > -1.0 {
            (1.0 + total_return).powf(1.0 / years) - 1.0
        } else {
            0.0
        };

        let (max_drawdown, max_drawdown_duration) = compute_drawdown(equity_curve);
        let daily_rf = risk_free_rate / TRADING_DAYS_PER_YEAR;
        let (sharpe_ratio, sortino_ratio) = compute_risk_adjusted(equity_curve, daily_rf);

        let mut shares_bought = 0i64;
        let mut shares_sold = 0i64;
        for event in &result.fills {
            if let FillResult::Filled { quantity, .. } = event.result {
                if quantity > 0 {
                    shares_bought += quantity;
                } else {
                    shares_sold += -quantity;
                }
            }
        }

        let unrealized_pnl: f64 = portfolio
            .holdings
            .values()
            .map(|h| {
                let price = result
                    .last_prices
                    .get(&h.code)
                    .copied()
                    .unwrap_or(h.average_price);
                h.unrealized_pnl(price)
            })
            .sum();

        Metrics {
            final_equity,
            total_return,
            annualized_return,
            sharpe_ratio,
            sortino_ratio,
            max_drawdown,
            max_drawdown_duration,
            orders_filled: result.filled_count(),
            orders_rejected: result.rejected_count(),
            shares_bought,
            shares_sold,
            realized_pnl: portfolio.realized_pnl,
            unrealized_pnl,
            commissions_paid: portfolio.commissions_paid,
        }
    }
}

/// Largest peak-to-trough fraction and the longest run of points spent
/// below a prior peak.
fn compute_drawdown(equity_curve: &[EquityPoint]) -> (f64, i64) {
    let Some(first) = equity_curve.first() else {
        return (0.0, 0);
    };

    let mut peak = first.equity;
    let mut max_dd = 0.0_f64;
    let mut max_duration = 0i64;
    let mut duration = 0i64;

    for point in equity_curve {
        if point.equity > peak {
            peak = point.equity;
            duration = 0;
        } else if peak > 0.0 {
            max_dd = max_dd.max((peak - point.equity) / peak);
            if point.equity < peak {
                duration += 1;
                max_duration = max_duration.max(duration);
            }
        }
    }

    (max_dd, max_duration)
}

/// Annualised Sharpe and Sortino ratios of per-point returns.
fn compute_risk_adjusted(equity_curve: &[EquityPoint], daily_rf: f64) -> (f64, f64) {
    if equity_curve.len() < 2 {
        return (0.0, 0.0);
    }

    let returns: Vec<f64> = equity_curve
        .windows(2)
        .map(|w| {
            let prev = w[0].equity;
            if prev > 0.0 {
                (w[1].equity - prev) / prev
            } else {
                0.0
            }
        })
        .collect();

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let stddev = (returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n).sqrt();
    let excess = mean - daily_rf;
    let annualizer = TRADING_DAYS_PER_YEAR.sqrt();

    let sharpe = if stddev > 0.0 {
        excess / stddev * annualizer
    } else {
        0.0
    };

    let downside = returns
        .iter()
        .filter(|&&r| r < daily_rf)
        .map(|&r| (r - daily_rf).powi(2))
        .sum::<f64>();
    let downside_stddev = (downside / n).sqrt();

    let sortino = if downside_stddev > 0.0 {
        excess / downside_stddev * annualizer
    } else {
        0.0
    };

    (sharpe, sortino)
}
