//! End-to-end backtests through the real engine.
//!
//! Tests cover:
//! - FollowTrend with the OLS estimator on rising, falling and flat series
//! - Refresh cadence: orders only on refresh ticks
//! - BuyAndHold with the signal manager: one allocation, snapshot on stop
//! - Pipeline from a data port, including partial universe validation

mod common;

use approx::assert_abs_diff_eq;
use common::*;
use trendtrader::adapters::signal_manager::SignalManager;
use trendtrader::cli::run_backtest_pipeline;
use trendtrader::domain::backtest::{run_backtest, BacktestConfig};
use trendtrader::domain::error::TrendtraderError;
use trendtrader::domain::execution::{FillResult, RejectReason};
use trendtrader::domain::metrics::Metrics;
use trendtrader::domain::order::Instruction;
use trendtrader::domain::record::RecordValue;
use trendtrader::domain::strategy::{
    AlgoState, BuyAndHold, FollowTrend, Strategy, StrategyProperties,
};

fn props(window_length: usize, refresh_period: usize) -> StrategyProperties {
    StrategyProperties {
        refresh_period,
        window_length,
    }
}

fn filled_quantities(result: &trendtrader::domain::backtest::BacktestResult) -> Vec<i64> {
    result
        .fills
        .iter()
        .filter_map(|e| match e.result {
            FillResult::Filled { quantity, .. } => Some(quantity),
            FillResult::Rejected(_) => None,
        })
        .collect()
}

mod follow_trend {
    use super::*;

    #[test]
    fn rising_series_buys_from_first_full_window() {
        let start = date(2024, 1, 1);
        let cd = make_code_data("BHP", generate_bars("BHP", start, &linear_closes(123.7, 0.5, 60)));
        let ticks = ticks_for(&[cd]);
        let mut strategy = FollowTrend::new();

        let result = run_backtest(&ticks, &mut strategy, &props(50, 1), &sample_config()).unwrap();

        assert_eq!(result.ticks_processed, 60);
        assert_eq!(result.fills.len(), 11);
        assert_eq!(result.fills[0].date, start + chrono::Duration::days(49));
        assert!(filled_quantities(&result).iter().all(|&q| q == 25));
        assert_eq!(result.portfolio.quantity_of("BHP"), 25 * 11);

        let before = &result.records[48];
        assert_eq!(before.get("buy"), Some(RecordValue::Bool(false)));
        let first = &result.records[49];
        assert_eq!(first.get("buy"), Some(RecordValue::Bool(true)));
        assert_eq!(first.get("sell"), Some(RecordValue::Bool(false)));
        assert_abs_diff_eq!(first.get("slope").unwrap().as_f64().unwrap(), 0.5, epsilon = 1e-9);

        assert_abs_diff_eq!(strategy.fit("BHP").unwrap().slope, 0.5, epsilon = 1e-9);
        assert_eq!(strategy.state(), AlgoState::Stopped);
    }

    #[test]
    fn falling_series_without_holdings_is_rejected() {
        let cd = make_code_data(
            "BHP",
            generate_bars("BHP", date(2024, 1, 1), &linear_closes(100.3, -0.6, 12)),
        );
        let ticks = ticks_for(&[cd]);
        let mut strategy = FollowTrend::new();

        let result = run_backtest(&ticks, &mut strategy, &props(10, 1), &sample_config()).unwrap();

        assert_eq!(result.fills.len(), 3);
        assert_eq!(result.filled_count(), 0);
        assert!(result
            .fills
            .iter()
            .all(|e| e.result == FillResult::Rejected(RejectReason::NoHolding)));
        assert_eq!(result.records[11].get("sell"), Some(RecordValue::Bool(true)));
    }

    #[test]
    fn falling_series_shorts_when_allowed() {
        let cd = make_code_data(
            "BHP",
            generate_bars("BHP", date(2024, 1, 1), &linear_closes(100.3, -0.6, 10)),
        );
        let ticks = ticks_for(&[cd]);
        let config = BacktestConfig {
            allow_shorting: true,
            ..sample_config()
        };
        let mut strategy = FollowTrend::new();

        let result = run_backtest(&ticks, &mut strategy, &props(10, 1), &config).unwrap();

        assert_eq!(filled_quantities(&result), vec![-30]);
        assert_eq!(result.portfolio.quantity_of("BHP"), -30);
    }

    #[test]
    fn flat_series_never_trades() {
        let cd = make_code_data("BHP", generate_bars("BHP", date(2024, 1, 1), &[50.0; 30]));
        let ticks = ticks_for(&[cd]);
        let mut strategy = FollowTrend::new();

        let result = run_backtest(&ticks, &mut strategy, &props(10, 1), &sample_config()).unwrap();

        assert!(result.fills.is_empty());
        assert_eq!(result.records.len(), 30);
        assert!(result
            .records
            .iter()
            .all(|r| r.get("buy") == Some(RecordValue::Bool(false))
                && r.get("sell") == Some(RecordValue::Bool(false))));
        assert_abs_diff_eq!(result.portfolio.cash, 100_000.0, epsilon = 1e-9);
    }

    #[test]
    fn orders_only_on_refresh_ticks() {
        let start = date(2024, 1, 1);
        let cd = make_code_data("BHP", generate_bars("BHP", start, &linear_closes(100.1, 0.5, 30)));
        let ticks = ticks_for(&[cd]);
        let mut strategy = FollowTrend::new();

        let result = run_backtest(&ticks, &mut strategy, &props(10, 5), &sample_config()).unwrap();

        let days: Vec<i64> = result
            .fills
            .iter()
            .map(|e| (e.date - start).num_days())
            .collect();
        assert_eq!(days, vec![9, 14, 19, 24, 29]);
    }

    #[test]
    fn instruments_are_judged_independently() {
        let start = date(2024, 1, 1);
        let up = make_code_data("AAA", generate_bars("AAA", start, &linear_closes(50.2, 0.5, 10)));
        let down = make_code_data("BBB", generate_bars("BBB", start, &linear_closes(80.4, -0.6, 10)));
        let flat = make_code_data("CCC", generate_bars("CCC", start, &[20.0; 10]));
        let ticks = ticks_for(&[up, down, flat]);
        let config = BacktestConfig {
            allow_shorting: true,
            ..sample_config()
        };
        let mut strategy = FollowTrend::new();

        let result = run_backtest(&ticks, &mut strategy, &props(10, 1), &config).unwrap();

        assert_eq!(result.portfolio.quantity_of("AAA"), 25);
        assert_eq!(result.portfolio.quantity_of("BBB"), -30);
        assert_eq!(result.portfolio.quantity_of("CCC"), 0);
        let last = result.records.last().unwrap();
        assert_eq!(last.get("buy"), Some(RecordValue::Bool(true)));
        assert_eq!(last.get("sell"), Some(RecordValue::Bool(true)));
        assert!(last.get("CCC.slope").is_some());
    }

    #[test]
    fn invalid_window_fails_initialization() {
        let mut strategy = FollowTrend::new();
        let err = run_backtest(&[], &mut strategy, &props(1, 1), &sample_config()).unwrap_err();
        assert!(matches!(err, TrendtraderError::ConfigInvalid { key, .. } if key == "window_length"));
    }
}

mod buy_and_hold {
    use super::*;

    #[test]
    fn splits_cash_once_and_saves_on_stop() {
        let start = date(2024, 1, 1);
        let a = make_code_data("AAA", generate_bars("AAA", start, &[10.0, 11.0, 12.0]));
        let b = make_code_data("BBB", generate_bars("BBB", start, &[20.0, 19.0, 18.0]));
        let ticks = ticks_for(&[a, b]);
        let config = BacktestConfig {
            initial_capital: 10_000.0,
            ..sample_config()
        };
        let mut strategy = BuyAndHold::new(SignalManager::new(1.0));

        let result =
            run_backtest(&ticks, &mut strategy, &StrategyProperties::default(), &config).unwrap();

        assert_eq!(result.fills.len(), 2);
        assert_eq!(result.portfolio.quantity_of("AAA"), 500);
        assert_eq!(result.portfolio.quantity_of("BBB"), 250);
        assert_abs_diff_eq!(result.portfolio.cash, 0.0, epsilon = 1e-6);

        let snapshot = strategy.router().last_snapshot().unwrap();
        assert_eq!(snapshot.quantity_of("AAA"), 500);
        assert_eq!(snapshot.quantity_of("BBB"), 250);
        assert_eq!(strategy.state(), AlgoState::Stopped);

        // 500 * 12 + 250 * 18
        let metrics = Metrics::compute(&result, config.risk_free_rate);
        assert_abs_diff_eq!(metrics.final_equity, 10_500.0, epsilon = 1e-6);
        assert_eq!(metrics.shares_bought, 750);
    }

    #[test]
    fn instructions_are_consumed_without_extra_orders() {
        let start = date(2024, 1, 1);
        let cd = make_code_data("AAA", generate_bars("AAA", start, &[10.0, 11.0, 12.0]));
        let ticks = ticks_for(&[cd]);
        let router = PassThroughRouter {
            pending: vec![Instruction {
                date: start + chrono::Duration::days(1),
                command: "order".into(),
                asset: Some("AAA".into()),
                amount: Some(100.0),
            }],
            ..Default::default()
        };
        let mut strategy = BuyAndHold::new(router);

        let result =
            run_backtest(&ticks, &mut strategy, &StrategyProperties::default(), &sample_config())
                .unwrap();

        assert_eq!(result.fills.len(), 1);
        assert_eq!(filled_quantities(&result), vec![10]);
        assert!(strategy.router().pending.is_empty());
        assert_eq!(strategy.router().updates, 3);
        assert_eq!(strategy.router().saves, 1);
    }
}

mod pipeline {
    use super::*;

    #[test]
    fn skips_short_histories_and_runs_the_rest() {
        let start = date(2024, 1, 1);
        let port = MockDataPort::new()
            .with_bars("BHP", generate_bars("BHP", start, &linear_closes(100.25, 0.5, 20)))
            .with_bars("CBA", generate_bars("CBA", start, &linear_closes(100.25, 0.5, 5)))
            .with_error("WBC", "disk on fire");
        let codes = vec!["BHP".to_string(), "CBA".to_string(), "WBC".to_string()];
        let mut strategy = FollowTrend::new();

        let result = run_backtest_pipeline(
            &port,
            &mut strategy,
            &props(10, 1),
            &sample_config(),
            &codes,
            "ASX",
            10,
        )
        .unwrap();

        assert_eq!(result.ticks_processed, 20);
        assert!(result.fills.iter().all(|e| e.order.code == "BHP"));
        assert_eq!(result.filled_count(), 11);
    }

    #[test]
    fn empty_universe_is_an_error() {
        let port = MockDataPort::new()
            .with_bars("BHP", generate_bars("BHP", date(2024, 1, 1), &[10.0, 11.0]));
        let mut strategy = FollowTrend::new();

        let err = run_backtest_pipeline(
            &port,
            &mut strategy,
            &props(10, 1),
            &sample_config(),
            &["BHP".to_string()],
            "ASX",
            10,
        )
        .unwrap_err();

        assert!(matches!(
            err,
            TrendtraderError::InsufficientData { bars: 2, minimum: 10, .. }
        ));
    }

    #[test]
    fn date_range_limits_ticks() {
        let start = date(2024, 1, 1);
        let port = MockDataPort::new()
            .with_bars("BHP", generate_bars("BHP", start, &linear_closes(100.1, 0.5, 30)));
        let config = BacktestConfig {
            start_date: date(2024, 1, 11),
            end_date: date(2024, 1, 20),
            ..sample_config()
        };
        let mut strategy = FollowTrend::new();

        let result = run_backtest_pipeline(
            &port,
            &mut strategy,
            &props(10, 1),
            &config,
            &["BHP".to_string()],
            "ASX",
            10,
        )
        .unwrap();

        assert_eq!(result.ticks_processed, 10);
        assert_eq!(result.fills.len(), 1);
        assert_eq!(result.fills[0].date, date(2024, 1, 20));
    }
}
