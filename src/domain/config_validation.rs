//! Configuration validation.
//!
//! Every key the backtest reads is checked here before any data is loaded.

use crate::domain::error::TrendtraderError;
use crate::domain::strategy::StrategyKind;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), TrendtraderError> {
    validate_initial_capital(config)?;
    validate_commission(config)?;
    validate_slippage(config)?;
    validate_risk_free_rate(config)?;
    validate_dates(config)?;
    validate_exchange(config)?;
    validate_codes(config)?;
    Ok(())
}

/// Checks `[strategy]` and `[manager]`. A missing strategy name is allowed
/// since the command line may supply one.
pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), TrendtraderError> {
    validate_strategy_name(config)?;
    validate_refresh_period(config)?;
    validate_window_length(config)?;
    validate_position_size(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> TrendtraderError {
    TrendtraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), TrendtraderError> {
    let value = config.get_double("backtest", "initial_capital", 100_000.0);
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    Ok(())
}

fn validate_commission(config: &dyn ConfigPort) -> Result<(), TrendtraderError> {
    if config.get_double("backtest", "commission_per_trade", 0.0) < 0.0 {
        return Err(invalid(
            "backtest",
            "commission_per_trade",
            "commission_per_trade must be non-negative",
        ));
    }
    if config.get_double("backtest", "commission_pct", 0.0) < 0.0 {
        return Err(invalid(
            "backtest",
            "commission_pct",
            "commission_pct must be non-negative",
        ));
    }
    Ok(())
}

fn validate_slippage(config: &dyn ConfigPort) -> Result<(), TrendtraderError> {
    if config.get_double("backtest", "slippage_pct", 0.0) < 0.0 {
        return Err(invalid(
            "backtest",
            "slippage_pct",
            "slippage_pct must be non-negative",
        ));
    }
    Ok(())
}

fn validate_risk_free_rate(config: &dyn ConfigPort) -> Result<(), TrendtraderError> {
    let value = config.get_double("backtest", "risk_free_rate", 0.05);
    if !(0.0..1.0).contains(&value) {
        return Err(invalid(
            "backtest",
            "risk_free_rate",
            "risk_free_rate must be between 0 and 1",
        ));
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), TrendtraderError> {
    let start_date = parse_date(config.get_string("backtest", "start_date").as_deref(), "start_date")?;
    let end_date = parse_date(config.get_string("backtest", "end_date").as_deref(), "end_date")?;

    if start_date >= end_date {
        return Err(invalid(
            "backtest",
            "start_date",
            "start_date must be before end_date",
        ));
    }
    Ok(())
}

pub(crate) fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, TrendtraderError> {
    match value {
        None => Err(TrendtraderError::ConfigMissing {
            section: "backtest".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            TrendtraderError::ConfigInvalid {
                section: "backtest".to_string(),
                key: field.to_string(),
                reason: format!("invalid {} format, expected YYYY-MM-DD", field),
            }
        }),
    }
}

fn validate_exchange(config: &dyn ConfigPort) -> Result<(), TrendtraderError> {
    match config.get_string("backtest", "exchange") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(TrendtraderError::ConfigMissing {
            section: "backtest".to_string(),
            key: "exchange".to_string(),
        }),
    }
}

fn validate_codes(config: &dyn ConfigPort) -> Result<(), TrendtraderError> {
    let codes = config.get_string("backtest", "codes");
    let code = config.get_string("backtest", "code");

    match (codes, code) {
        (Some(c), _) if !c.trim().is_empty() => Ok(()),
        (_, Some(c)) if !c.trim().is_empty() => Ok(()),
        _ => Err(TrendtraderError::ConfigMissing {
            section: "backtest".to_string(),
            key: "code".to_string(),
        }),
    }
}

fn validate_strategy_name(config: &dyn ConfigPort) -> Result<(), TrendtraderError> {
    match config.get_string("strategy", "name") {
        Some(name) if !name.trim().is_empty() => name.parse::<StrategyKind>().map(|_| ()),
        _ => Ok(()),
    }
}

fn validate_refresh_period(config: &dyn ConfigPort) -> Result<(), TrendtraderError> {
    if config.get_int("strategy", "refresh_period", 1) < 1 {
        return Err(invalid(
            "strategy",
            "refresh_period",
            "refresh_period must be at least 1",
        ));
    }
    Ok(())
}

fn validate_window_length(config: &dyn ConfigPort) -> Result<(), TrendtraderError> {
    if config.get_int("strategy", "window_length", 50) < 2 {
        return Err(invalid(
            "strategy",
            "window_length",
            "window_length must be at least 2",
        ));
    }
    Ok(())
}

fn validate_position_size(config: &dyn ConfigPort) -> Result<(), TrendtraderError> {
    let value = config.get_double("manager", "position_size", 1.0);
    if !(value > 0.0 && value <= 1.0) {
        return Err(invalid(
            "manager",
            "position_size",
            "position_size must be between 0 and 1",
        ));
    }
    Ok(())
}
