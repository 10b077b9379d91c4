//! Core domain types and logic.

pub mod backtest;
pub mod code_data;
pub mod config_validation;
pub mod error;
pub mod execution;
pub mod metrics;
pub mod ohlcv;
pub mod ols;
pub mod order;
pub mod portfolio;
pub mod position;
pub mod record;
pub mod strategy;
pub mod tick;
pub mod trend;
pub mod universe;
pub mod window;
