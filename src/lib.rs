//! trendtrader: daily-bar backtester for buy-and-hold and OLS trend-following
//! strategies.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`], command line in [`cli`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
