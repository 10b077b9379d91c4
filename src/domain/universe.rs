//! Instrument universe: code-list parsing and data sufficiency checks.

use crate::domain::error::TrendtraderError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct Universe {
    pub codes: Vec<String>,
    pub exchange: String,
}

impl Universe {
    pub fn count(&self) -> usize {
        self.codes.len()
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in code list")]
    EmptyToken,

    #[error("duplicate code: {0}")]
    DuplicateCode(String),
}

impl From<UniverseError> for TrendtraderError {
    fn from(err: UniverseError) -> Self {
        TrendtraderError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "codes".to_string(),
            reason: err.to_string(),
        }
    }
}

pub fn parse_codes(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut codes = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let code = trimmed.to_uppercase();
        if !seen.insert(code.clone()) {
            return Err(UniverseError::DuplicateCode(code));
        }
        codes.push(code);
    }

    Ok(codes)
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    NoData,
    InsufficientBars { bars: usize },
}

#[derive(Debug, Clone)]
pub struct SkippedCode {
    pub code: String,
    pub reason: SkipReason,
}

/// Codes that passed, with their loaded bars, plus the ones left out.
#[derive(Debug, Clone)]
pub struct UniverseValidationResult {
    pub universe: Universe,
    pub data: Vec<Vec<OhlcvBar>>,
    pub skipped: Vec<SkippedCode>,
}

pub fn validate_universe(
    data_port: &dyn DataPort,
    codes: Vec<String>,
    exchange: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
    min_bars: usize,
) -> Result<UniverseValidationResult, TrendtraderError> {
    let mut valid_codes = Vec::new();
    let mut data = Vec::new();
    let mut skipped = Vec::new();
    let total = codes.len();

    for code in codes {
        let ohlcv = match data_port.fetch_ohlcv(&code, exchange, start_date, end_date) {
            Ok(bars) => bars,
            Err(e) => {
                warn!(code = %code, exchange, error = %e, "skipping code, no data");
                skipped.push(SkippedCode {
                    code,
                    reason: SkipReason::NoData,
                });
                continue;
            }
        };

        if ohlcv.is_empty() {
            warn!(code = %code, exchange, "skipping code, no bars in range");
            skipped.push(SkippedCode {
                code,
                reason: SkipReason::NoData,
            });
            continue;
        }

        if ohlcv.len() < min_bars {
            warn!(
                code = %code,
                exchange,
                bars = ohlcv.len(),
                minimum = min_bars,
                "skipping code, insufficient bars"
            );
            skipped.push(SkippedCode {
                code,
                reason: SkipReason::InsufficientBars { bars: ohlcv.len() },
            });
            continue;
        }

        info!(code = %code, bars = ohlcv.len(), "code accepted");
        valid_codes.push(code);
        data.push(ohlcv);
    }

    if valid_codes.is_empty() {
        let bars = skipped
            .iter()
            .filter_map(|s| match s.reason {
                SkipReason::InsufficientBars { bars } => Some(bars),
                SkipReason::NoData => None,
            })
            .max();
        return Err(match bars {
            Some(bars) => TrendtraderError::InsufficientData {
                code: "all".to_string(),
                exchange: exchange.to_string(),
                bars,
                minimum: min_bars,
            },
            None => TrendtraderError::NoData {
                code: "all".to_string(),
                exchange: exchange.to_string(),
            },
        });
    }

    if !skipped.is_empty() {
        info!(
            accepted = valid_codes.len(),
            total, exchange, "universe reduced"
        );
    }

    Ok(UniverseValidationResult {
        universe: Universe {
            codes: valid_codes,
            exchange: exchange.to_string(),
        },
        data,
        skipped,
    })
}
