#![allow(dead_code)]

use chrono::NaiveDate;
use std::collections::HashMap;
use trendtrader::domain::backtest::BacktestConfig;
use trendtrader::domain::code_data::CodeData;
use trendtrader::domain::error::TrendtraderError;
pub use trendtrader::domain::ohlcv::OhlcvBar;
use trendtrader::domain::order::{Instruction, OrderBook, Signals};
use trendtrader::domain::portfolio::Portfolio;
use trendtrader::domain::tick::{build_ticks, Tick};
use trendtrader::domain::code_data::build_unified_timeline;
use trendtrader::ports::data_port::DataPort;
use trendtrader::ports::order_router::OrderRouter;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, code: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(code.to_string(), bars);
        self
    }

    pub fn with_error(mut self, code: &str, reason: &str) -> Self {
        self.errors.insert(code.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        code: &str,
        _exchange: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, TrendtraderError> {
        if let Some(reason) = self.errors.get(code) {
            return Err(TrendtraderError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(code)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start_date && b.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_symbols(&self, _exchange: &str) -> Result<Vec<String>, TrendtraderError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

/// Router that passes signals straight through as quantities.
#[derive(Default)]
pub struct PassThroughRouter {
    pub pending: Vec<Instruction>,
    pub updates: usize,
    pub saves: usize,
}

impl OrderRouter for PassThroughRouter {
    fn update(
        &mut self,
        _portfolio: &Portfolio,
        date: NaiveDate,
        _save: bool,
    ) -> Result<Option<Instruction>, TrendtraderError> {
        self.updates += 1;
        match self.pending.first() {
            Some(i) if i.date <= date => Ok(Some(self.pending.remove(0))),
            _ => Ok(None),
        }
    }

    fn trade_signals_handler(&mut self, signals: &Signals) -> OrderBook {
        signals.clone()
    }

    fn save_portfolio(&mut self, _portfolio: &Portfolio) -> Result<(), TrendtraderError> {
        self.saves += 1;
        Ok(())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(code: &str, date: NaiveDate, close: f64) -> OhlcvBar {
    OhlcvBar {
        code: code.to_string(),
        exchange: "ASX".to_string(),
        date,
        open: close,
        high: close + 1.0,
        low: close - 1.0,
        close,
        volume: 1000,
    }
}

/// One bar per calendar day starting at `start`.
pub fn generate_bars(code: &str, start: NaiveDate, closes: &[f64]) -> Vec<OhlcvBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| make_bar(code, start + chrono::Duration::days(i as i64), close))
        .collect()
}

/// `n` closes on a straight line.
pub fn linear_closes(first: f64, slope: f64, n: usize) -> Vec<f64> {
    (0..n).map(|i| first + slope * i as f64).collect()
}

pub fn make_code_data(code: &str, bars: Vec<OhlcvBar>) -> CodeData {
    CodeData::new(code.to_string(), "ASX".to_string(), bars)
}

pub fn ticks_for(code_data: &[CodeData]) -> Vec<Tick> {
    let timeline = build_unified_timeline(code_data);
    build_ticks(code_data, &timeline)
}

pub fn sample_config() -> BacktestConfig {
    BacktestConfig {
        start_date: date(2020, 1, 1),
        end_date: date(2026, 12, 31),
        initial_capital: 100_000.0,
        commission_per_trade: 0.0,
        commission_pct: 0.0,
        slippage_pct: 0.0,
        allow_shorting: false,
        risk_free_rate: 0.05,
    }
}

pub fn csv_for(bars: &[OhlcvBar]) -> String {
    let mut out = String::from("date,open,high,low,close,volume\n");
    for b in bars {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.date, b.open, b.high, b.low, b.close, b.volume
        ));
    }
    out
}
