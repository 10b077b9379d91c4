//! CSV file data adapter.
//!
//! One file per instrument, `{CODE}_{EXCHANGE}.csv`, with the header
//! `date,open,high,low,close,volume`.

use crate::domain::error::TrendtraderError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::debug;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, code: &str, exchange: &str) -> PathBuf {
        self.base_path.join(format!("{}_{}.csv", code, exchange))
    }
}

fn field<T>(record: &csv::StringRecord, index: usize, name: &str, line: u64) -> Result<T, TrendtraderError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = record.get(index).ok_or_else(|| TrendtraderError::Data {
        reason: format!("line {}: missing {} column", line, name),
    })?;
    raw.trim().parse().map_err(|e| TrendtraderError::Data {
        reason: format!("line {}: invalid {} value {:?}: {}", line, name, raw, e),
    })
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        code: &str,
        exchange: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, TrendtraderError> {
        let path = self.csv_path(code, exchange);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(TrendtraderError::NoData {
                    code: code.to_string(),
                    exchange: exchange.to_string(),
                });
            }
            Err(e) => {
                return Err(TrendtraderError::Data {
                    reason: format!("failed to read {}: {}", path.display(), e),
                });
            }
        };

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| TrendtraderError::Data {
                reason: format!("{}: CSV parse error: {}", path.display(), e),
            })?;
            let line = record.position().map_or(0, |p| p.line());

            let date_str = record.get(0).ok_or_else(|| TrendtraderError::Data {
                reason: format!("line {}: missing date column", line),
            })?;
            let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d").map_err(|e| {
                TrendtraderError::Data {
                    reason: format!("line {}: invalid date {:?}: {}", line, date_str, e),
                }
            })?;

            if date < start_date || date > end_date {
                continue;
            }

            bars.push(OhlcvBar {
                code: code.to_string(),
                exchange: exchange.to_string(),
                date,
                open: field(&record, 1, "open", line)?,
                high: field(&record, 2, "high", line)?,
                low: field(&record, 3, "low", line)?,
                close: field(&record, 4, "close", line)?,
                volume: field(&record, 5, "volume", line)?,
            });
        }

        bars.sort_by_key(|b| b.date);
        debug!(code, exchange, bars = bars.len(), path = %path.display(), "loaded OHLCV");
        Ok(bars)
    }

    fn list_symbols(&self, exchange: &str) -> Result<Vec<String>, TrendtraderError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| TrendtraderError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let suffix = format!("_{}.csv", exchange);
        let mut symbols = Vec::new();

        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            if let Some(code) = name.to_string_lossy().strip_suffix(&suffix) {
                if !code.is_empty() {
                    symbols.push(code.to_string());
                }
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
