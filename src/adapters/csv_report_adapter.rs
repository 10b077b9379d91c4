//! CSV report adapter implementing [`ReportPort`].
//!
//! Writes three files into the output directory:
//! `records.csv` (one row per recorded tick, one column per recorded name),
//! `fills.csv` (every submitted order and its outcome) and `equity.csv`.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::TrendtraderError;
use crate::domain::execution::FillResult;
use crate::ports::report_port::ReportPort;

pub const RECORDS_FILE: &str = "records.csv";
pub const FILLS_FILE: &str = "fills.csv";
pub const EQUITY_FILE: &str = "equity.csv";

#[derive(Debug, Default)]
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        CsvReportAdapter
    }
}

fn persistence(path: &Path, e: csv::Error) -> TrendtraderError {
    TrendtraderError::Persistence {
        what: path.display().to_string(),
        reason: e.to_string(),
    }
}

fn write_records(result: &BacktestResult, path: &Path) -> Result<(), TrendtraderError> {
    let columns: BTreeSet<&str> = result
        .records
        .iter()
        .flat_map(|r| r.values.keys().map(String::as_str))
        .collect();

    let mut writer = csv::Writer::from_path(path).map_err(|e| persistence(path, e))?;
    let header: Vec<&str> = std::iter::once("date").chain(columns.iter().copied()).collect();
    writer.write_record(&header).map_err(|e| persistence(path, e))?;

    for record in &result.records {
        let mut row = vec![record.date.to_string()];
        row.extend(
            columns
                .iter()
                .map(|c| record.get(c).map(|v| v.to_string()).unwrap_or_default()),
        );
        writer.write_record(&row).map_err(|e| persistence(path, e))?;
    }
    writer.flush()?;
    Ok(())
}

fn write_fills(result: &BacktestResult, path: &Path) -> Result<(), TrendtraderError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| persistence(path, e))?;
    writer
        .write_record([
            "date",
            "code",
            "requested",
            "status",
            "quantity",
            "price",
            "commission",
            "realized_pnl",
            "reason",
        ])
        .map_err(|e| persistence(path, e))?;

    for event in &result.fills {
        let mut row = vec![
            event.date.to_string(),
            event.order.code.clone(),
            event.order.quantity.to_string(),
        ];
        match &event.result {
            FillResult::Filled {
                quantity,
                execution_price,
                commission,
                realized_pnl,
            } => row.extend([
                "filled".to_string(),
                quantity.to_string(),
                format!("{:.4}", execution_price),
                format!("{:.2}", commission),
                format!("{:.2}", realized_pnl),
                String::new(),
            ]),
            FillResult::Rejected(reason) => row.extend([
                "rejected".to_string(),
                "0".to_string(),
                String::new(),
                String::new(),
                String::new(),
                reason.to_string(),
            ]),
        }
        writer.write_record(&row).map_err(|e| persistence(path, e))?;
    }
    writer.flush()?;
    Ok(())
}

fn write_equity(result: &BacktestResult, path: &Path) -> Result<(), TrendtraderError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| persistence(path, e))?;
    writer
        .write_record(["date", "equity"])
        .map_err(|e| persistence(path, e))?;
    for point in &result.portfolio.equity_curve {
        writer
            .write_record([point.date.to_string(), format!("{:.2}", point.equity)])
            .map_err(|e| persistence(path, e))?;
    }
    writer.flush()?;
    Ok(())
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, result: &BacktestResult, output_dir: &Path) -> Result<(), TrendtraderError> {
        fs::create_dir_all(output_dir)?;
        write_records(result, &output_dir.join(RECORDS_FILE))?;
        write_fills(result, &output_dir.join(FILLS_FILE))?;
        write_equity(result, &output_dir.join(EQUITY_FILE))?;
        info!(
            dir = %output_dir.display(),
            records = result.records.len(),
            fills = result.fills.len(),
            "report written"
        );
        Ok(())
    }
}
