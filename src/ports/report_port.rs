//! Report generation port trait.

use std::path::Path;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::TrendtraderError;

/// Port for writing backtest output (recorded values and fills).
pub trait ReportPort {
    fn write(&self, result: &BacktestResult, output_dir: &Path) -> Result<(), TrendtraderError>;
}
