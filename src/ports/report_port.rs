//! Report output port trait.

use std::path::Path;

use crate::domain::error::EngineError;
use crate::domain::position::Trade;
use crate::domain::report::Report;

/// Port for writing backtest reports.
pub trait ReportPort {
    fn write(&self, report: &Report, trades: &[Trade], output_path: &Path) -> Result<(), EngineError>;
}
