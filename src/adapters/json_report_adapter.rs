//! JSON report adapter implementing ReportPort.
//!
//! Writes one pretty-printed document: `{"report": {...}, "trades": [...]}`.

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::domain::error::EngineError;
use crate::domain::position::Trade;
use crate::domain::report::Report;
use crate::ports::report_port::ReportPort;

#[derive(Serialize)]
struct ReportDocument<'a> {
    report: &'a Report,
    trades: &'a [Trade],
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonReportAdapter;

impl JsonReportAdapter {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, report: &Report, trades: &[Trade]) -> Result<String, EngineError> {
        serde_json::to_string_pretty(&ReportDocument { report, trades }).map_err(|e| {
            EngineError::Report {
                reason: format!("failed to serialize report: {e}"),
            }
        })
    }
}

impl ReportPort for JsonReportAdapter {
    fn write(&self, report: &Report, trades: &[Trade], output_path: &Path) -> Result<(), EngineError> {
        let json = self.render(report, trades)?;
        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| EngineError::Report {
                reason: format!("failed to create {}: {}", parent.display(), e),
            })?;
        }
        fs::write(output_path, json).map_err(|e| EngineError::Report {
            reason: format!("failed to write {}: {}", output_path.display(), e),
        })
    }
}
