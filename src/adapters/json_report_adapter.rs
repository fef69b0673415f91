//! JSON report writer.

use std::fs;
use std::path::Path;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::SignalbenchError;
use crate::ports::report_port::ReportPort;

/// Writes the full result as pretty-printed JSON with camelCase keys.
#[derive(Debug, Default)]
pub struct JsonReportAdapter;

impl JsonReportAdapter {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, result: &BacktestResult) -> Result<String, SignalbenchError> {
        serde_json::to_string_pretty(result).map_err(|e| SignalbenchError::Report {
            reason: format!("failed to serialize result: {e}"),
        })
    }
}

impl ReportPort for JsonReportAdapter {
    fn write(&self, result: &BacktestResult, output_path: &Path) -> Result<(), SignalbenchError> {
        let json = self.render(result)?;
        fs::write(output_path, json).map_err(|e| SignalbenchError::Report {
            reason: format!("failed to write {}: {e}", output_path.display()),
        })?;
        tracing::info!(path = %output_path.display(), "report written");
        Ok(())
    }
}
