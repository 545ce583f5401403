//! CSV report adapter: one file of derived rows, one `metric,value` summary.

use crate::domain::error::VoltrendError;
use crate::domain::metrics::MetricsReport;
use crate::domain::pipeline::DerivedRow;
use crate::ports::report_port::ReportPort;
use std::path::Path;

pub struct CsvReportAdapter;

fn report_err(path: &Path, e: impl std::fmt::Display) -> VoltrendError {
    VoltrendError::Report {
        reason: format!("failed to write {}: {}", path.display(), e),
    }
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl ReportPort for CsvReportAdapter {
    fn write_rows(&self, rows: &[DerivedRow], output_path: &Path) -> Result<(), VoltrendError> {
        let mut writer =
            csv::Writer::from_path(output_path).map_err(|e| report_err(output_path, e))?;
        for row in rows {
            writer
                .serialize(row)
                .map_err(|e| report_err(output_path, e))?;
        }
        writer.flush().map_err(|e| report_err(output_path, e))?;
        Ok(())
    }

    fn write_summary(
        &self,
        report: &MetricsReport,
        window: &str,
        output_path: &Path,
    ) -> Result<(), VoltrendError> {
        let mut writer =
            csv::Writer::from_path(output_path).map_err(|e| report_err(output_path, e))?;
        let records: [(&str, String); 14] = [
            ("window", window.to_string()),
            ("rows", report.rows.to_string()),
            ("start", report.start.to_string()),
            ("end", report.end.to_string()),
            ("mean_pnl", report.mean_pnl.to_string()),
            ("pnl_volatility", optional(report.pnl_volatility)),
            ("sharpe_like", optional(report.sharpe_like)),
            ("annualized_return", report.annualized_return.to_string()),
            ("annualized_volatility", optional(report.annualized_volatility)),
            ("annualized_sharpe", optional(report.annualized_sharpe)),
            ("max_drawdown", report.max_drawdown.to_string()),
            ("time_in_market", report.time_in_market.to_string()),
            ("total_pnl", report.total_pnl.to_string()),
            ("final_cumulative_pnl", report.final_cumulative_pnl.to_string()),
        ];
        writer
            .write_record(["metric", "value"])
            .map_err(|e| report_err(output_path, e))?;
        for (metric, value) in records {
            writer
                .write_record([metric, value.as_str()])
                .map_err(|e| report_err(output_path, e))?;
        }
        writer.flush().map_err(|e| report_err(output_path, e))?;
        Ok(())
    }
}
