//! Report output port.

use crate::domain::error::VoltrendError;
use crate::domain::metrics::MetricsReport;
use crate::domain::pipeline::DerivedRow;
use std::path::Path;

/// Port for writing processed rows and window summaries.
pub trait ReportPort {
    fn write_rows(&self, rows: &[DerivedRow], output_path: &Path) -> Result<(), VoltrendError>;

    fn write_summary(
        &self,
        report: &MetricsReport,
        window: &str,
        output_path: &Path,
    ) -> Result<(), VoltrendError>;
}
