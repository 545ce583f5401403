//! Indicator stages of the signal pipeline.
//!
//! Each stage is a pure function over values produced by earlier stages:
//! - [`returns`]: simple period returns
//! - [`volatility`]: rolling realized volatility of returns
//! - [`trend`]: trailing moving average, binary trend signal, regime ids
//! - [`sizing`]: volatility-targeted position
//! - [`pnl`]: lagged-position PnL
//!
//! Per-index functions take the full slice and an index so a partial
//! recompute can evaluate one row against already-known history.

pub mod pnl;
pub mod returns;
pub mod sizing;
pub mod trend;
pub mod volatility;

pub(crate) fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample (n - 1) standard deviation. `None` for fewer than two values.
pub(crate) fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}
