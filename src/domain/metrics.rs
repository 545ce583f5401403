//! Summary statistics over a window of derived rows.
//!
//! PnL volatility is the sample (n - 1) standard deviation, the same
//! estimator the realized-volatility stage uses.

use crate::domain::error::VoltrendError;
use crate::domain::indicator::{mean, sample_std};
use crate::domain::pipeline::DerivedRow;
use chrono::NaiveDateTime;

#[derive(Debug, Clone, PartialEq)]
pub struct MetricsReport {
    pub rows: usize,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub mean_pnl: f64,
    pub pnl_volatility: Option<f64>,
    /// `None` when PnL volatility is zero or undefined.
    pub sharpe_like: Option<f64>,
    pub annualized_return: f64,
    pub annualized_volatility: Option<f64>,
    pub annualized_sharpe: Option<f64>,
    /// Non-positive; 0 when cumulative PnL never falls below its running max.
    pub max_drawdown: f64,
    pub time_in_market: f64,
    pub total_pnl: f64,
    pub final_cumulative_pnl: f64,
}

/// A maximal run of rows sharing one trend signal.
#[derive(Debug, Clone, PartialEq)]
pub struct RegimeSpan {
    pub regime_id: u32,
    pub signal: u8,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub length: usize,
}

/// Summarize `rows`. `annualization_factor` scales per-period figures the way
/// the realized-volatility stage does (`factor²` periods per year).
pub fn summarize(
    rows: &[DerivedRow],
    annualization_factor: f64,
) -> Result<MetricsReport, VoltrendError> {
    let (Some(first), Some(last)) = (rows.first(), rows.last()) else {
        return Err(VoltrendError::EmptyWindow);
    };

    let pnl: Vec<f64> = rows.iter().map(|r| r.pnl).collect();
    let mean_pnl = mean(&pnl);
    let pnl_volatility = sample_std(&pnl);
    let sharpe_like = pnl_volatility
        .filter(|v| *v > 0.0)
        .map(|v| mean_pnl / v);

    let signals: Vec<f64> = rows.iter().map(|r| f64::from(r.signal)).collect();

    Ok(MetricsReport {
        rows: rows.len(),
        start: first.timestamp,
        end: last.timestamp,
        mean_pnl,
        pnl_volatility,
        sharpe_like,
        annualized_return: mean_pnl * annualization_factor * annualization_factor,
        annualized_volatility: pnl_volatility.map(|v| v * annualization_factor),
        annualized_sharpe: sharpe_like.map(|s| s * annualization_factor),
        max_drawdown: compute_drawdown(rows),
        time_in_market: mean(&signals),
        total_pnl: pnl.iter().sum(),
        final_cumulative_pnl: last.cumulative_pnl,
    })
}

/// min over t of (CUM[t] - max(CUM[..=t])) within `rows`.
fn compute_drawdown(rows: &[DerivedRow]) -> f64 {
    let Some(first) = rows.first() else {
        return 0.0;
    };

    let mut peak = first.cumulative_pnl;
    let mut max_dd = 0.0_f64;

    for row in rows {
        if row.cumulative_pnl > peak {
            peak = row.cumulative_pnl;
        }
        let dd = row.cumulative_pnl - peak;
        if dd < max_dd {
            max_dd = dd;
        }
    }

    max_dd
}

/// Group consecutive rows by regime id.
pub fn regimes(rows: &[DerivedRow]) -> Vec<RegimeSpan> {
    let mut spans: Vec<RegimeSpan> = Vec::new();
    for row in rows {
        match spans.last_mut() {
            Some(span) if span.regime_id == row.regime_id => {
                span.end = row.timestamp;
                span.length += 1;
            }
            _ => spans.push(RegimeSpan {
                regime_id: row.regime_id,
                signal: row.signal,
                start: row.timestamp,
                end: row.timestamp,
                length: 1,
            }),
        }
    }
    spans
}
