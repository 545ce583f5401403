//! Indicator pipeline: returns -> realized vol -> trend signal -> position
//! -> lag -> PnL.
//!
//! [`IndicatorPipeline::run`] recomputes rows from a start index onwards.
//! Rolling windows that reach back across the start are seeded from the
//! committed rows before it, so a partial run yields the same rows a full run
//! over the same prices would.

use crate::domain::config::EngineConfig;
use crate::domain::error::VoltrendError;
use crate::domain::indicator::{pnl, returns, sizing, trend, volatility};
use crate::domain::observation::PriceObservation;
use chrono::NaiveDateTime;
use serde::Serialize;

/// Indicator values attached to one timestamp.
///
/// Diagnostic fields stay `None` during warm-up. PnL-affecting fields treat
/// undefined inputs as zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedRow {
    pub timestamp: NaiveDateTime,
    pub price: f64,
    #[serde(rename = "return")]
    pub ret: Option<f64>,
    pub realized_vol: Option<f64>,
    pub trailing_moving_average: Option<f64>,
    pub signal: u8,
    pub regime_id: u32,
    pub position: f64,
    pub lagged_position: f64,
    pub pnl: f64,
    pub cumulative_pnl: f64,
}

/// State carried from one row into the next.
#[derive(Debug, Clone, Copy)]
struct Carry {
    signal: u8,
    regime_id: u32,
    position: f64,
    cumulative_pnl: f64,
}

impl From<&DerivedRow> for Carry {
    fn from(row: &DerivedRow) -> Self {
        Self {
            signal: row.signal,
            regime_id: row.regime_id,
            position: row.position,
            cumulative_pnl: row.cumulative_pnl,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IndicatorPipeline {
    vol_window: usize,
    ma_window: usize,
    target_vol: f64,
    max_leverage: f64,
    annualization_factor: f64,
}

impl IndicatorPipeline {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            vol_window: config.vol_window,
            ma_window: config.ma_window,
            target_vol: config.target_vol,
            max_leverage: config.max_leverage,
            annualization_factor: config.annualization_factor,
        }
    }

    /// Rows before `start` a partial run reads as seeds.
    pub fn margin(&self) -> usize {
        self.vol_window.max(self.ma_window).max(1) - 1
    }

    /// Compute every row of `prices` from scratch.
    pub fn run_full(&self, prices: &[PriceObservation]) -> Vec<DerivedRow> {
        self.compute(prices, &[], 0)
    }

    /// Compute rows `start..prices.len()`.
    ///
    /// `prior` must hold the committed rows for `prices[..start]`. Only the
    /// trailing [`margin`](Self::margin) of them is read.
    pub fn run(
        &self,
        prices: &[PriceObservation],
        prior: &[DerivedRow],
        start: usize,
    ) -> Result<Vec<DerivedRow>, VoltrendError> {
        if start > prices.len() {
            return Err(VoltrendError::Pipeline {
                reason: format!("start {} beyond series length {}", start, prices.len()),
            });
        }
        if prior.len() != start {
            return Err(VoltrendError::Pipeline {
                reason: format!("expected {} seed rows, found {}", start, prior.len()),
            });
        }
        if let (Some(seed), Some(obs)) = (prior.last(), start.checked_sub(1).map(|i| &prices[i])) {
            if seed.timestamp != obs.timestamp {
                return Err(VoltrendError::Pipeline {
                    reason: format!(
                        "seed row at {} does not match series at {}",
                        seed.timestamp, obs.timestamp
                    ),
                });
            }
        }
        Ok(self.compute(prices, prior, start))
    }

    fn compute(
        &self,
        prices: &[PriceObservation],
        prior: &[DerivedRow],
        start: usize,
    ) -> Vec<DerivedRow> {
        let seed_from = start.saturating_sub(self.margin());
        let closes: Vec<f64> = prices[seed_from..].iter().map(|o| o.price).collect();

        // Local buffers are indexed from `seed_from`.
        let mut rets: Vec<Option<f64>> = prior[seed_from..start].iter().map(|r| r.ret).collect();
        let mut prev: Option<Carry> = prior.last().map(Carry::from);
        let mut rows: Vec<DerivedRow> = Vec::with_capacity(prices.len() - start);

        for (i, obs) in prices.iter().enumerate().skip(start) {
            let k = i - seed_from;

            let ret = if i == 0 {
                None
            } else {
                returns::period_return(prices[i - 1].price, obs.price)
            };
            rets.push(ret);

            let realized_vol = volatility::realized_vol_at(
                &rets,
                k,
                self.vol_window,
                self.annualization_factor,
            );
            let trailing_moving_average = trend::trailing_mean_at(&closes, k, self.ma_window);
            let signal = trend::trend_signal(obs.price, trailing_moving_average);
            let regime_id = trend::next_regime(prev.map(|p| (p.signal, p.regime_id)), signal);
            let position = sizing::target_position(
                realized_vol,
                signal,
                self.target_vol,
                self.max_leverage,
            );
            let lagged_position = prev.map_or(0.0, |p| p.position);
            let pnl = pnl::period_pnl(lagged_position, ret);
            let cumulative_pnl = prev.map_or(0.0, |p| p.cumulative_pnl) + pnl;

            let row = DerivedRow {
                timestamp: obs.timestamp,
                price: obs.price,
                ret,
                realized_vol,
                trailing_moving_average,
                signal,
                regime_id,
                position,
                lagged_position,
                pnl,
                cumulative_pnl,
            };
            prev = Some(Carry::from(&row));
            rows.push(row);
        }

        rows
    }
}
