//! Update-cycle driver owning the price buffer, derived rows and watermark.
//!
//! A cycle is `ingest` -> `run_cycle` -> `select_window` / `summarize`. Rows
//! produced by a cycle are committed, and the watermark advanced, only after
//! every pipeline stage succeeded; a failed cycle leaves both untouched so
//! the next one retries the same range.

use crate::domain::config::EngineConfig;
use crate::domain::error::VoltrendError;
use crate::domain::metrics::{self, MetricsReport};
use crate::domain::observation::PriceObservation;
use crate::domain::pipeline::{DerivedRow, IndicatorPipeline};
use crate::domain::price_series::{MergeOutcome, PriceSeries};
use crate::domain::recompute::{Decision, RecomputeController, RecomputePlan};
use crate::domain::window::WindowRange;
use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleStatus {
    Ready,
    WarmingUp { available: usize, required: usize },
}

/// Which rows the last cycle rebuilt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecomputeScope {
    pub from: NaiveDateTime,
    pub start_index: usize,
    pub rows: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport<'a> {
    pub status: CycleStatus,
    pub recomputed: Option<RecomputeScope>,
    pub rows: &'a [DerivedRow],
}

/// Result of [`TrendSession::reconfigure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigChange {
    Unchanged,
    /// Only the capacity moved; committed rows stay valid.
    CapacityOnly { evicted: usize },
    /// Pipeline parameters moved; all derived state was discarded.
    Reset { evicted: usize },
}

/// Committed rows dropped by eviction. They seed a recompute whose rolling
/// windows reach back past the earliest retained observation.
#[derive(Debug, Clone)]
struct EvictedSeed {
    /// Earliest retained timestamp when the rows were dropped.
    anchor: NaiveDateTime,
    rows: Vec<DerivedRow>,
}

#[derive(Debug, Clone)]
pub struct TrendSession {
    config: EngineConfig,
    series: PriceSeries,
    rows: Vec<DerivedRow>,
    evicted: Option<EvictedSeed>,
    pipeline: IndicatorPipeline,
    controller: RecomputeController,
}

impl TrendSession {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            series: PriceSeries::new(config.capacity),
            rows: Vec::new(),
            evicted: None,
            pipeline: IndicatorPipeline::new(&config),
            controller: RecomputeController::new(&config),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn series(&self) -> &PriceSeries {
        &self.series
    }

    pub fn rows(&self) -> &[DerivedRow] {
        &self.rows
    }

    pub fn watermark(&self) -> Option<NaiveDateTime> {
        self.controller.watermark()
    }

    /// Merge a batch from the data feed. Invalid observations are logged and
    /// skipped; the rest of the batch is kept.
    pub fn ingest(&mut self, observations: &[PriceObservation]) -> MergeOutcome {
        let outcome = self.series.merge(observations);

        for rejected in &outcome.rejected {
            warn!(
                timestamp = %rejected.observation.timestamp,
                price = rejected.observation.price,
                reason = %rejected.reason,
                "rejected observation"
            );
        }
        if outcome.evicted > 0 {
            self.drop_evicted_rows();
        }
        if let Some(ts) = outcome.earliest_changed {
            self.controller.mark_changed(ts);
        }

        if outcome.is_noop() {
            return outcome;
        }
        debug!(
            inserted = outcome.inserted,
            replaced = outcome.replaced,
            unchanged = outcome.unchanged,
            evicted = outcome.evicted,
            rejected = outcome.rejected.len(),
            "merged batch"
        );
        outcome
    }

    /// Bring derived rows up to date with the series.
    pub fn run_cycle(&mut self) -> Result<CycleReport<'_>, VoltrendError> {
        let plan = match self.controller.plan(&self.series) {
            Decision::UpToDate => {
                return Ok(CycleReport {
                    status: CycleStatus::Ready,
                    recomputed: None,
                    rows: &self.rows,
                });
            }
            Decision::WarmingUp {
                available,
                required,
            } => {
                debug!(available, required, "warming up");
                return Ok(CycleReport {
                    status: CycleStatus::WarmingUp {
                        available,
                        required,
                    },
                    recomputed: None,
                    rows: &self.rows,
                });
            }
            Decision::Recompute(plan) => plan,
        };

        debug!(
            start = plan.start,
            seed_from = plan.seed_from,
            end = plan.end,
            dirty_from = ?self.controller.dirty_from(),
            "recompute planned"
        );

        let fresh = self
            .recompute(&plan)
            .inspect_err(|e| warn!(error = %e, "recompute failed; watermark unchanged"))?;

        let prices = self.series.as_slice();

        let (Some(from), Some(latest)) = (
            prices.get(plan.start).map(|o| o.timestamp),
            self.series.latest_timestamp(),
        ) else {
            return Err(VoltrendError::Pipeline {
                reason: format!("plan start {} outside series", plan.start),
            });
        };

        self.rows.truncate(plan.start);
        self.rows.extend(fresh);
        self.controller.commit(latest);

        info!(
            from = %from,
            watermark = %latest,
            rows = plan.rows(),
            full = plan.is_full(),
            "cycle committed"
        );

        Ok(CycleReport {
            status: CycleStatus::Ready,
            recomputed: Some(RecomputeScope {
                from,
                start_index: plan.start,
                rows: plan.rows(),
            }),
            rows: &self.rows,
        })
    }

    /// Rows within `range` of the latest committed row.
    pub fn select_window(&self, range: WindowRange) -> &[DerivedRow] {
        range.select(&self.rows)
    }

    pub fn summarize(&self, range: WindowRange) -> Result<MetricsReport, VoltrendError> {
        let rows = self.select_window(range);
        metrics::summarize(rows, self.config.annualization_factor)
            .inspect_err(|_| debug!(range = %range, "window has no rows"))
    }

    /// Apply a new configuration. Any pipeline parameter change discards all
    /// derived rows and resets the watermark.
    pub fn reconfigure(&mut self, config: EngineConfig) -> ConfigChange {
        if config == self.config {
            return ConfigChange::Unchanged;
        }

        let evicted = if config.capacity != self.config.capacity {
            self.series.set_capacity(config.capacity)
        } else {
            0
        };
        if evicted > 0 {
            self.drop_evicted_rows();
        }

        let reset = self.config.invalidates_derived(&config);
        self.config = config;

        if reset {
            self.rows.clear();
            self.evicted = None;
            self.pipeline = IndicatorPipeline::new(&self.config);
            self.controller.reset(&self.config);
            info!(
                vol_window = self.config.vol_window,
                ma_window = self.config.ma_window,
                target_vol = self.config.target_vol,
                max_leverage = self.config.max_leverage,
                annualization_factor = self.config.annualization_factor,
                "configuration change: derived state reset"
            );
            ConfigChange::Reset { evicted }
        } else {
            info!(
                capacity = self.config.capacity,
                evicted, "configuration change: capacity updated"
            );
            ConfigChange::CapacityOnly { evicted }
        }
    }

    fn recompute(&self, plan: &RecomputePlan) -> Result<Vec<DerivedRow>, VoltrendError> {
        let prices = self.series.as_slice();
        let prior = self
            .rows
            .get(..plan.start)
            .ok_or_else(|| VoltrendError::Pipeline {
                reason: format!(
                    "only {} committed rows, plan starts at {}",
                    self.rows.len(),
                    plan.start
                ),
            })?;

        let Some(seed) = self.evicted_seed_for(plan.start) else {
            return self.pipeline.run(prices, prior, plan.start);
        };
        let extended: Vec<PriceObservation> = seed
            .iter()
            .map(|r| PriceObservation::new(r.timestamp, r.price))
            .chain(prices.iter().copied())
            .collect();
        let seeded_prior: Vec<DerivedRow> = seed.iter().chain(prior).cloned().collect();
        self.pipeline
            .run(&extended, &seeded_prior, seed.len() + plan.start)
    }

    /// Evicted rows a recompute from `start` must read, if any.
    fn evicted_seed_for(&self, start: usize) -> Option<&[DerivedRow]> {
        let seed = self.evicted.as_ref()?;
        let reaches_back = start < self.pipeline.margin().max(1);
        (reaches_back && self.series.earliest_timestamp() == Some(seed.anchor))
            .then_some(seed.rows.as_slice())
    }

    fn drop_evicted_rows(&mut self) {
        let earliest = self.series.earliest_timestamp();
        let stale = match earliest {
            Some(e) => self.rows.partition_point(|r| r.timestamp < e),
            None => self.rows.len(),
        };
        if stale == 0 {
            return;
        }
        let dropped: Vec<DerivedRow> = self.rows.drain(..stale).collect();

        // Seeds must directly precede the retained rows.
        let contiguous = self.rows.first().map(|r| r.timestamp) == earliest;
        let Some(anchor) = earliest.filter(|_| contiguous) else {
            self.evicted = None;
            return;
        };
        let mut rows = match self.evicted.take() {
            Some(prev) if dropped.first().is_some_and(|r| r.timestamp == prev.anchor) => prev.rows,
            _ => Vec::new(),
        };
        rows.extend(dropped);
        let excess = rows.len().saturating_sub(self.pipeline.margin().max(1));
        rows.drain(..excess);
        self.evicted = Some(EvictedSeed { anchor, rows });
    }
}

impl Default for TrendSession {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
