//! Watermark tracking and recompute planning.
//!
//! The watermark is the latest timestamp whose derived row is committed. A
//! cycle recomputes only rows after it, plus rows from the earliest corrected
//! timestamp at or below it. The watermark only moves forward on commit and
//! only moves back on [`RecomputeController::reset`].

use crate::domain::config::EngineConfig;
use crate::domain::price_series::PriceSeries;
use chrono::NaiveDateTime;

/// Rows a cycle must rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecomputePlan {
    /// First row to overwrite.
    pub start: usize,
    /// First committed row read as a rolling-window seed.
    pub seed_from: usize,
    /// One past the last row (the series length).
    pub end: usize,
}

impl RecomputePlan {
    pub fn rows(&self) -> usize {
        self.end - self.start
    }

    pub fn is_full(&self) -> bool {
        self.start == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    UpToDate,
    WarmingUp { available: usize, required: usize },
    Recompute(RecomputePlan),
}

#[derive(Debug, Clone)]
pub struct RecomputeController {
    watermark: Option<NaiveDateTime>,
    dirty_from: Option<NaiveDateTime>,
    warmup_len: usize,
    margin: usize,
}

impl RecomputeController {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            watermark: None,
            dirty_from: None,
            warmup_len: config.warmup_len(),
            margin: config.trailing_margin(),
        }
    }

    pub fn watermark(&self) -> Option<NaiveDateTime> {
        self.watermark
    }

    pub fn dirty_from(&self) -> Option<NaiveDateTime> {
        self.dirty_from
    }

    /// Record that the price at `timestamp` was inserted or changed.
    ///
    /// Only changes at or below the watermark need tracking; anything later
    /// is picked up as new data.
    pub fn mark_changed(&mut self, timestamp: NaiveDateTime) {
        if self.watermark.is_some_and(|w| timestamp <= w) {
            self.dirty_from = Some(match self.dirty_from {
                Some(d) => d.min(timestamp),
                None => timestamp,
            });
        }
    }

    pub fn plan(&self, series: &PriceSeries) -> Decision {
        let available = series.len();
        if available < self.warmup_len {
            return Decision::WarmingUp {
                available,
                required: self.warmup_len,
            };
        }
        let Some(latest) = series.latest_timestamp() else {
            return Decision::UpToDate;
        };

        let after_watermark = match self.watermark {
            Some(w) if latest <= w && self.dirty_from.is_none() => return Decision::UpToDate,
            Some(w) => series.first_index_after(w),
            None => 0,
        };
        let start = match self.dirty_from {
            Some(d) => after_watermark.min(series.first_index_at_or_after(d)),
            None => after_watermark,
        };

        Decision::Recompute(RecomputePlan {
            start,
            seed_from: start.saturating_sub(self.margin),
            end: available,
        })
    }

    /// Advance the watermark after every stage of a plan succeeded.
    pub fn commit(&mut self, latest: NaiveDateTime) {
        self.watermark = Some(latest);
        self.dirty_from = None;
    }

    /// Forget all committed state; the next plan recomputes everything.
    pub fn reset(&mut self, config: &EngineConfig) {
        *self = Self::new(config);
    }
}
