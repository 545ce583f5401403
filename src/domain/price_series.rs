//! Capacity-bounded, timestamp-ordered price buffer.
//!
//! Merges are last-write-wins per timestamp. Once the buffer exceeds its
//! capacity the oldest observations are evicted; the most recent one is always
//! retained, so the effective capacity is never below 1.

use crate::domain::observation::PriceObservation;
use chrono::NaiveDateTime;
use std::collections::BTreeMap;

pub const DEFAULT_CAPACITY: usize = 1000;

/// An observation dropped at ingestion, with the reason it was rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedObservation {
    pub observation: PriceObservation,
    pub reason: String,
}

/// What a single [`PriceSeries::merge`] did to the buffer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeOutcome {
    pub inserted: usize,
    pub replaced: usize,
    pub unchanged: usize,
    pub evicted: usize,
    pub rejected: Vec<RejectedObservation>,
    /// Earliest retained timestamp whose price was inserted or changed.
    pub earliest_changed: Option<NaiveDateTime>,
}

impl MergeOutcome {
    pub fn is_noop(&self) -> bool {
        self.earliest_changed.is_none() && self.evicted == 0
    }
}

#[derive(Debug, Clone)]
pub struct PriceSeries {
    capacity: usize,
    observations: Vec<PriceObservation>,
}

impl PriceSeries {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            observations: Vec::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn latest_timestamp(&self) -> Option<NaiveDateTime> {
        self.observations.last().map(|o| o.timestamp)
    }

    pub fn earliest_timestamp(&self) -> Option<NaiveDateTime> {
        self.observations.first().map(|o| o.timestamp)
    }

    /// Read-only chronological view of the buffer.
    pub fn as_slice(&self) -> &[PriceObservation] {
        &self.observations
    }

    pub fn index_of(&self, timestamp: NaiveDateTime) -> Option<usize> {
        self.observations
            .binary_search_by_key(&timestamp, |o| o.timestamp)
            .ok()
    }

    /// Index of the first observation strictly after `timestamp`.
    pub fn first_index_after(&self, timestamp: NaiveDateTime) -> usize {
        self.observations
            .partition_point(|o| o.timestamp <= timestamp)
    }

    /// Index of the first observation at or after `timestamp`.
    pub fn first_index_at_or_after(&self, timestamp: NaiveDateTime) -> usize {
        self.observations
            .partition_point(|o| o.timestamp < timestamp)
    }

    /// Merge a batch of observations into the buffer.
    ///
    /// Invalid observations are skipped and reported in the outcome; the rest
    /// of the batch still merges. Within a batch the last observation for a
    /// timestamp wins.
    pub fn merge(&mut self, batch: &[PriceObservation]) -> MergeOutcome {
        let mut outcome = MergeOutcome::default();
        if batch.is_empty() {
            return outcome;
        }

        let mut incoming: BTreeMap<NaiveDateTime, f64> = BTreeMap::new();
        for obs in batch {
            match obs.validate() {
                Ok(()) => {
                    incoming.insert(obs.timestamp, obs.price);
                }
                Err(e) => outcome.rejected.push(RejectedObservation {
                    observation: *obs,
                    reason: e.to_string(),
                }),
            }
        }

        let mut changed: Vec<NaiveDateTime> = Vec::new();
        let mut appended: Vec<PriceObservation> = Vec::new();

        for (timestamp, price) in incoming {
            match self.index_of(timestamp) {
                Some(i) => {
                    if self.observations[i].price == price {
                        outcome.unchanged += 1;
                    } else {
                        self.observations[i].price = price;
                        outcome.replaced += 1;
                        changed.push(timestamp);
                    }
                }
                None => {
                    appended.push(PriceObservation::new(timestamp, price));
                    outcome.inserted += 1;
                    changed.push(timestamp);
                }
            }
        }

        if let Some(first_new) = appended.first() {
            let needs_sort = self
                .latest_timestamp()
                .is_some_and(|latest| first_new.timestamp < latest);
            self.observations.extend(appended);
            if needs_sort {
                self.observations.sort_by_key(|o| o.timestamp);
            }
        }

        outcome.evicted = self.truncate_to_capacity();

        let floor = self.earliest_timestamp();
        outcome.earliest_changed = changed
            .into_iter()
            .filter(|ts| floor.is_some_and(|f| *ts >= f))
            .min();

        outcome
    }

    /// Change the capacity bound, evicting from the oldest end if needed.
    /// Returns the number of evicted observations.
    pub fn set_capacity(&mut self, capacity: usize) -> usize {
        self.capacity = capacity.max(1);
        self.truncate_to_capacity()
    }

    fn truncate_to_capacity(&mut self) -> usize {
        if self.observations.len() <= self.capacity {
            return 0;
        }
        let excess = self.observations.len() - self.capacity;
        self.observations.drain(..excess);
        excess
    }
}

impl Default for PriceSeries {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
