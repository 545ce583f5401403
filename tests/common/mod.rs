#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
pub use voltrend::domain::config::EngineConfig;
use voltrend::domain::error::VoltrendError;
pub use voltrend::domain::observation::PriceObservation;
use voltrend::ports::data_port::DataPort;

pub struct MockDataPort {
    pub observations: Vec<PriceObservation>,
    pub error: Option<String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            observations: Vec::new(),
            error: None,
        }
    }

    pub fn with_observations(mut self, observations: Vec<PriceObservation>) -> Self {
        self.observations.extend(observations);
        self
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_prices(
        &self,
        since: Option<NaiveDateTime>,
    ) -> Result<Vec<PriceObservation>, VoltrendError> {
        if let Some(reason) = &self.error {
            return Err(VoltrendError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .observations
            .iter()
            .filter(|o| since.is_none_or(|s| o.timestamp > s))
            .copied()
            .collect())
    }

    fn get_data_range(
        &self,
    ) -> Result<Option<(NaiveDateTime, NaiveDateTime, usize)>, VoltrendError> {
        let min = self.observations.iter().map(|o| o.timestamp).min();
        let max = self.observations.iter().map(|o| o.timestamp).max();
        Ok(min.zip(max).map(|(a, b)| (a, b, self.observations.len())))
    }
}

pub fn day(n: i64) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + Duration::days(n)
}

pub fn obs(n: i64, price: f64) -> PriceObservation {
    PriceObservation::new(day(n), price)
}

/// Daily bars from `prices`, starting at day 0.
pub fn daily(prices: &[f64]) -> Vec<PriceObservation> {
    prices
        .iter()
        .enumerate()
        .map(|(i, &p)| obs(i as i64, p))
        .collect()
}

/// Deterministic trending series with pullbacks.
pub fn trending(count: usize, start_price: f64) -> Vec<PriceObservation> {
    (0..count)
        .map(|i| {
            let t = i as f64;
            obs(i as i64, start_price * (1.0 + 0.004 * t) + (t * 0.7).sin() * 2.0)
        })
        .collect()
}

pub fn small_config() -> EngineConfig {
    EngineConfig {
        capacity: 500,
        vol_window: 5,
        ma_window: 10,
        ..EngineConfig::default()
    }
}
