//! Timestamped price observations.

use crate::domain::error::VoltrendError;
use chrono::NaiveDateTime;

/// A single price bar as delivered by the data feed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceObservation {
    pub timestamp: NaiveDateTime,
    pub price: f64,
}

impl PriceObservation {
    pub fn new(timestamp: NaiveDateTime, price: f64) -> Self {
        Self { timestamp, price }
    }

    /// Rejects non-finite and non-positive prices.
    pub fn validate(&self) -> Result<(), VoltrendError> {
        let reason = if !self.price.is_finite() {
            "price must be finite"
        } else if self.price <= 0.0 {
            "price must be positive"
        } else {
            return Ok(());
        };
        Err(VoltrendError::InvalidObservation {
            timestamp: self.timestamp,
            price: self.price,
            reason: reason.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(16, 0, 0)
            .unwrap()
    }

    #[test]
    fn positive_price_is_valid() {
        assert!(PriceObservation::new(ts(), 101.25).validate().is_ok());
    }

    #[test]
    fn zero_price_rejected() {
        let err = PriceObservation::new(ts(), 0.0).validate().unwrap_err();
        assert!(
            matches!(err, VoltrendError::InvalidObservation { reason, .. } if reason == "price must be positive")
        );
    }

    #[test]
    fn negative_price_rejected() {
        assert!(PriceObservation::new(ts(), -3.0).validate().is_err());
    }

    #[test]
    fn non_finite_prices_rejected() {
        for price in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = PriceObservation::new(ts(), price).validate().unwrap_err();
            assert!(
                matches!(err, VoltrendError::InvalidObservation { reason, .. } if reason == "price must be finite")
            );
        }
    }
}
