//! Price data access port.

use crate::domain::error::VoltrendError;
use crate::domain::observation::PriceObservation;
use chrono::NaiveDateTime;

pub trait DataPort {
    /// Observations strictly after `since`, or every observation for `None`.
    ///
    /// Prices are passed through as stored; validation happens at ingestion.
    fn fetch_prices(
        &self,
        since: Option<NaiveDateTime>,
    ) -> Result<Vec<PriceObservation>, VoltrendError>;

    /// `(first, last, count)` of the stored observations, `None` when empty.
    fn get_data_range(&self) -> Result<Option<(NaiveDateTime, NaiveDateTime, usize)>, VoltrendError>;
}
