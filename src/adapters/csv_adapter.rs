//! CSV file price feed.
//!
//! Expects a header row followed by `timestamp,price` records. Timestamps may
//! be dates (`2024-01-15`), naive datetimes (`2024-01-15 16:00:00` or
//! `2024-01-15T16:00:00`) or RFC 3339 (converted to UTC).

use crate::domain::error::VoltrendError;
use crate::domain::observation::PriceObservation;
use crate::ports::data_port::DataPort;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::fs;
use std::path::PathBuf;

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

pub struct CsvAdapter {
    path: PathBuf,
}

impl CsvAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn read_all(&self) -> Result<Vec<PriceObservation>, VoltrendError> {
        let content = fs::read_to_string(&self.path).map_err(|e| VoltrendError::Data {
            reason: format!("failed to read {}: {}", self.path.display(), e),
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        let mut observations = Vec::new();

        for (line, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| VoltrendError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;

            let ts_str = record.get(0).ok_or_else(|| VoltrendError::Data {
                reason: format!("missing timestamp column on record {}", line + 1),
            })?;
            let timestamp = parse_timestamp(ts_str).ok_or_else(|| VoltrendError::Data {
                reason: format!("invalid timestamp '{}' on record {}", ts_str, line + 1),
            })?;

            let price: f64 = record
                .get(1)
                .ok_or_else(|| VoltrendError::Data {
                    reason: format!("missing price column on record {}", line + 1),
                })?
                .parse()
                .map_err(|e| VoltrendError::Data {
                    reason: format!("invalid price value on record {}: {}", line + 1, e),
                })?;

            observations.push(PriceObservation::new(timestamp, price));
        }

        observations.sort_by_key(|o| o.timestamp);
        Ok(observations)
    }
}

pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    for format in DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(value, format) {
            return Some(ts);
        }
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.naive_utc())
}

impl DataPort for CsvAdapter {
    fn fetch_prices(
        &self,
        since: Option<NaiveDateTime>,
    ) -> Result<Vec<PriceObservation>, VoltrendError> {
        let mut observations = self.read_all()?;
        if let Some(since) = since {
            observations.retain(|o| o.timestamp > since);
        }
        Ok(observations)
    }

    fn get_data_range(
        &self,
    ) -> Result<Option<(NaiveDateTime, NaiveDateTime, usize)>, VoltrendError> {
        let observations = self.read_all()?;
        Ok(match (observations.first(), observations.last()) {
            (Some(first), Some(last)) => {
                Some((first.timestamp, last.timestamp, observations.len()))
            }
            _ => None,
        })
    }
}
