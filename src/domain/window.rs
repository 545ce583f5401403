//! Lookback windows over processed rows.

use crate::domain::error::VoltrendError;
use crate::domain::pipeline::DerivedRow;
use chrono::Duration;
use std::fmt;
use std::str::FromStr;

/// Reporting lookback measured back from the latest row.
///
/// A month is 30 days and a year 365 days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowRange {
    Day,
    Week,
    Month,
    Year,
    All,
    Explicit(Duration),
}

impl WindowRange {
    pub fn duration(&self) -> Option<Duration> {
        match self {
            WindowRange::Day => Some(Duration::days(1)),
            WindowRange::Week => Some(Duration::weeks(1)),
            WindowRange::Month => Some(Duration::days(30)),
            WindowRange::Year => Some(Duration::days(365)),
            WindowRange::All => None,
            WindowRange::Explicit(d) => Some(*d),
        }
    }

    /// Contiguous suffix of `rows` within this lookback of the latest row.
    ///
    /// Never fails: a lookback longer than the history returns every row.
    pub fn select<'a>(&self, rows: &'a [DerivedRow]) -> &'a [DerivedRow] {
        let (Some(lookback), Some(last)) = (self.duration(), rows.last()) else {
            return rows;
        };
        let Some(cutoff) = last.timestamp.checked_sub_signed(lookback) else {
            return rows;
        };
        let from = rows.partition_point(|r| r.timestamp < cutoff);
        &rows[from..]
    }
}

impl fmt::Display for WindowRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowRange::Day => write!(f, "1D"),
            WindowRange::Week => write!(f, "1W"),
            WindowRange::Month => write!(f, "1M"),
            WindowRange::Year => write!(f, "1Y"),
            WindowRange::All => write!(f, "ALL"),
            WindowRange::Explicit(d) => write!(f, "{}m", d.num_minutes()),
        }
    }
}

impl FromStr for WindowRange {
    type Err = VoltrendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || VoltrendError::InvalidWindow {
            input: s.to_string(),
        };
        let trimmed = s.trim();
        match trimmed {
            "1D" => return Ok(WindowRange::Day),
            "1W" => return Ok(WindowRange::Week),
            "1M" => return Ok(WindowRange::Month),
            "1Y" => return Ok(WindowRange::Year),
            _ if trimmed.eq_ignore_ascii_case("all") || trimmed.eq_ignore_ascii_case("max") => {
                return Ok(WindowRange::All);
            }
            _ => {}
        }

        // Named ranges are upper case; `1m` is one minute, not one month.
        let split = trimmed
            .char_indices()
            .last()
            .map(|(i, _)| i)
            .ok_or_else(invalid)?;
        let (count, unit) = trimmed.split_at(split);
        let count: i64 = count.parse().map_err(|_| invalid())?;
        if count <= 0 {
            return Err(invalid());
        }
        let duration = match unit {
            "m" => Duration::try_minutes(count),
            "h" => Duration::try_hours(count),
            "d" => Duration::try_days(count),
            "w" => Duration::try_weeks(count),
            _ => None,
        }
        .ok_or_else(invalid)?;
        Ok(WindowRange::Explicit(duration))
    }
}
