//! Configuration access port.

use crate::domain::error::VoltrendError;
use std::str::FromStr;

/// Section/key configuration lookups.
///
/// Numeric getters return `default` for an absent key and `ConfigInvalid`
/// for a value that does not parse.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    fn get_int(&self, section: &str, key: &str, default: i64) -> Result<i64, VoltrendError> {
        parse_or_default(self.get_string(section, key), section, key, default, "an integer")
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> Result<f64, VoltrendError> {
        parse_or_default(self.get_string(section, key), section, key, default, "a number")
    }
}

fn parse_or_default<T: FromStr>(
    raw: Option<String>,
    section: &str,
    key: &str,
    default: T,
    expected: &str,
) -> Result<T, VoltrendError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    let value = raw.trim();
    value.parse().map_err(|_| VoltrendError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: format!("expected {}, found '{}'", expected, value),
    })
}
