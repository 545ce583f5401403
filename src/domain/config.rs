//! Engine parameters and their INI mapping.

use crate::domain::error::VoltrendError;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_VOL_WINDOW: usize = 20;
pub const DEFAULT_MA_WINDOW: usize = 50;
pub const DEFAULT_TARGET_VOL: f64 = 0.10;
pub const DEFAULT_MAX_LEVERAGE: f64 = 2.0;
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Everything the indicator pipeline and the price buffer are parameterised by.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub capacity: usize,
    pub vol_window: usize,
    pub ma_window: usize,
    pub target_vol: f64,
    pub max_leverage: f64,
    /// Multiplier applied to the rolling std of returns. Defaults to sqrt(252)
    /// whatever the bar interval is; set it explicitly for intraday bars.
    pub annualization_factor: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            capacity: crate::domain::price_series::DEFAULT_CAPACITY,
            vol_window: DEFAULT_VOL_WINDOW,
            ma_window: DEFAULT_MA_WINDOW,
            target_vol: DEFAULT_TARGET_VOL,
            max_leverage: DEFAULT_MAX_LEVERAGE,
            annualization_factor: TRADING_DAYS_PER_YEAR.sqrt(),
        }
    }
}

impl EngineConfig {
    /// Read every key from the `[series]`, `[strategy]` and `[sizing]`
    /// sections, falling back to defaults for absent keys. Values that do not
    /// parse are `ConfigInvalid`; range checks live in `config_validation`.
    pub fn from_port(port: &dyn ConfigPort) -> Result<Self, VoltrendError> {
        let defaults = Self::default();
        let count = |section: &str, key: &str, default: usize| {
            port.get_int(section, key, default as i64)
                .map(|v| v.max(0) as usize)
        };
        Ok(Self {
            capacity: count("series", "capacity", defaults.capacity)?,
            vol_window: count("strategy", "vol_window", defaults.vol_window)?,
            ma_window: count("strategy", "ma_window", defaults.ma_window)?,
            annualization_factor: port.get_double(
                "strategy",
                "annualization_factor",
                defaults.annualization_factor,
            )?,
            target_vol: port.get_double("sizing", "target_vol", defaults.target_vol)?,
            max_leverage: port.get_double("sizing", "max_leverage", defaults.max_leverage)?,
        })
    }

    /// Observations needed before a cycle can produce its first full row.
    pub fn warmup_len(&self) -> usize {
        self.vol_window.max(self.ma_window).max(1)
    }

    /// Prior rows that seed the rolling windows of a partial recompute.
    pub fn trailing_margin(&self) -> usize {
        self.warmup_len() - 1
    }

    /// True when derived rows computed under `other` are not valid under `self`.
    pub fn invalidates_derived(&self, other: &EngineConfig) -> bool {
        self.vol_window != other.vol_window
            || self.ma_window != other.ma_window
            || self.target_vol != other.target_vol
            || self.max_leverage != other.max_leverage
            || self.annualization_factor != other.annualization_factor
    }
}
