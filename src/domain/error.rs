//! Domain error types.

use chrono::NaiveDateTime;

/// Top-level error type for voltrend.
///
/// Warm-up shortfalls are not errors: they surface as
/// [`CycleStatus::WarmingUp`](crate::domain::session::CycleStatus).
#[derive(Debug, thiserror::Error)]
pub enum VoltrendError {
    #[error("invalid observation at {timestamp}: price {price} ({reason})")]
    InvalidObservation {
        timestamp: NaiveDateTime,
        price: f64,
        reason: String,
    },

    #[error("window contains no computable rows")]
    EmptyWindow,

    #[error("invalid window '{input}': expected 1D, 1W, 1M, 1Y, ALL or <n><m|h|d|w>")]
    InvalidWindow { input: String },

    #[error("recompute not committed: {reason}")]
    Pipeline { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("report error: {reason}")]
    Report { reason: String },
}

impl From<&VoltrendError> for std::process::ExitCode {
    fn from(err: &VoltrendError) -> Self {
        let code: u8 = match err {
            VoltrendError::ConfigParse { .. } | VoltrendError::ConfigInvalid { .. } => 2,
            VoltrendError::Data { .. } => 3,
            VoltrendError::EmptyWindow
            | VoltrendError::InvalidWindow { .. }
            | VoltrendError::Report { .. } => 4,
            VoltrendError::InvalidObservation { .. } | VoltrendError::Pipeline { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
