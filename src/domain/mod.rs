//! Core domain types and logic.

pub mod config;
pub mod config_validation;
pub mod error;
pub mod indicator;
pub mod metrics;
pub mod observation;
pub mod pipeline;
pub mod price_series;
pub mod recompute;
pub mod session;
pub mod window;
