//! Configuration validation.
//!
//! Validates all engine fields before a session is built.

use crate::domain::config::EngineConfig;
use crate::domain::error::VoltrendError;
use crate::ports::config_port::ConfigPort;

/// Read the engine config from `config` and reject out-of-range values.
pub fn validate_engine_config(config: &dyn ConfigPort) -> Result<EngineConfig, VoltrendError> {
    let engine = EngineConfig::from_port(config)?;
    validate(&engine)?;
    Ok(engine)
}

pub fn validate(config: &EngineConfig) -> Result<(), VoltrendError> {
    validate_capacity(config)?;
    validate_windows(config)?;
    validate_positive("strategy", "annualization_factor", config.annualization_factor)?;
    validate_positive("sizing", "target_vol", config.target_vol)?;
    validate_positive("sizing", "max_leverage", config.max_leverage)?;
    Ok(())
}

fn validate_capacity(config: &EngineConfig) -> Result<(), VoltrendError> {
    if config.capacity < 1 {
        return Err(VoltrendError::ConfigInvalid {
            section: "series".to_string(),
            key: "capacity".to_string(),
            reason: "capacity must be at least 1".to_string(),
        });
    }
    Ok(())
}

fn validate_windows(config: &EngineConfig) -> Result<(), VoltrendError> {
    if config.vol_window < 2 {
        return Err(VoltrendError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "vol_window".to_string(),
            reason: "vol_window must be at least 2".to_string(),
        });
    }
    if config.ma_window < 1 {
        return Err(VoltrendError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "ma_window".to_string(),
            reason: "ma_window must be at least 1".to_string(),
        });
    }
    if config.capacity < config.warmup_len() {
        tracing::warn!(
            capacity = config.capacity,
            required = config.warmup_len(),
            "capacity is below the warm-up length; cycles will never leave warm-up"
        );
    }
    Ok(())
}

fn validate_positive(section: &str, key: &str, value: f64) -> Result<(), VoltrendError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(VoltrendError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("{} must be a positive finite number", key),
        });
    }
    Ok(())
}
