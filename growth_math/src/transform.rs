//! Conversions between log-space and level-space values
//!
//! Revenue targets are fitted and stored as natural logs. Every level value
//! reported for a historical or a forecast period goes through [`to_level`],
//! so both sides of the historical/forecast boundary share one inverse
//! transform.

use crate::{MathError, Result};

/// Convert one log-space value to level space
pub fn to_level(log_value: f64) -> f64 {
    log_value.exp()
}

/// Convert a log-space series to level space, pointwise
pub fn to_levels(log_values: &[f64]) -> Vec<f64> {
    log_values.iter().map(|&v| to_level(v)).collect()
}

/// Convert a strictly positive level value to log space
pub fn to_log(level: f64) -> Result<f64> {
    if !(level > 0.0) || !level.is_finite() {
        return Err(MathError::InvalidInput(format!(
            "Log transform requires a positive finite level, got {}",
            level
        )));
    }

    Ok(level.ln())
}
