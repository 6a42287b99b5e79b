//! Growth calculations
//!
//! Contains:
//! - Log-space compounding of a growth rate
//! - Total growth percentage between two values
//! - Compound annual growth rate (CAGR)
//! - Year-over-year percentage change

use crate::{MathError, Result};

/// Log-space increment for one period of growth at `rate`
///
/// A variable stored as a log-level advances by `ln(1 + rate)` per period,
/// so repeated steps compound the rate.
pub fn log_increment(rate: f64) -> Result<f64> {
    if !(rate > -1.0) || !rate.is_finite() {
        return Err(MathError::InvalidInput(format!(
            "Growth rate must be finite and greater than -1, got {}",
            rate
        )));
    }

    Ok(rate.ln_1p())
}

/// Advance a log-level value by `steps` periods of growth at `rate`
pub fn compound_log(log_value: f64, rate: f64, steps: usize) -> Result<f64> {
    Ok(log_value + steps as f64 * log_increment(rate)?)
}

fn checked_ratio(base: f64, value: f64) -> Result<f64> {
    if !(base > 0.0) || !base.is_finite() {
        return Err(MathError::NonPositiveBase(base));
    }
    if !value.is_finite() {
        return Err(MathError::InvalidInput(format!(
            "Growth target value must be finite, got {}",
            value
        )));
    }

    Ok(value / base)
}

/// Total growth in percent from `base` to `value`
pub fn growth_pct(base: f64, value: f64) -> Result<f64> {
    Ok((checked_ratio(base, value)? - 1.0) * 100.0)
}

/// Compound annual growth rate in percent from `base` to `value` over `periods`
pub fn cagr_pct(base: f64, value: f64, periods: usize) -> Result<f64> {
    if periods == 0 {
        return Err(MathError::InvalidInput(
            "CAGR needs at least one period".to_string(),
        ));
    }

    let ratio = checked_ratio(base, value)?;
    if ratio < 0.0 {
        return Err(MathError::InvalidInput(format!(
            "CAGR is undefined for a negative ending value ({})",
            value
        )));
    }

    Ok((ratio.powf(1.0 / periods as f64) - 1.0) * 100.0)
}

/// Period-over-period percentage change
///
/// The first element has no predecessor and is `None`, as is any element
/// whose predecessor is zero.
pub fn pct_change(values: &[f64]) -> Vec<Option<f64>> {
    let mut changes = Vec::with_capacity(values.len());
    if values.is_empty() {
        return changes;
    }

    changes.push(None);
    for pair in values.windows(2) {
        let (prev, curr) = (pair[0], pair[1]);
        if prev == 0.0 {
            changes.push(None);
        } else {
            changes.push(Some((curr / prev - 1.0) * 100.0));
        }
    }

    changes
}
