//! # Growth Math
//!
//! Numeric helpers shared by the revenue forecasting crates.
//! This crate provides the log/level transforms used for stored series and
//! the growth calculations (log-space compounding, growth percentage, CAGR,
//! year-over-year change) used when reporting forecasts.

use thiserror::Error;

pub mod growth;
pub mod transform;

pub use growth::{cagr_pct, compound_log, growth_pct, log_increment, pct_change};
pub use transform::{to_level, to_levels, to_log};

/// Errors that can occur in growth and transform calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Growth is undefined for a non-positive base value ({0})")]
    NonPositiveBase(f64),
}

/// Result type for growth math operations
pub type Result<T> = std::result::Result<T, MathError>;
