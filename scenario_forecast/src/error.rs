//! Error types for the scenario_forecast crate

use growth_math::MathError;
use polars::prelude::PolarsError;
use thiserror::Error;

/// Custom error types for the scenario_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Required fit metadata (the exogenous variable list) is absent
    #[error("Missing configuration: {0}")]
    MissingConfiguration(String),

    /// The scenario has no rule for a variable the models require
    #[error("Scenario has no assumption for required variable '{variable}'")]
    MissingScenarioVariable { variable: String },

    /// A scenario names the same variable more than once
    #[error("Scenario defines variable '{variable}' more than once")]
    DuplicateScenarioVariable { variable: String },

    /// One target's model invocation failed
    #[error("Forecast failed for target '{target}': {source}")]
    ForecastFailure {
        target: String,
        #[source]
        source: Box<ForecastError>,
    },

    /// Horizon below one period
    #[error("Invalid horizon {0}: at least one period is required")]
    InvalidHorizon(usize),

    /// Growth or CAGR requested against a non-positive base total
    #[error("Growth metric is undefined for base value {base}")]
    UndefinedGrowthMetric { base: f64 },

    /// A table does not contain a requested column
    #[error("Column '{0}' not found")]
    MissingColumn(String),

    /// Exogenous input does not match what a model was fitted on
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// A model produced a non-finite value
    #[error("Numerical failure: {0}")]
    NumericalFailure(String),

    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),

    /// Error parsing a JSON document
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error parsing a TOML document
    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// Error writing CSV output
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Error from the growth math helpers
    #[error("Math error: {0}")]
    Math(#[from] MathError),
}

impl ForecastError {
    /// Wrap an error as the failure of a single target
    pub fn for_target(target: impl Into<String>, cause: ForecastError) -> Self {
        ForecastError::ForecastFailure {
            target: target.into(),
            source: Box::new(cause),
        }
    }

    /// Name of the failed target, for `ForecastFailure`
    pub fn target(&self) -> Option<&str> {
        match self {
            ForecastError::ForecastFailure { target, .. } => Some(target),
            _ => None,
        }
    }
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}
