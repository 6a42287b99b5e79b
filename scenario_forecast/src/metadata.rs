//! Fit-time metadata
//!
//! The fitting pipeline records the ordered exogenous variable list every
//! model expects. Forecasting cannot proceed without it.

use crate::error::{ForecastError, Result};
use crate::scenario::VariableCatalog;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Metadata written next to the fitted model artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Exogenous columns, in the order used at fit time
    #[serde(default)]
    x_vars_used: Vec<String>,
    /// Revenue targets, in display order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    targets: Vec<String>,
    /// Variable profiles recorded by the pipeline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    variables: Option<VariableCatalog>,
}

impl ModelMetadata {
    /// Create metadata, requiring a non-empty exogenous list
    pub fn new(x_vars_used: Vec<String>) -> Result<Self> {
        let meta = Self {
            x_vars_used,
            targets: Vec::new(),
            variables: None,
        };
        meta.validate()?;
        Ok(meta)
    }

    /// Set the target display order
    pub fn with_targets(mut self, targets: Vec<String>) -> Self {
        self.targets = targets;
        self
    }

    /// Attach variable profiles
    pub fn with_variables(mut self, variables: VariableCatalog) -> Self {
        self.variables = Some(variables);
        self
    }

    /// Parse metadata from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        let meta: Self = serde_json::from_str(json)?;
        meta.validate()?;
        Ok(meta)
    }

    /// Load metadata from a JSON file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    fn validate(&self) -> Result<()> {
        if self.x_vars_used.is_empty() {
            return Err(ForecastError::MissingConfiguration(
                "metadata has no 'x_vars_used' exogenous variable list".to_string(),
            ));
        }
        if let Some(blank) = self.x_vars_used.iter().find(|v| v.trim().is_empty()) {
            return Err(ForecastError::MissingConfiguration(format!(
                "metadata lists a blank exogenous variable name ('{}')",
                blank
            )));
        }
        Ok(())
    }

    /// Ordered exogenous variable names
    pub fn x_vars_used(&self) -> &[String] {
        &self.x_vars_used
    }

    /// Ordered target names, empty when the pipeline did not record them
    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    /// Variable profiles: the standard catalog overlaid with recorded ones
    pub fn catalog(&self) -> VariableCatalog {
        match &self.variables {
            Some(recorded) => VariableCatalog::standard().merge(recorded.clone()),
            None => VariableCatalog::standard(),
        }
    }
}
