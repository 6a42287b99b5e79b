//! Run configuration
//!
//! ```toml
//! horizon = 3
//! cutoff_period = 2024
//!
//! [variables.tariff_index]
//! kind = "growth"
//! default_value = 0.02
//!
//! [[scenario]]
//! variable = "gdp_real"
//! kind = "growth"
//! value = 0.03
//!
//! [[scenario]]
//! variable = "inflation"
//! kind = "level"
//! value = 0.12
//! ```

use crate::data::Period;
use crate::error::Result;
use crate::scenario::{ScenarioEntry, ScenarioSpec, VariableCatalog};
use crate::session::{ForecastRun, ForecastSession};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

const DEFAULT_HORIZON: usize = 3;

fn default_horizon() -> usize {
    DEFAULT_HORIZON
}

/// Settings for one forecast run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Number of future periods
    #[serde(default = "default_horizon")]
    pub horizon: usize,
    /// Ignore history after this period
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cutoff_period: Option<Period>,
    /// Variable profile overrides
    #[serde(default)]
    pub variables: VariableCatalog,
    /// Explicit assumptions; variables left out take catalog defaults
    #[serde(default)]
    pub scenario: Vec<ScenarioEntry>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            horizon: DEFAULT_HORIZON,
            cutoff_period: None,
            variables: VariableCatalog::new(),
            scenario: Vec::new(),
        }
    }
}

impl RunConfig {
    /// Parse a configuration from a TOML string
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Load a configuration from a TOML file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Scenario for `required` variables: explicit entries, then defaults
    ///
    /// Explicit entries are validated as a scenario on their own first, so
    /// a variable listed twice is rejected.
    pub fn scenario_for<S: AsRef<str>>(
        &self,
        required: &[S],
        catalog: &VariableCatalog,
    ) -> Result<ScenarioSpec> {
        let explicit = ScenarioSpec::from_entries(self.scenario.iter().cloned())?;
        let catalog = catalog.clone().merge(self.variables.clone());

        let mut entries = explicit.entries();
        let defaults: Vec<&str> = required
            .iter()
            .map(AsRef::as_ref)
            .filter(|name| explicit.rule(name).is_none())
            .collect();
        if !defaults.is_empty() {
            debug!(variables = ?defaults, "using catalog defaults");
        }
        entries.extend(catalog.default_scenario(&defaults)?.entries());

        ScenarioSpec::from_entries(entries)
    }

    /// Run the configured forecast on a session
    pub fn run(&self, session: &ForecastSession) -> Result<ForecastRun> {
        let session = match self.cutoff_period {
            Some(cutoff) => session.clone().with_cutoff(cutoff)?,
            None => session.clone(),
        };
        let scenario = self.scenario_for(session.required_variables(), session.catalog())?;
        let session = session.with_catalog_overrides(&self.variables);
        session.run(&scenario, self.horizon)
    }
}
