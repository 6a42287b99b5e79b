//! Scenario assumptions for exogenous drivers
//!
//! A [`ScenarioSpec`] maps each exogenous variable to exactly one rule
//! (fixed value, level value or growth rate). It is built once per run and
//! has no mutating methods afterwards.
//!
//! How a level value is stored for a variable is not guessed from its name:
//! the [`VariableCatalog`] records, per variable, whether the column is kept
//! in percentage points while the scenario value is a fractional rate.

use crate::error::{ForecastError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a scenario value drives a variable's future path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioKind {
    /// Pinned to the value in every future period
    Fixed,
    /// Set directly to the value in every future period
    Level,
    /// Advanced by `ln(1 + value)` per period from the last observation
    Growth,
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenarioKind::Fixed => write!(f, "fixed"),
            ScenarioKind::Level => write!(f, "level"),
            ScenarioKind::Growth => write!(f, "growth"),
        }
    }
}

/// Rule applied to one variable
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRule {
    pub kind: ScenarioKind,
    pub value: f64,
}

impl ScenarioRule {
    pub fn fixed(value: f64) -> Self {
        Self {
            kind: ScenarioKind::Fixed,
            value,
        }
    }

    pub fn level(value: f64) -> Self {
        Self {
            kind: ScenarioKind::Level,
            value,
        }
    }

    pub fn growth(value: f64) -> Self {
        Self {
            kind: ScenarioKind::Growth,
            value,
        }
    }
}

/// Flat `{variable, kind, value}` record, as read from configuration files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioEntry {
    pub variable: String,
    pub kind: ScenarioKind,
    pub value: f64,
}

/// Immutable set of scenario rules, one per variable
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScenarioSpec {
    rules: IndexMap<String, ScenarioRule>,
}

/// Builder for [`ScenarioSpec`]
#[derive(Debug, Default)]
pub struct ScenarioBuilder {
    entries: Vec<ScenarioEntry>,
}

impl ScenarioBuilder {
    fn push(mut self, variable: &str, rule: ScenarioRule) -> Self {
        self.entries.push(ScenarioEntry {
            variable: variable.to_string(),
            kind: rule.kind,
            value: rule.value,
        });
        self
    }

    pub fn fixed(self, variable: &str, value: f64) -> Self {
        self.push(variable, ScenarioRule::fixed(value))
    }

    pub fn level(self, variable: &str, value: f64) -> Self {
        self.push(variable, ScenarioRule::level(value))
    }

    pub fn growth(self, variable: &str, value: f64) -> Self {
        self.push(variable, ScenarioRule::growth(value))
    }

    /// Finish the scenario; a repeated variable is an error
    pub fn build(self) -> Result<ScenarioSpec> {
        ScenarioSpec::from_entries(self.entries)
    }
}

impl ScenarioSpec {
    pub fn builder() -> ScenarioBuilder {
        ScenarioBuilder::default()
    }

    /// Build from flat entries, rejecting duplicate variables
    pub fn from_entries<I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = ScenarioEntry>,
    {
        let mut rules = IndexMap::new();
        for entry in entries {
            if !entry.value.is_finite() {
                return Err(ForecastError::DataError(format!(
                    "Scenario value for '{}' must be finite",
                    entry.variable
                )));
            }
            let rule = ScenarioRule {
                kind: entry.kind,
                value: entry.value,
            };
            if rules.insert(entry.variable.clone(), rule).is_some() {
                return Err(ForecastError::DuplicateScenarioVariable {
                    variable: entry.variable,
                });
            }
        }

        Ok(Self { rules })
    }

    /// Rule for a variable
    pub fn rule(&self, variable: &str) -> Option<&ScenarioRule> {
        self.rules.get(variable)
    }

    /// Rules in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ScenarioRule)> {
        self.rules.iter().map(|(name, rule)| (name.as_str(), rule))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Flatten back into entries
    pub fn entries(&self) -> Vec<ScenarioEntry> {
        self.rules
            .iter()
            .map(|(variable, rule)| ScenarioEntry {
                variable: variable.clone(),
                kind: rule.kind,
                value: rule.value,
            })
            .collect()
    }

    /// Check that every required variable has a rule
    ///
    /// Reports the first missing variable in `required` order.
    pub fn ensure_covers<S: AsRef<str>>(&self, required: &[S]) -> Result<()> {
        match required
            .iter()
            .map(AsRef::as_ref)
            .find(|name| !self.rules.contains_key(*name))
        {
            Some(missing) => Err(ForecastError::MissingScenarioVariable {
                variable: missing.to_string(),
            }),
            None => Ok(()),
        }
    }
}

/// Per-variable metadata: default assumption and storage units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableProfile {
    /// Kind of assumption collected for this variable
    pub kind: ScenarioKind,
    /// Column stored in percentage points while the scenario value is a fraction
    #[serde(default)]
    pub rate_scaled: bool,
    /// Value used when no explicit assumption is given
    #[serde(default)]
    pub default_value: f64,
    /// Display label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl VariableProfile {
    fn new(kind: ScenarioKind, rate_scaled: bool, default_value: f64, label: &str) -> Self {
        Self {
            kind,
            rate_scaled,
            default_value,
            label: Some(label.to_string()),
        }
    }
}

/// Explicit table of variable profiles
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableCatalog {
    profiles: IndexMap<String, VariableProfile>,
}

impl VariableCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog of the macroeconomic drivers used by the revenue models
    pub fn standard() -> Self {
        use ScenarioKind::*;

        let profiles = [
            ("gdp_real", Growth, false, 0.03, "Real GDP Growth Rate"),
            ("imports_real", Growth, false, 0.05, "Import Growth Rate"),
            ("consumption_real", Growth, false, 0.0, "Consumption Growth"),
            ("govexp", Growth, false, 0.05, "Government Expenditure"),
            ("gdp_growth", Level, true, 0.03, "GDP Growth Rate"),
            ("inflation", Level, true, 0.12, "Inflation Rate"),
            ("unemployment", Level, true, 0.065, "Unemployment Rate"),
            ("dummy_2014", Fixed, false, 1.0, "Structural Break 2014"),
        ];

        let mut catalog = Self::new();
        for (variable, kind, rate_scaled, default_value, label) in profiles {
            catalog.insert(variable, VariableProfile::new(kind, rate_scaled, default_value, label));
        }
        catalog
    }

    /// Add or replace a profile
    pub fn insert(&mut self, variable: &str, profile: VariableProfile) {
        self.profiles.insert(variable.to_string(), profile);
    }

    /// Overlay another catalog's profiles onto this one
    pub fn merge(mut self, overrides: VariableCatalog) -> Self {
        self.profiles.extend(overrides.profiles);
        self
    }

    pub fn profile(&self, variable: &str) -> Option<&VariableProfile> {
        self.profiles.get(variable)
    }

    /// Whether level values for this variable are stored in percentage points
    pub fn is_rate_scaled(&self, variable: &str) -> bool {
        self.profile(variable).is_some_and(|p| p.rate_scaled)
    }

    /// Display label, falling back to a title-cased variable name
    pub fn label(&self, variable: &str) -> String {
        self.profile(variable)
            .and_then(|p| p.label.clone())
            .unwrap_or_else(|| title_case(variable))
    }

    /// Scenario built from catalog defaults for `variables`
    ///
    /// Variables without a profile default to zero growth.
    pub fn default_scenario<S: AsRef<str>>(&self, variables: &[S]) -> Result<ScenarioSpec> {
        ScenarioSpec::from_entries(variables.iter().map(|name| {
            let name = name.as_ref();
            let (kind, value) = self
                .profile(name)
                .map(|p| (p.kind, p.default_value))
                .unwrap_or((ScenarioKind::Growth, 0.0));
            ScenarioEntry {
                variable: name.to_string(),
                kind,
                value,
            }
        }))
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

/// `income_tax` -> `Income Tax`
pub fn title_case(name: &str) -> String {
    name.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
