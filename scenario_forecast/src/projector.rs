//! Exogenous path projection
//!
//! Rolls the last historical row forward one period at a time, applying the
//! scenario rule of each variable. Growth rules compound from the committed
//! value of the previous step, so steps run strictly in order.

use crate::data::{Period, Row, TimeSeriesTable};
use crate::error::{ForecastError, Result};
use crate::scenario::{ScenarioKind, ScenarioSpec, VariableCatalog};
use growth_math::log_increment;
use tracing::debug;

/// Percentage-point scale applied to rate-scaled level assumptions
const RATE_SCALE: f64 = 100.0;

/// Validated forecast horizon, at least one period
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Horizon(usize);

impl Horizon {
    pub fn new(periods: usize) -> Result<Self> {
        if periods == 0 {
            return Err(ForecastError::InvalidHorizon(periods));
        }
        Ok(Self(periods))
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl TryFrom<usize> for Horizon {
    type Error = ForecastError;

    fn try_from(periods: usize) -> Result<Self> {
        Self::new(periods)
    }
}

/// Projects future exogenous tables from history and a scenario
#[derive(Debug, Clone)]
pub struct PathProjector<'a> {
    catalog: &'a VariableCatalog,
}

impl<'a> PathProjector<'a> {
    pub fn new(catalog: &'a VariableCatalog) -> Self {
        Self { catalog }
    }

    /// Value of one variable in the next period
    fn next_value(
        &self,
        variable: &str,
        kind: ScenarioKind,
        value: f64,
        current: f64,
    ) -> Result<f64> {
        Ok(match kind {
            ScenarioKind::Fixed => value,
            ScenarioKind::Growth => current + log_increment(value)?,
            ScenarioKind::Level if self.catalog.is_rate_scaled(variable) => value * RATE_SCALE,
            ScenarioKind::Level => value,
        })
    }

    /// Project `horizon` periods past the end of `history`
    ///
    /// The result has the same columns as `history`, indexed by the periods
    /// following its last period. Columns without a scenario rule carry
    /// their last value forward. Every scenario variable must be a column
    /// of `history`.
    pub fn project(
        &self,
        history: &TimeSeriesTable,
        scenario: &ScenarioSpec,
        horizon: Horizon,
    ) -> Result<TimeSeriesTable> {
        let (last_period, mut current): (Period, Row) =
            match (history.last_period(), history.last_row()) {
                (Some(period), Some(row)) => (period, row),
                _ => {
                    return Err(ForecastError::DataError(
                        "Cannot project from an empty history".to_string(),
                    ))
                }
            };

        for (variable, _) in scenario.iter() {
            if !current.contains_key(variable) {
                return Err(ForecastError::MissingColumn(variable.to_string()));
            }
        }

        debug!(
            from = last_period,
            horizon = horizon.get(),
            rules = scenario.len(),
            "projecting exogenous path"
        );

        let mut periods = Vec::with_capacity(horizon.get());
        let mut rows = Vec::with_capacity(horizon.get());

        for step in 1..=horizon.get() {
            let mut next = current.clone();
            for (variable, rule) in scenario.iter() {
                let slot = next
                    .get_mut(variable)
                    .ok_or_else(|| ForecastError::MissingColumn(variable.to_string()))?;
                *slot = self.next_value(variable, rule.kind, rule.value, current[variable])?;
            }

            periods.push(last_period + step as Period);
            rows.push(next.clone());
            current = next;
        }

        TimeSeriesTable::from_rows(periods, rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use indexmap::IndexMap;

    fn history() -> TimeSeriesTable {
        let mut columns = IndexMap::new();
        columns.insert("income_tax".to_string(), vec![6.0, 6.1]);
        columns.insert("gdp_real".to_string(), vec![10.0, 10.2]);
        columns.insert("unemployment".to_string(), vec![6.0, 6.3]);
        columns.insert("dummy_2014".to_string(), vec![1.0, 1.0]);
        TimeSeriesTable::new(vec![2023, 2024], columns).unwrap()
    }

    #[test]
    fn test_horizon_rejects_zero() {
        assert!(matches!(Horizon::new(0), Err(ForecastError::InvalidHorizon(0))));
        assert_eq!(Horizon::try_from(4).unwrap().get(), 4);
    }

    #[test]
    fn test_projection_rules_and_carry_forward() {
        let catalog = VariableCatalog::standard();
        let scenario = ScenarioSpec::builder()
            .growth("gdp_real", 0.05)
            .level("unemployment", 0.07)
            .fixed("dummy_2014", 0.0)
            .build()
            .unwrap();

        let future = PathProjector::new(&catalog)
            .project(&history(), &scenario, Horizon::new(2).unwrap())
            .unwrap();

        assert_eq!(future.periods(), &[2025, 2026]);
        let gdp = future.column("gdp_real").unwrap();
        assert_relative_eq!(gdp[0], 10.2 + 1.05_f64.ln(), epsilon = 1e-12);
        assert_relative_eq!(gdp[1], 10.2 + 2.0 * 1.05_f64.ln(), epsilon = 1e-12);
        assert_relative_eq!(future.column("unemployment").unwrap()[1], 7.0, epsilon = 1e-12);
        assert_eq!(future.column("dummy_2014").unwrap(), &[0.0, 0.0]);
        assert_eq!(future.column("income_tax").unwrap(), &[6.1, 6.1]);
    }

    #[test]
    fn test_rejects_scenario_variable_outside_history() {
        let catalog = VariableCatalog::standard();
        let scenario = ScenarioSpec::builder().level("inflation", 0.1).build().unwrap();

        let err = PathProjector::new(&catalog)
            .project(&history(), &scenario, Horizon::new(1).unwrap())
            .unwrap_err();
        assert!(matches!(err, ForecastError::MissingColumn(name) if name == "inflation"));
    }
}
