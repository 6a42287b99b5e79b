//! Per-target forecasting and log/level conversion
//!
//! Models produce log-space values; historical targets are stored as logs
//! too. Both sides are converted here with the same inverse transform, so
//! totals and growth across the historical/forecast boundary compare like
//! with like.

use crate::data::{PeriodSeries, TimeSeriesTable};
use crate::error::{ForecastError, Result};
use crate::models::{FittedModel, ModelSet};
use crate::projector::Horizon;
use growth_math::to_levels;
use indexmap::IndexMap;
use rayon::prelude::*;
use tracing::{debug, warn};

/// Level-space forecasts of every target that succeeded, plus the failures
#[derive(Debug, Default)]
pub struct TargetForecasts {
    pub levels: IndexMap<String, PeriodSeries>,
    pub failures: Vec<ForecastError>,
}

impl TargetForecasts {
    /// Names of the targets that failed
    pub fn failed_targets(&self) -> Vec<&str> {
        self.failures.iter().filter_map(ForecastError::target).collect()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Level-space view of a log-stored historical target column
pub fn historical_levels(history: &TimeSeriesTable, target: &str) -> Result<PeriodSeries> {
    let logs = history.require_column(target)?;
    PeriodSeries::new(history.periods().to_vec(), to_levels(logs))
}

/// Forecast one target in level space
///
/// `exog` is restricted and reordered to the model's exogenous columns
/// before the model sees it. Any failure is reported as `ForecastFailure`
/// naming the target.
pub fn forecast_target(
    target: &str,
    model: &dyn FittedModel,
    exog: &TimeSeriesTable,
    horizon: Horizon,
) -> Result<PeriodSeries> {
    let run = || -> Result<PeriodSeries> {
        if exog.len() < horizon.get() {
            return Err(ForecastError::ShapeMismatch(format!(
                "{} projected periods for a horizon of {}",
                exog.len(),
                horizon.get()
            )));
        }
        let inputs = exog.select(model.exog_names())?;
        let logs = model.forecast(horizon.get(), &inputs)?;
        if logs.len() != horizon.get() {
            return Err(ForecastError::ShapeMismatch(format!(
                "model returned {} values for {} steps",
                logs.len(),
                horizon.get()
            )));
        }
        let periods = exog.periods()[..horizon.get()].to_vec();
        PeriodSeries::new(periods, to_levels(&logs))
    };

    run().map_err(|cause| ForecastError::for_target(target, cause))
}

/// Forecast every target independently
///
/// Targets run in parallel; results keep the order of `models`. A failing
/// target is recorded and does not affect the others.
pub fn forecast_all(
    models: &ModelSet,
    exog: &TimeSeriesTable,
    horizon: Horizon,
) -> TargetForecasts {
    let outcomes: Vec<(String, Result<PeriodSeries>)> = models
        .par_iter()
        .map(|(target, model)| {
            (
                target.clone(),
                forecast_target(target, model.as_ref(), exog, horizon),
            )
        })
        .collect();

    let mut forecasts = TargetForecasts::default();
    for (target, outcome) in outcomes {
        match outcome {
            Ok(series) => {
                debug!(series = %target, periods = series.len(), "target forecast");
                forecasts.levels.insert(target, series);
            }
            Err(err) => {
                warn!(series = %target, error = %err, "target forecast failed");
                forecasts.failures.push(err);
            }
        }
    }

    forecasts
}
