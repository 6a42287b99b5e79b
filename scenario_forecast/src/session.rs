//! Forecasting sessions and runs
//!
//! A session holds the read-only inputs of forecasting: fit metadata, the
//! fitted models and the historical table. Each [`ForecastSession::run`]
//! takes a fresh scenario and horizon and produces a [`ForecastRun`].

use crate::aggregation::{self, TargetOutlook};
use crate::cache::ArtifactCache;
use crate::data::{DataLoader, Period, PeriodSeries, TimeSeriesTable};
use crate::error::{ForecastError, Result};
use crate::forecaster::{self, TargetForecasts};
use crate::metadata::ModelMetadata;
use crate::models::{FitStatistics, ModelArtifact, ModelSet};
use crate::projector::{Horizon, PathProjector};
use crate::scenario::{ScenarioSpec, VariableCatalog};
use indexmap::IndexMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// File locations of a session's inputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSources {
    pub models: PathBuf,
    pub metadata: PathBuf,
    pub history: PathBuf,
}

/// Caches shared by every session of a process
#[derive(Debug, Default)]
pub struct SessionCaches {
    pub models: ArtifactCache<ModelArtifact>,
    pub metadata: ArtifactCache<ModelMetadata>,
    pub history: ArtifactCache<TimeSeriesTable>,
}

/// Read-only inputs of a forecasting session
#[derive(Debug, Clone)]
pub struct ForecastSession {
    metadata: Arc<ModelMetadata>,
    catalog: VariableCatalog,
    models: ModelSet,
    history: Arc<TimeSeriesTable>,
    required: Vec<String>,
}

impl ForecastSession {
    /// Create a session from loaded inputs
    pub fn new(
        metadata: Arc<ModelMetadata>,
        models: ModelSet,
        history: Arc<TimeSeriesTable>,
    ) -> Result<Self> {
        if metadata.x_vars_used().is_empty() {
            return Err(ForecastError::MissingConfiguration(
                "metadata has no 'x_vars_used' exogenous variable list".to_string(),
            ));
        }
        if history.is_empty() {
            return Err(ForecastError::DataError("Historical table is empty".to_string()));
        }

        for (target, model) in &models {
            if model.exog_names() != metadata.x_vars_used() {
                warn!(
                    series = %target,
                    expected = ?metadata.x_vars_used(),
                    model = ?model.exog_names(),
                    "model exogenous schema differs from metadata"
                );
            }
        }

        let models = order_models(models, metadata.targets());
        let catalog = metadata.catalog();
        let required = required_variables(metadata.x_vars_used(), &models);

        Ok(Self {
            metadata,
            catalog,
            models,
            history,
            required,
        })
    }

    /// Load inputs through the process caches
    pub fn load(sources: &SessionSources, caches: &SessionCaches) -> Result<Self> {
        let metadata = caches
            .metadata
            .get_or_load(&sources.metadata, |path| ModelMetadata::from_path(path))?;
        let artifact = caches
            .models
            .get_or_load(&sources.models, |path| ModelArtifact::from_path(path))?;
        let history = caches
            .history
            .get_or_load(&sources.history, |path| DataLoader::from_csv(path))?;

        Self::new(metadata, artifact.model_set(), history)
    }

    /// Same inputs with the history capped at `cutoff`
    pub fn with_cutoff(mut self, cutoff: Period) -> Result<Self> {
        let truncated = self.history.truncate_after(cutoff);
        if truncated.is_empty() {
            return Err(ForecastError::DataError(format!(
                "No historical periods at or before {}",
                cutoff
            )));
        }
        self.history = Arc::new(truncated);
        Ok(self)
    }

    /// Same inputs with extra variable profiles layered over the catalog
    pub fn with_catalog_overrides(mut self, overrides: &VariableCatalog) -> Self {
        if !overrides.is_empty() {
            self.catalog = self.catalog.merge(overrides.clone());
        }
        self
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    pub fn catalog(&self) -> &VariableCatalog {
        &self.catalog
    }

    pub fn history(&self) -> &TimeSeriesTable {
        &self.history
    }

    /// Target names in reporting order
    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    /// Variables every scenario must cover
    ///
    /// `x_vars_used` first, then any further column a model expects, in
    /// model order.
    pub fn required_variables(&self) -> &[String] {
        &self.required
    }

    /// Recorded fit statistics per target, for targets that carry them
    pub fn fit_statistics(&self) -> IndexMap<&str, FitStatistics> {
        self.models
            .iter()
            .filter_map(|(target, model)| Some((target.as_str(), model.fit_statistics()?)))
            .collect()
    }

    /// Scenario of catalog defaults for the required variables
    pub fn default_scenario(&self) -> Result<ScenarioSpec> {
        self.catalog.default_scenario(&self.required)
    }

    /// Run one forecast
    ///
    /// Horizon and scenario coverage are checked before any model is
    /// invoked. Per-target failures are collected in the result.
    #[instrument(skip(self, scenario), fields(targets = self.models.len()))]
    pub fn run(&self, scenario: &ScenarioSpec, horizon: usize) -> Result<ForecastRun> {
        let horizon = Horizon::new(horizon)?;
        scenario.ensure_covers(&self.required)?;

        let projected =
            PathProjector::new(&self.catalog).project(&self.history, scenario, horizon)?;
        let exog_path = projected.select(&self.required)?;

        let mut forecasts = forecaster::forecast_all(&self.models, &exog_path, horizon);

        // A target without usable history cannot enter the totals either
        let mut historical = IndexMap::with_capacity(forecasts.levels.len());
        let mut unusable = Vec::new();
        for target in forecasts.levels.keys() {
            match forecaster::historical_levels(&self.history, target) {
                Ok(series) => {
                    historical.insert(target.clone(), series);
                }
                Err(err) => unusable.push(ForecastError::for_target(target.clone(), err)),
            }
        }
        for failure in unusable {
            if let Some(target) = failure.target() {
                forecasts.levels.shift_remove(target);
            }
            warn!(error = %failure, "target has no usable history");
            forecasts.failures.push(failure);
        }

        let total_historical = aggregation::sum_series(historical.values())?;
        let total_forecast = aggregation::sum_series(forecasts.levels.values())?;

        info!(
            forecast = forecasts.levels.len(),
            failed = forecasts.failures.len(),
            "forecast run complete"
        );

        Ok(ForecastRun {
            horizon,
            exog_path,
            forecasts,
            historical,
            total_historical,
            total_forecast,
        })
    }
}

/// `x_vars_used` followed by the model columns it does not list
fn required_variables(x_vars_used: &[String], models: &ModelSet) -> Vec<String> {
    let mut required = x_vars_used.to_vec();
    for model in models.values() {
        for name in model.exog_names() {
            if !required.contains(name) {
                required.push(name.clone());
            }
        }
    }
    required
}

/// Put targets named in `order` first, in that order
fn order_models(models: ModelSet, order: &[String]) -> ModelSet {
    if order.is_empty() {
        return models;
    }

    let mut remaining = models;
    let mut ordered = IndexMap::with_capacity(remaining.len());
    for target in order {
        if let Some(model) = remaining.shift_remove(target) {
            ordered.insert(target.clone(), model);
        }
    }
    ordered.extend(remaining);
    ordered
}

/// Output of one forecast run
///
/// Totals only cover the targets that forecast successfully, on both the
/// historical and the forecast side, so the boundary ratio compares the same
/// set of targets. [`ForecastRun::missing_targets`] lists the others.
#[derive(Debug)]
pub struct ForecastRun {
    horizon: Horizon,
    exog_path: TimeSeriesTable,
    forecasts: TargetForecasts,
    historical: IndexMap<String, PeriodSeries>,
    total_historical: PeriodSeries,
    total_forecast: PeriodSeries,
}

impl ForecastRun {
    pub fn horizon(&self) -> usize {
        self.horizon.get()
    }

    /// Forecast periods
    pub fn future_periods(&self) -> &[Period] {
        self.exog_path.periods()
    }

    /// Projected exogenous inputs for every required variable
    pub fn exog_path(&self) -> &TimeSeriesTable {
        &self.exog_path
    }

    /// Level-space forecasts per target
    pub fn forecasts(&self) -> &IndexMap<String, PeriodSeries> {
        &self.forecasts.levels
    }

    /// Level-space history per forecast target
    pub fn historical(&self) -> &IndexMap<String, PeriodSeries> {
        &self.historical
    }

    /// Per-target failures
    pub fn failures(&self) -> &[ForecastError] {
        &self.forecasts.failures
    }

    /// Targets left out of the totals
    pub fn missing_targets(&self) -> Vec<&str> {
        self.forecasts.failed_targets()
    }

    pub fn is_complete(&self) -> bool {
        self.forecasts.is_complete()
    }

    pub fn total_historical(&self) -> &PeriodSeries {
        &self.total_historical
    }

    pub fn total_forecast(&self) -> &PeriodSeries {
        &self.total_forecast
    }

    fn boundary(&self) -> Result<(f64, f64)> {
        if self.forecasts.levels.is_empty() {
            return Err(ForecastError::DataError(
                "No target produced a forecast".to_string(),
            ));
        }
        aggregation::boundary_values(&self.total_historical, &self.total_forecast)
    }

    /// Growth of the total from the last historical to the last forecast period
    pub fn growth_pct(&self) -> Result<f64> {
        let (base, value) = self.boundary()?;
        aggregation::growth_metric(base, value)
    }

    /// Compound annual growth of the total over the horizon
    pub fn cagr_pct(&self) -> Result<f64> {
        let (base, value) = self.boundary()?;
        aggregation::cagr_metric(base, value, self.horizon.get())
    }

    /// Growth of one target across the boundary
    pub fn target_growth(&self, target: &str) -> Result<f64> {
        let forecast = self
            .forecasts
            .levels
            .get(target)
            .ok_or_else(|| ForecastError::MissingColumn(target.to_string()))?;
        let history = self
            .historical
            .get(target)
            .ok_or_else(|| ForecastError::MissingColumn(target.to_string()))?;
        aggregation::boundary_growth(history, forecast)
    }

    /// Targets sorted by final forecast value, largest first
    pub fn ranking(&self) -> Result<Vec<TargetOutlook>> {
        aggregation::rank_targets(&self.historical, &self.forecasts.levels)
    }

    /// Year-over-year change of the historical total
    pub fn historical_yoy_growth(&self) -> Vec<(Period, Option<f64>)> {
        aggregation::yoy_growth(&self.total_historical)
    }
}
