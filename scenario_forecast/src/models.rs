//! Fitted forecasting models
//!
//! The forecasting core only needs one capability from a fitted model:
//! given a number of steps and the future exogenous table, return that many
//! log-space predictions. [`FittedModel`] captures exactly that, so any
//! regression implementation can sit behind it.

use crate::data::TimeSeriesTable;
use crate::error::{ForecastError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// A model fitted by the external pipeline, read-only for a session
pub trait FittedModel: Debug + Send + Sync {
    /// Forecast `steps` log-space values from the future exogenous table
    ///
    /// `exog` must carry exactly [`FittedModel::exog_names`], in that order.
    fn forecast(&self, steps: usize, exog: &TimeSeriesTable) -> Result<Vec<f64>>;

    /// Exogenous columns expected by `forecast`, in fit order
    fn exog_names(&self) -> &[String];

    /// In-sample diagnostics, if any were recorded
    fn fit_statistics(&self) -> Option<FitStatistics> {
        None
    }
}

/// Ordered set of fitted models keyed by target name
pub type ModelSet = IndexMap<String, Arc<dyn FittedModel>>;

/// Distributed-lag coefficients of one exogenous driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributedLag {
    /// Exogenous column name
    pub variable: String,
    /// Coefficients for lags 0, 1, ..., q
    pub coefficients: Vec<f64>,
}

/// Goodness-of-fit statistics recorded by the fitting pipeline
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FitStatistics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rsquared: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rsquared_adj: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aic: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bic: Option<f64>,
}

impl FitStatistics {
    /// True when no statistic was recorded
    pub fn is_empty(&self) -> bool {
        self.rsquared.is_none()
            && self.rsquared_adj.is_none()
            && self.aic.is_none()
            && self.bic.is_none()
    }
}

/// Serialized form of an [`ArdlModel`]
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ArdlRecord {
    #[serde(default)]
    intercept: f64,
    #[serde(default)]
    ar: Vec<f64>,
    exog: Vec<DistributedLag>,
    #[serde(default)]
    y_history: Vec<f64>,
    #[serde(default)]
    exog_history: IndexMap<String, Vec<f64>>,
    #[serde(flatten)]
    fit: FitStatistics,
}

/// Fitted ARDL(p, q) equation
///
/// `y_t = c + sum_i phi_i * y_{t-i} + sum_j sum_l beta_{j,l} * x_{j,t-l}`
///
/// The model keeps the observed tail of the target and of every driver so
/// that lagged terms reaching back before the forecast origin can be filled.
/// The distributed lags are fixed at construction; the exogenous column
/// order follows them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ArdlRecord", into = "ArdlRecord")]
pub struct ArdlModel {
    /// Constant term
    pub intercept: f64,
    /// Autoregressive coefficients for lags 1..=p
    pub ar: Vec<f64>,
    /// Observed target values (log space), oldest first
    pub y_history: Vec<f64>,
    /// Observed driver values, oldest first
    pub exog_history: IndexMap<String, Vec<f64>>,
    /// In-sample diagnostics, when the pipeline recorded them
    pub fit: FitStatistics,
    exog: Vec<DistributedLag>,
    names: Vec<String>,
}

impl From<ArdlRecord> for ArdlModel {
    fn from(record: ArdlRecord) -> Self {
        Self::new(
            record.intercept,
            record.ar,
            record.exog,
            record.y_history,
            record.exog_history,
        )
        .with_fit(record.fit)
    }
}

impl From<ArdlModel> for ArdlRecord {
    fn from(model: ArdlModel) -> Self {
        Self {
            intercept: model.intercept,
            ar: model.ar,
            exog: model.exog,
            y_history: model.y_history,
            exog_history: model.exog_history,
            fit: model.fit,
        }
    }
}

impl ArdlModel {
    pub fn new(
        intercept: f64,
        ar: Vec<f64>,
        exog: Vec<DistributedLag>,
        y_history: Vec<f64>,
        exog_history: IndexMap<String, Vec<f64>>,
    ) -> Self {
        let names = exog.iter().map(|term| term.variable.clone()).collect();
        Self {
            intercept,
            ar,
            y_history,
            exog_history,
            fit: FitStatistics::default(),
            exog,
            names,
        }
    }

    pub fn with_fit(mut self, fit: FitStatistics) -> Self {
        self.fit = fit;
        self
    }

    /// Distributed lags, in fit order
    pub fn exog(&self) -> &[DistributedLag] {
        &self.exog
    }

    /// Autoregressive order p
    pub fn ar_order(&self) -> usize {
        self.ar.len()
    }

    /// Largest exogenous lag q
    pub fn max_exog_lag(&self) -> usize {
        self.exog
            .iter()
            .map(|term| term.coefficients.len().saturating_sub(1))
            .max()
            .unwrap_or(0)
    }

    fn check_exog(&self, steps: usize, exog: &TimeSeriesTable) -> Result<()> {
        let supplied: Vec<&str> = exog.column_names().collect();
        if supplied.len() != self.names.len()
            || supplied.iter().zip(&self.names).any(|(a, b)| *a != b.as_str())
        {
            return Err(ForecastError::ShapeMismatch(format!(
                "expected exogenous columns {:?}, got {:?}",
                self.names, supplied
            )));
        }
        if exog.len() < steps {
            return Err(ForecastError::ShapeMismatch(format!(
                "{} exogenous rows supplied for {} steps",
                exog.len(),
                steps
            )));
        }

        if self.y_history.len() < self.ar_order() {
            return Err(ForecastError::DataError(format!(
                "AR order {} needs {} observed values, model holds {}",
                self.ar_order(),
                self.ar_order(),
                self.y_history.len()
            )));
        }
        for term in &self.exog {
            let lags = term.coefficients.len().saturating_sub(1);
            let held = self.exog_history.get(&term.variable).map_or(0, Vec::len);
            if held < lags {
                return Err(ForecastError::DataError(format!(
                    "Driver '{}' needs {} observed lags, model holds {}",
                    term.variable, lags, held
                )));
            }
        }

        Ok(())
    }
}

impl FittedModel for ArdlModel {
    fn forecast(&self, steps: usize, exog: &TimeSeriesTable) -> Result<Vec<f64>> {
        if steps == 0 {
            return Err(ForecastError::InvalidHorizon(steps));
        }
        self.check_exog(steps, exog)?;

        // Observed tail followed by the future path, per driver
        let mut drivers = Vec::with_capacity(self.exog.len());
        for term in &self.exog {
            let history = self
                .exog_history
                .get(&term.variable)
                .map(Vec::as_slice)
                .unwrap_or_default();
            let future = exog.require_column(&term.variable)?;
            let mut path = history.to_vec();
            path.extend_from_slice(&future[..steps]);
            drivers.push((history.len(), path));
        }

        let mut y = self.y_history.clone();
        let origin = y.len();
        let mut forecasts = Vec::with_capacity(steps);

        for h in 0..steps {
            let t = origin + h;
            let mut value = self.intercept;

            for (i, phi) in self.ar.iter().enumerate() {
                value += phi * y[t - 1 - i];
            }

            for (term, (offset, path)) in self.exog.iter().zip(&drivers) {
                let now = offset + h;
                for (lag, beta) in term.coefficients.iter().enumerate() {
                    value += beta * path[now - lag];
                }
            }

            if !value.is_finite() {
                return Err(ForecastError::NumericalFailure(format!(
                    "non-finite prediction at step {}",
                    h + 1
                )));
            }

            y.push(value);
            forecasts.push(value);
        }

        Ok(forecasts)
    }

    fn exog_names(&self) -> &[String] {
        &self.names
    }

    fn fit_statistics(&self) -> Option<FitStatistics> {
        (!self.fit.is_empty()).then_some(self.fit)
    }
}

/// Bundle of fitted models written by the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub models: IndexMap<String, ArdlModel>,
}

impl ModelArtifact {
    /// Parse an artifact from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        let artifact: Self = serde_json::from_str(json)?;
        if artifact.models.is_empty() {
            return Err(ForecastError::DataError(
                "Model artifact contains no models".to_string(),
            ));
        }
        Ok(artifact)
    }

    /// Load an artifact from a JSON file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Target names in artifact order
    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    /// Recorded fit statistics of one target
    pub fn fit_statistics(&self, target: &str) -> Option<&FitStatistics> {
        self.models.get(target).map(|model| &model.fit)
    }

    /// Shared, type-erased handles for a forecasting session
    pub fn model_set(&self) -> ModelSet {
        self.models
            .iter()
            .map(|(target, model)| {
                (
                    target.clone(),
                    Arc::new(model.clone()) as Arc<dyn FittedModel>,
                )
            })
            .collect()
    }
}
