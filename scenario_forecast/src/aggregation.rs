//! Totals and growth metrics over level-space target series
//!
//! All series handed to this module are already in level space and share
//! one unit. Ratios are only taken between values produced by the same
//! conversion.

use crate::data::{Period, PeriodSeries};
use crate::error::{ForecastError, Result};
use growth_math::{cagr_pct, growth_pct, pct_change, MathError};
use indexmap::IndexMap;

/// Sum several level-space series period by period
///
/// Every series must share the same period index. An empty input yields an
/// empty series.
pub fn sum_series<'a, I>(series: I) -> Result<PeriodSeries>
where
    I: IntoIterator<Item = &'a PeriodSeries>,
{
    let mut iter = series.into_iter();
    let first = match iter.next() {
        Some(first) => first,
        None => return PeriodSeries::new(Vec::new(), Vec::new()),
    };

    let periods = first.periods().to_vec();
    let mut totals = first.values().to_vec();
    for next in iter {
        if next.periods() != periods.as_slice() {
            return Err(ForecastError::DataError(
                "Cannot sum series with different period indexes".to_string(),
            ));
        }
        for (total, value) in totals.iter_mut().zip(next.values()) {
            *total += value;
        }
    }

    PeriodSeries::new(periods, totals)
}

fn growth_error(err: MathError, base: f64) -> ForecastError {
    match err {
        MathError::NonPositiveBase(_) => ForecastError::UndefinedGrowthMetric { base },
        other => ForecastError::Math(other),
    }
}

/// Total growth in percent from `base` to `value`
///
/// A non-positive base is `UndefinedGrowthMetric`.
pub fn growth_metric(base: f64, value: f64) -> Result<f64> {
    growth_pct(base, value).map_err(|err| growth_error(err, base))
}

/// Compound annual growth in percent from `base` to `value` over `periods`
pub fn cagr_metric(base: f64, value: f64, periods: usize) -> Result<f64> {
    cagr_pct(base, value, periods).map_err(|err| growth_error(err, base))
}

/// Growth of one series from its last historical value to its last forecast
pub fn boundary_growth(historical: &PeriodSeries, forecast: &PeriodSeries) -> Result<f64> {
    let (base, value) = boundary_values(historical, forecast)?;
    growth_metric(base, value)
}

/// Last historical and last forecast value
pub fn boundary_values(historical: &PeriodSeries, forecast: &PeriodSeries) -> Result<(f64, f64)> {
    let (_, base) = historical
        .last()
        .ok_or_else(|| ForecastError::DataError("Historical series is empty".to_string()))?;
    let (_, value) = forecast
        .last()
        .ok_or_else(|| ForecastError::DataError("Forecast series is empty".to_string()))?;
    Ok((base, value))
}

/// Year-over-year percentage change of a series, keyed by period
pub fn yoy_growth(series: &PeriodSeries) -> Vec<(Period, Option<f64>)> {
    series
        .periods()
        .iter()
        .copied()
        .zip(pct_change(series.values()))
        .collect()
}

/// One target's position at the end of the forecast
#[derive(Debug, Clone, PartialEq)]
pub struct TargetOutlook {
    pub target: String,
    /// Last historical level
    pub base: f64,
    /// Last forecast level
    pub forecast: f64,
    /// Growth from `base` to `forecast`, in percent
    pub growth_pct: f64,
}

/// Targets ranked by final forecast value, largest first
pub fn rank_targets(
    historical: &IndexMap<String, PeriodSeries>,
    forecasts: &IndexMap<String, PeriodSeries>,
) -> Result<Vec<TargetOutlook>> {
    let mut ranking = forecasts
        .iter()
        .map(|(target, forecast)| {
            let history = historical
                .get(target)
                .ok_or_else(|| ForecastError::MissingColumn(target.clone()))?;
            let (base, value) = boundary_values(history, forecast)?;
            Ok(TargetOutlook {
                target: target.clone(),
                base,
                forecast: value,
                growth_pct: growth_metric(base, value)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    ranking.sort_by(|a, b| b.forecast.total_cmp(&a.forecast));
    Ok(ranking)
}
