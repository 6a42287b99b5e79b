//! CSV export of history, forecasts and scenario settings

use crate::data::TimeSeriesTable;
use crate::error::{ForecastError, Result};
use crate::scenario::{ScenarioKind, ScenarioSpec, VariableCatalog};
use crate::session::ForecastRun;
use serde::Serialize;
use std::io::Write;

/// Divisor and name of the unit used in exported forecast values
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayUnit {
    pub divisor: f64,
    pub name: String,
}

impl DisplayUnit {
    pub fn new(divisor: f64, name: &str) -> Result<Self> {
        if !(divisor > 0.0) || !divisor.is_finite() {
            return Err(ForecastError::DataError(format!(
                "Display divisor must be positive, got {}",
                divisor
            )));
        }
        Ok(Self {
            divisor,
            name: name.to_string(),
        })
    }

    /// Values as stored
    pub fn stored() -> Self {
        Self {
            divisor: 1.0,
            name: "stored".to_string(),
        }
    }
}

/// Write the historical table as stored (log values for targets)
///
/// Values are written at full precision, so the file loads back through
/// [`DataLoader::from_csv`](crate::data::DataLoader::from_csv) unchanged.
pub fn write_historical_csv<W: Write>(table: &TimeSeriesTable, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = vec!["period".to_string()];
    header.extend(table.column_names().map(str::to_string));
    wtr.write_record(&header)?;

    let columns: Vec<&[f64]> = table
        .column_names()
        .map(|name| table.require_column(name))
        .collect::<Result<_>>()?;
    for (row, period) in table.periods().iter().enumerate() {
        let mut record = vec![period.to_string()];
        record.extend(columns.iter().map(|values| values[row].to_string()));
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Write level-space forecasts, one column per target plus `total`
///
/// Values are divided by the unit's divisor and not rounded.
pub fn write_forecast_csv<W: Write>(
    run: &ForecastRun,
    unit: &DisplayUnit,
    writer: W,
) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = vec!["period".to_string()];
    header.extend(run.forecasts().keys().cloned());
    header.push("total".to_string());
    wtr.write_record(&header)?;

    for (row, (period, total)) in run.total_forecast().iter().enumerate() {
        let mut record = vec![period.to_string()];
        record.extend(
            run.forecasts()
                .values()
                .map(|series| (series.values()[row] / unit.divisor).to_string()),
        );
        record.push((total / unit.divisor).to_string());
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct ScenarioRecord<'a> {
    parameter: String,
    variable: &'a str,
    kind: ScenarioKind,
    value: String,
}

/// Write the active scenario; fixed indicator assumptions are left out
pub fn write_scenario_csv<W: Write>(
    scenario: &ScenarioSpec,
    catalog: &VariableCatalog,
    writer: W,
) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    for (variable, rule) in scenario.iter() {
        if rule.kind == ScenarioKind::Fixed {
            continue;
        }
        wtr.serialize(ScenarioRecord {
            parameter: catalog.label(variable),
            variable,
            kind: rule.kind,
            value: format!("{:.3}", rule.value),
        })?;
    }

    wtr.flush()?;
    Ok(())
}
