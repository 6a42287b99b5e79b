//! Time series data handling for forecasting
//!
//! Historical data arrives as a table indexed by fiscal year: one log-space
//! column per revenue target plus one column per exogenous driver. The
//! projector produces future tables with the same shape.

use crate::error::{ForecastError, Result};
use chrono::{Datelike, NaiveDate};
use indexmap::IndexMap;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

/// One fiscal year
pub type Period = i32;

/// Values of every column at one period, in column order
pub type Row = IndexMap<String, f64>;

/// Period-indexed table of numeric columns
///
/// Invariants: periods are strictly increasing, and every column holds
/// exactly one value per period.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesTable {
    periods: Vec<Period>,
    columns: IndexMap<String, Vec<f64>>,
}

/// A single named series over periods
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodSeries {
    periods: Vec<Period>,
    values: Vec<f64>,
}

/// Data loader for time series data
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load time series data from a CSV file
    ///
    /// The first column is the period index; the remaining numeric columns
    /// become table columns.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<TimeSeriesTable> {
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        Self::from_dataframe(&df)
    }

    /// Create a table from an existing DataFrame
    pub fn from_dataframe(df: &DataFrame) -> Result<TimeSeriesTable> {
        let (index, data) = df
            .get_columns()
            .split_first()
            .ok_or_else(|| ForecastError::DataError("Data frame has no columns".to_string()))?;

        let periods = Self::parse_periods(index)?;

        let mut columns = IndexMap::new();
        for series in data {
            if !series.dtype().is_numeric() {
                continue;
            }

            let cast = series.cast(&DataType::Float64)?;
            let values = cast
                .f64()?
                .into_iter()
                .map(|v| {
                    v.ok_or_else(|| {
                        ForecastError::DataError(format!(
                            "Column '{}' contains missing values",
                            series.name()
                        ))
                    })
                })
                .collect::<Result<Vec<f64>>>()?;
            columns.insert(series.name().to_string(), values);
        }

        if columns.is_empty() {
            return Err(ForecastError::DataError(
                "File must contain numeric data columns".to_string(),
            ));
        }

        TimeSeriesTable::new(periods, columns)
    }

    /// Read the period index column
    fn parse_periods(index: &Series) -> Result<Vec<Period>> {
        let missing = || {
            ForecastError::DataError(format!(
                "Period column '{}' contains missing values",
                index.name()
            ))
        };

        match index.dtype() {
            DataType::Utf8 => index
                .utf8()?
                .into_iter()
                .map(|label| parse_period_label(label.ok_or_else(missing)?))
                .collect(),
            DataType::Int32 | DataType::Int64 | DataType::UInt32 | DataType::UInt64 => index
                .cast(&DataType::Int64)?
                .i64()?
                .into_iter()
                .map(|year| {
                    let year = year.ok_or_else(missing)?;
                    Period::try_from(year).map_err(|_| {
                        ForecastError::DataError(format!("Period {} is out of range", year))
                    })
                })
                .collect(),
            dtype => Err(ForecastError::DataError(format!(
                "Unsupported period column type: {}",
                dtype
            ))),
        }
    }
}

/// Parse a period label: a bare year (`2019`) or an ISO date (`2019-06-30`)
pub fn parse_period_label(label: &str) -> Result<Period> {
    let label = label.trim();
    if let Ok(year) = label.parse::<Period>() {
        return Ok(year);
    }

    NaiveDate::parse_from_str(label, "%Y-%m-%d")
        .map(|date| date.year())
        .map_err(|_| ForecastError::DataError(format!("Unrecognised period label '{}'", label)))
}

impl TimeSeriesTable {
    /// Create a table, validating the period index and column lengths
    pub fn new(periods: Vec<Period>, columns: IndexMap<String, Vec<f64>>) -> Result<Self> {
        if let Some(pair) = periods.windows(2).find(|pair| pair[1] <= pair[0]) {
            return Err(ForecastError::DataError(format!(
                "Periods must be strictly increasing: {} is followed by {}",
                pair[0], pair[1]
            )));
        }

        for (name, values) in &columns {
            if values.len() != periods.len() {
                return Err(ForecastError::DataError(format!(
                    "Column '{}' has {} values for {} periods",
                    name,
                    values.len(),
                    periods.len()
                )));
            }
        }

        Ok(Self { periods, columns })
    }

    /// Build a table from rows that all share the first row's schema
    pub fn from_rows(periods: Vec<Period>, rows: Vec<Row>) -> Result<Self> {
        if periods.len() != rows.len() {
            return Err(ForecastError::DataError(format!(
                "{} periods supplied for {} rows",
                periods.len(),
                rows.len()
            )));
        }

        let mut columns: IndexMap<String, Vec<f64>> = rows
            .first()
            .map(|row| {
                row.keys()
                    .map(|name| (name.clone(), Vec::with_capacity(rows.len())))
                    .collect()
            })
            .unwrap_or_default();

        for (period, row) in periods.iter().zip(&rows) {
            if row.len() != columns.len() {
                return Err(ForecastError::DataError(format!(
                    "Row for period {} has {} columns, expected {}",
                    period,
                    row.len(),
                    columns.len()
                )));
            }
            for (name, values) in columns.iter_mut() {
                let value = row
                    .get(name)
                    .ok_or_else(|| ForecastError::MissingColumn(name.clone()))?;
                values.push(*value);
            }
        }

        Self::new(periods, columns)
    }

    /// Period index
    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    /// Number of periods
    pub fn len(&self) -> usize {
        self.periods.len()
    }

    /// Whether the table has no periods
    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// Column names in order
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Whether a column exists
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Values of a column
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    /// Values of a column, or `MissingColumn`
    pub fn require_column(&self, name: &str) -> Result<&[f64]> {
        self.column(name)
            .ok_or_else(|| ForecastError::MissingColumn(name.to_string()))
    }

    /// Last period in the index
    pub fn last_period(&self) -> Option<Period> {
        self.periods.last().copied()
    }

    /// Values of every column at the last period
    pub fn last_row(&self) -> Option<Row> {
        let last = self.periods.len().checked_sub(1)?;
        Some(
            self.columns
                .iter()
                .map(|(name, values)| (name.clone(), values[last]))
                .collect(),
        )
    }

    /// Restrict the table to `names`, in that order
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Self> {
        let mut columns = IndexMap::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            let values = self.require_column(name)?;
            columns.insert(name.to_string(), values.to_vec());
        }

        Ok(Self {
            periods: self.periods.clone(),
            columns,
        })
    }

    /// Keep only the periods at or before `cutoff`
    pub fn truncate_after(&self, cutoff: Period) -> Self {
        let keep = self.periods.partition_point(|&p| p <= cutoff);
        Self {
            periods: self.periods[..keep].to_vec(),
            columns: self
                .columns
                .iter()
                .map(|(name, values)| (name.clone(), values[..keep].to_vec()))
                .collect(),
        }
    }

    /// Single column as a period series
    pub fn series(&self, name: &str) -> Result<PeriodSeries> {
        let values = self.require_column(name)?;
        PeriodSeries::new(self.periods.clone(), values.to_vec())
    }

    /// Convert to a polars DataFrame with a leading `period` column
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let mut series = Vec::with_capacity(self.columns.len() + 1);
        series.push(Series::new("period", self.periods.clone()));
        for (name, values) in &self.columns {
            series.push(Series::new(name.as_str(), values.clone()));
        }

        Ok(DataFrame::new(series)?)
    }
}

impl PeriodSeries {
    /// Create a series, validating the period index
    pub fn new(periods: Vec<Period>, values: Vec<f64>) -> Result<Self> {
        if periods.len() != values.len() {
            return Err(ForecastError::DataError(format!(
                "{} values supplied for {} periods",
                values.len(),
                periods.len()
            )));
        }
        if periods.windows(2).any(|pair| pair[1] <= pair[0]) {
            return Err(ForecastError::DataError(
                "Series periods must be strictly increasing".to_string(),
            ));
        }

        Ok(Self { periods, values })
    }

    /// Period index
    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    /// Values in period order
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of periods
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the series has no periods
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at a period
    pub fn get(&self, period: Period) -> Option<f64> {
        self.periods
            .binary_search(&period)
            .ok()
            .map(|idx| self.values[idx])
    }

    /// Last period and value
    pub fn last(&self) -> Option<(Period, f64)> {
        Some((*self.periods.last()?, *self.values.last()?))
    }

    /// Iterate over `(period, value)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (Period, f64)> + '_ {
        self.periods.iter().copied().zip(self.values.iter().copied())
    }
}
