use approx::assert_relative_eq;
use indexmap::IndexMap;
use pretty_assertions::assert_eq;
use scenario_forecast::models::{ArdlModel, DistributedLag};
use scenario_forecast::{
    FittedModel, ForecastError, ForecastSession, ModelMetadata, ModelSet, Result, ScenarioSpec,
    SessionCaches, SessionSources, TimeSeriesTable,
};
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::NamedTempFile;

const X_VARS: [&str; 4] = ["gdp_real", "unemployment", "tariff_index", "dummy_2014"];

// Helper function to create a five-year history ending in 2024
fn create_history() -> TimeSeriesTable {
    let mut columns = IndexMap::new();
    columns.insert(
        "income_tax".to_string(),
        vec![50.0_f64.ln(), 52.0_f64.ln(), 55.0_f64.ln(), 58.0_f64.ln(), 60.0_f64.ln()],
    );
    columns.insert(
        "sales_tax".to_string(),
        vec![30.0_f64.ln(), 33.0_f64.ln(), 35.0_f64.ln(), 38.0_f64.ln(), 40.0_f64.ln()],
    );
    columns.insert("gdp_real".to_string(), vec![9.8, 9.85, 9.9, 9.95, 10.0]);
    columns.insert("unemployment".to_string(), vec![5.8, 6.0, 6.2, 6.1, 6.3]);
    columns.insert("tariff_index".to_string(), vec![1.2, 1.3, 1.4, 1.5, 1.6]);
    columns.insert("dummy_2014".to_string(), vec![1.0; 5]);
    TimeSeriesTable::new(vec![2020, 2021, 2022, 2023, 2024], columns).unwrap()
}

// Grows its target by 10% a year regardless of drivers
fn ten_percent_model(last_level: f64) -> ArdlModel {
    ArdlModel::new(
        1.1_f64.ln(),
        vec![1.0],
        X_VARS
            .iter()
            .map(|name| DistributedLag {
                variable: name.to_string(),
                coefficients: vec![0.0],
            })
            .collect(),
        vec![last_level.ln()],
        IndexMap::new(),
    )
}

#[derive(Debug)]
struct FailingModel {
    names: Vec<String>,
}

impl FittedModel for FailingModel {
    fn forecast(&self, _steps: usize, _exog: &TimeSeriesTable) -> Result<Vec<f64>> {
        Err(ForecastError::NumericalFailure("singular design matrix".to_string()))
    }

    fn exog_names(&self) -> &[String] {
        &self.names
    }
}

#[derive(Debug)]
struct CountingModel {
    names: Vec<String>,
    calls: Arc<AtomicUsize>,
}

impl FittedModel for CountingModel {
    fn forecast(&self, steps: usize, _exog: &TimeSeriesTable) -> Result<Vec<f64>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![0.0; steps])
    }

    fn exog_names(&self) -> &[String] {
        &self.names
    }
}

fn x_vars() -> Vec<String> {
    X_VARS.iter().map(|name| name.to_string()).collect()
}

fn metadata() -> Arc<ModelMetadata> {
    Arc::new(ModelMetadata::new(x_vars()).unwrap())
}

fn create_session() -> ForecastSession {
    let mut models: ModelSet = IndexMap::new();
    models.insert("income_tax".to_string(), Arc::new(ten_percent_model(60.0)));
    models.insert("sales_tax".to_string(), Arc::new(ten_percent_model(40.0)));
    ForecastSession::new(metadata(), models, Arc::new(create_history())).unwrap()
}

fn create_scenario() -> ScenarioSpec {
    ScenarioSpec::builder()
        .growth("gdp_real", 0.03)
        .level("unemployment", 0.065)
        .level("tariff_index", 1.7)
        .fixed("dummy_2014", 1.0)
        .build()
        .unwrap()
}

#[test]
fn test_full_forecast_workflow() {
    let session = create_session();
    let run = session.run(&create_scenario(), 3).unwrap();

    assert!(run.is_complete());
    assert_eq!(run.horizon(), 3);
    assert_eq!(run.future_periods(), &[2025, 2026, 2027]);
    assert_eq!(
        run.exog_path().column_names().collect::<Vec<_>>(),
        X_VARS.to_vec()
    );

    // Totals: 60 + 40 = 100 in 2024, 10% a year afterwards
    let (last_hist_period, last_hist) = run.total_historical().last().unwrap();
    assert_eq!(last_hist_period, 2024);
    assert_relative_eq!(last_hist, 100.0, max_relative = 1e-12);

    let (last_period, last_total) = run.total_forecast().last().unwrap();
    assert_eq!(last_period, 2027);
    assert_relative_eq!(last_total, 133.1, max_relative = 1e-9);

    assert_relative_eq!(run.growth_pct().unwrap(), 33.1, epsilon = 1e-6);
    assert_relative_eq!(run.cagr_pct().unwrap(), 10.0, epsilon = 1e-6);
    assert_relative_eq!(run.target_growth("sales_tax").unwrap(), 33.1, epsilon = 1e-6);

    let ranking = run.ranking().unwrap();
    assert_eq!(ranking.len(), 2);
    assert_eq!(ranking[0].target, "income_tax");
    assert_relative_eq!(ranking[0].forecast, 79.86, max_relative = 1e-9);
    assert_relative_eq!(ranking[1].base, 40.0, max_relative = 1e-12);
}

#[test]
fn test_growth_compounding_is_exact() {
    let run = create_session().run(&create_scenario(), 7).unwrap();
    let gdp = run.exog_path().column("gdp_real").unwrap();

    for (n, value) in gdp.iter().enumerate() {
        let steps = (n + 1) as f64;
        assert_relative_eq!(*value, 10.0 + steps * 1.03_f64.ln(), epsilon = 1e-12);
    }
}

#[test]
fn test_fixed_and_level_rules() {
    let run = create_session().run(&create_scenario(), 4).unwrap();
    let path = run.exog_path();

    // Fixed indicator pinned in every period
    assert_eq!(path.column("dummy_2014").unwrap(), &[1.0; 4]);

    // Rate-scaled level converted to percentage points
    for value in path.column("unemployment").unwrap() {
        assert_relative_eq!(*value, 6.5, epsilon = 1e-12);
    }

    // Other level variables keep the raw value
    assert_eq!(path.column("tariff_index").unwrap(), &[1.7; 4]);
}

#[test]
fn test_failed_target_is_isolated() {
    let mut models: ModelSet = IndexMap::new();
    models.insert("income_tax".to_string(), Arc::new(FailingModel { names: x_vars() }));
    models.insert("sales_tax".to_string(), Arc::new(ten_percent_model(40.0)));
    let session = ForecastSession::new(metadata(), models, Arc::new(create_history())).unwrap();

    let run = session.run(&create_scenario(), 3).unwrap();

    assert!(!run.is_complete());
    assert_eq!(run.missing_targets(), vec!["income_tax"]);
    assert!(run.forecasts().contains_key("sales_tax"));
    assert!(!run.forecasts().contains_key("income_tax"));

    match &run.failures()[0] {
        ForecastError::ForecastFailure { target, source } => {
            assert_eq!(target, "income_tax");
            assert!(matches!(**source, ForecastError::NumericalFailure(_)));
        }
        other => panic!("Expected ForecastFailure, got {:?}", other),
    }

    // Totals cover the surviving target only, on both sides
    assert_relative_eq!(run.total_historical().last().unwrap().1, 40.0, max_relative = 1e-12);
    assert_relative_eq!(run.cagr_pct().unwrap(), 10.0, epsilon = 1e-6);
}

#[test]
fn test_target_without_history_is_isolated() {
    let mut models: ModelSet = IndexMap::new();
    models.insert("excise_duty".to_string(), Arc::new(ten_percent_model(10.0)));
    models.insert("sales_tax".to_string(), Arc::new(ten_percent_model(40.0)));
    let session = ForecastSession::new(metadata(), models, Arc::new(create_history())).unwrap();

    let run = session.run(&create_scenario(), 2).unwrap();
    assert_eq!(run.missing_targets(), vec!["excise_duty"]);
    assert_eq!(run.historical().keys().collect::<Vec<_>>(), vec!["sales_tax"]);
}

#[test]
fn test_zero_horizon_is_rejected() {
    let err = create_session().run(&create_scenario(), 0).unwrap_err();
    assert!(matches!(err, ForecastError::InvalidHorizon(0)));
}

#[test]
fn test_incomplete_scenario_fails_before_any_model_call() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut models: ModelSet = IndexMap::new();
    models.insert(
        "income_tax".to_string(),
        Arc::new(CountingModel {
            names: x_vars(),
            calls: Arc::clone(&calls),
        }),
    );
    let session = ForecastSession::new(metadata(), models, Arc::new(create_history())).unwrap();

    let scenario = ScenarioSpec::builder()
        .growth("gdp_real", 0.03)
        .level("unemployment", 0.065)
        .fixed("dummy_2014", 1.0)
        .build()
        .unwrap();

    let err = session.run(&scenario, 3).unwrap_err();
    assert!(matches!(
        err,
        ForecastError::MissingScenarioVariable { ref variable } if variable == "tariff_index"
    ));
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    // The complete scenario does reach the model
    session.run(&create_scenario(), 3).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

fn history_with_consumption() -> TimeSeriesTable {
    let base = create_history();
    let mut columns: IndexMap<String, Vec<f64>> = base
        .column_names()
        .map(|name| (name.to_string(), base.column(name).unwrap().to_vec()))
        .collect();
    columns.insert("consumption_real".to_string(), vec![8.0, 8.1, 8.2, 8.3, 8.4]);
    TimeSeriesTable::new(base.periods().to_vec(), columns).unwrap()
}

// Model reading a driver that metadata does not list
fn consumption_session() -> ForecastSession {
    let model = ArdlModel::new(
        0.0,
        Vec::new(),
        vec![
            DistributedLag {
                variable: "gdp_real".to_string(),
                coefficients: vec![0.0],
            },
            DistributedLag {
                variable: "consumption_real".to_string(),
                coefficients: vec![1.0],
            },
        ],
        Vec::new(),
        IndexMap::new(),
    );
    let mut models: ModelSet = IndexMap::new();
    models.insert("income_tax".to_string(), Arc::new(model));
    let metadata = Arc::new(ModelMetadata::new(vec!["gdp_real".to_string()]).unwrap());
    ForecastSession::new(metadata, models, Arc::new(history_with_consumption())).unwrap()
}

#[test]
fn test_scenario_must_cover_every_model_driver() {
    let session = consumption_session();
    assert_eq!(session.required_variables(), &["gdp_real", "consumption_real"]);

    let scenario = ScenarioSpec::builder().growth("gdp_real", 0.03).build().unwrap();
    let err = session.run(&scenario, 2).unwrap_err();
    assert!(matches!(
        err,
        ForecastError::MissingScenarioVariable { ref variable } if variable == "consumption_real"
    ));
}

#[test]
fn test_model_driver_outside_metadata_list_is_forecast() {
    let session = consumption_session();
    let scenario = ScenarioSpec::builder()
        .growth("gdp_real", 0.03)
        .growth("consumption_real", 0.0)
        .build()
        .unwrap();

    let run = session.run(&scenario, 2).unwrap();
    assert!(run.is_complete());
    assert_eq!(
        run.exog_path().column_names().collect::<Vec<_>>(),
        vec!["gdp_real", "consumption_real"]
    );
    for value in run.forecasts()["income_tax"].values() {
        assert_relative_eq!(*value, 8.4_f64.exp(), max_relative = 1e-12);
    }
}

#[test]
fn test_cutoff_and_default_scenario() {
    let session = create_session().with_cutoff(2023).unwrap();
    assert!(session.fit_statistics().is_empty());
    assert_eq!(session.history().last_period(), Some(2023));

    let scenario = session.default_scenario().unwrap();
    assert_eq!(scenario.len(), X_VARS.len());

    let run = session.run(&scenario, 2).unwrap();
    assert_eq!(run.future_periods(), &[2024, 2025]);

    assert!(create_session().with_cutoff(1990).is_err());
}

#[test]
fn test_session_loads_through_caches() {
    let mut meta_file = NamedTempFile::new().unwrap();
    write!(
        meta_file,
        r#"{{"x_vars_used": ["gdp_real", "dummy_2014"], "targets": ["sales_tax", "income_tax"]}}"#
    )
    .unwrap();

    let mut model_file = NamedTempFile::new().unwrap();
    let model_json = |intercept: f64| {
        format!(
            r#"{{"intercept": {}, "exog": [
                {{"variable": "gdp_real", "coefficients": [0.0]}},
                {{"variable": "dummy_2014", "coefficients": [0.0]}}
            ]}}"#,
            intercept
        )
    };
    write!(
        model_file,
        r#"{{"models": {{"income_tax": {}, "sales_tax": {}}}}}"#,
        model_json(4.0),
        model_json(3.0).replacen('{', r#"{"rsquared": 0.95, "aic": -12.5, "#, 1)
    )
    .unwrap();

    let mut data_file = NamedTempFile::new().unwrap();
    writeln!(data_file, "year,income_tax,sales_tax,gdp_real,dummy_2014").unwrap();
    writeln!(data_file, "2023,3.9,2.9,9.95,1").unwrap();
    writeln!(data_file, "2024,4.0,3.0,10.0,1").unwrap();

    let sources = SessionSources {
        models: model_file.path().to_path_buf(),
        metadata: meta_file.path().to_path_buf(),
        history: data_file.path().to_path_buf(),
    };
    let caches = SessionCaches::default();

    let session = ForecastSession::load(&sources, &caches).unwrap();
    assert_eq!(session.targets().collect::<Vec<_>>(), vec!["sales_tax", "income_tax"]);

    let diagnostics = session.fit_statistics();
    assert_eq!(diagnostics.keys().copied().collect::<Vec<_>>(), vec!["sales_tax"]);
    assert_eq!(diagnostics["sales_tax"].rsquared, Some(0.95));
    assert_eq!(diagnostics["sales_tax"].bic, None);

    let again = ForecastSession::load(&sources, &caches).unwrap();
    assert_eq!(caches.models.len(), 1);
    assert_eq!(caches.metadata.len(), 1);
    assert_eq!(caches.history.len(), 1);
    assert!(std::ptr::eq(session.history(), again.history()));

    let run = session.run(&session.default_scenario().unwrap(), 2).unwrap();
    assert_relative_eq!(run.growth_pct().unwrap(), 0.0, epsilon = 1e-9);
}

#[test]
fn test_missing_metadata_list_is_fatal() {
    let mut meta_file = NamedTempFile::new().unwrap();
    write!(meta_file, r#"{{"targets": ["income_tax"]}}"#).unwrap();

    let caches = SessionCaches::default();
    let sources = SessionSources {
        models: meta_file.path().to_path_buf(),
        metadata: meta_file.path().to_path_buf(),
        history: meta_file.path().to_path_buf(),
    };

    let err = ForecastSession::load(&sources, &caches).unwrap_err();
    assert!(matches!(err, ForecastError::MissingConfiguration(_)));
}
