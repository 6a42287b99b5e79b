//! # Scenario Forecast
//!
//! Scenario-driven revenue forecasting on top of fitted ARDL models.
//!
//! ## Features
//!
//! - Period-indexed historical tables loaded from CSV (via polars)
//! - Scenario assumptions per exogenous driver: fixed, level or growth
//! - Year-by-year projection of the exogenous path from the last observation
//! - Per-target forecasts with failures isolated to the target that failed
//! - Log/level conversion shared by historical and forecast series
//! - Totals, growth and CAGR across the historical/forecast boundary
//! - Artifact cache keyed by file identity
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scenario_forecast::{ForecastSession, ScenarioSpec, SessionCaches, SessionSources};
//!
//! # fn main() -> scenario_forecast::Result<()> {
//! let caches = SessionCaches::default();
//! let session = ForecastSession::load(
//!     &SessionSources {
//!         models: "ardl_tax_models.json".into(),
//!         metadata: "ardl_tax_models_meta.json".into(),
//!         history: "ardl_prepared_data.csv".into(),
//!     },
//!     &caches,
//! )?
//! .with_cutoff(2024)?;
//!
//! let scenario = ScenarioSpec::builder()
//!     .growth("gdp_real", 0.03)
//!     .growth("imports_real", 0.05)
//!     .level("inflation", 0.12)
//!     .level("unemployment", 0.065)
//!     .fixed("dummy_2014", 1.0)
//!     .build()?;
//!
//! let run = session.run(&scenario, 3)?;
//! println!("growth {:.1}%, CAGR {:.2}%", run.growth_pct()?, run.cagr_pct()?);
//! for missing in run.missing_targets() {
//!     println!("no forecast for {}", missing);
//! }
//! # Ok(())
//! # }
//! ```

pub mod aggregation;
pub mod cache;
pub mod config;
pub mod data;
pub mod error;
pub mod export;
pub mod forecaster;
pub mod metadata;
pub mod models;
pub mod projector;
pub mod scenario;
pub mod session;

// Re-export commonly used types
pub use crate::cache::{ArtifactCache, ArtifactKey};
pub use crate::config::RunConfig;
pub use crate::data::{DataLoader, Period, PeriodSeries, TimeSeriesTable};
pub use crate::error::{ForecastError, Result};
pub use crate::metadata::ModelMetadata;
pub use crate::models::{ArdlModel, FitStatistics, FittedModel, ModelArtifact, ModelSet};
pub use crate::projector::{Horizon, PathProjector};
pub use crate::scenario::{ScenarioKind, ScenarioRule, ScenarioSpec, VariableCatalog};
pub use crate::session::{ForecastRun, ForecastSession, SessionCaches, SessionSources};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
