//! # Revenue Outlook
//!
//! `revenue_outlook` bundles the scenario forecasting core with its growth
//! helpers.
//!
//! ## Example
//!
//! ```
//! use approx::assert_relative_eq;
//! use revenue_outlook::prelude::*;
//!
//! let scenario = ScenarioSpec::builder()
//!     .growth("gdp_real", 0.03)
//!     .level("unemployment", 0.065)
//!     .fixed("dummy_2014", 1.0)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(scenario.len(), 3);
//! assert!(scenario.ensure_covers(&["gdp_real", "inflation"]).is_err());
//! assert_relative_eq!(cagr_pct(100.0, 133.1, 3).unwrap(), 10.0, epsilon = 1e-9);
//! ```

pub use growth_math;
pub use scenario_forecast;

/// Types needed for a typical forecast run
pub mod prelude {
    pub use growth_math::{cagr_pct, growth_pct, to_level, to_log};
    pub use scenario_forecast::{
        ForecastError, ForecastRun, ForecastSession, Horizon, ModelMetadata, RunConfig,
        ScenarioKind, ScenarioSpec, SessionCaches, SessionSources, TimeSeriesTable,
        VariableCatalog,
    };
}
