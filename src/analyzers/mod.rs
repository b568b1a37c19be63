pub mod derived_factors;
pub mod feature_selection;
pub mod forecasting;
pub mod med;
pub mod regression;

pub use derived_factors::{DerivedFactor, DerivedFactorCalculator, FactorSeries};
pub use feature_selection::{FeatureSelector, SelectionReport};
pub use forecasting::{Forecast, ForecastPoint, Forecaster};
pub use med::{describe_time_to_erythema, time_to_erythema};
pub use regression::{LinearModel, RegressionAnalyzer, RegressionOutcome};
