//! UI event handlers.
//!
//! Each function maps the current control values of one page to the payload
//! that page renders. They hold no state between calls: every call filters
//! the shared dataset afresh and refits any model it needs.

pub mod derived;
pub mod forecast;
pub mod map;
pub mod regression;

pub use derived::{calculate_derived_factors, DerivedRequest};
pub use forecast::{
    analyze_forecast_insights, calculate_med, calculate_skin_risk, forecast_uv_index,
    generate_ten_day_forecast, ForecastInsights, ForecastRequest, ForecastResponse, MedRequest,
    SkinRiskRequest, SkinRiskResponse, TenDayRequest,
};
pub use map::{update_map, update_state_charts, MapRequest, MapResponse, StateChartsRequest, StateCharts};
pub use regression::{perform_regression, RegressionRequest, RegressionResponse};

use crate::models::UvDataset;

/// The requested state, or the first state in the dataset.
pub(crate) fn resolve_state(dataset: &UvDataset, requested: Option<&str>) -> Option<String> {
    requested
        .filter(|s| !s.trim().is_empty())
        .or_else(|| dataset.default_state())
        .map(str::to_string)
}

/// Mean of the non-NaN values; NaN when there are none.
pub(crate) fn mean_present(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}
