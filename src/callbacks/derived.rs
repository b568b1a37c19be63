use chrono::NaiveDate;
use serde::Deserialize;
use tracing::debug;

use crate::analyzers::{DerivedFactor, DerivedFactorCalculator};
use crate::callbacks::resolve_state;
use crate::charts::{Figure, Trace, Values};
use crate::error::Result;
use crate::models::UvDataset;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DerivedRequest {
    /// Times the Calculate button has been pressed
    #[serde(default)]
    pub clicks: u32,
    pub location: Option<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    /// Comma-separated factor ids; absent means the page defaults
    pub factors: Option<String>,
}

const DEFAULT_FACTORS: [DerivedFactor; 2] = [DerivedFactor::DirectDiffuse, DerivedFactor::UvAttenuation];

/// Line chart of the requested derived factors for one location and range.
pub fn calculate_derived_factors(dataset: &UvDataset, request: &DerivedRequest) -> Result<Figure> {
    if request.clicks == 0 {
        return Ok(Figure::empty());
    }

    let factors = match request.factors.as_deref() {
        Some(ids) => DerivedFactor::parse_list(ids)?,
        None => DEFAULT_FACTORS.to_vec(),
    };

    let mut figure = Figure::new("Derived Factor Trends").with_axes("Date", "Values");
    let (Some(location), Some((min, max))) = (
        resolve_state(dataset, request.location.as_deref()),
        dataset.date_range(),
    ) else {
        return Ok(figure);
    };

    let start = request.start.unwrap_or(min);
    let end = request.end.unwrap_or(max);
    let rows = dataset.for_state_between(&location, start, end);
    let series = DerivedFactorCalculator::new().calculate(&rows, &factors);

    debug!(
        %location,
        %start,
        %end,
        rows = rows.len(),
        series = series.len(),
        "Derived factors calculated"
    );

    for s in series {
        figure = figure.with_trace(Trace::lines(s.name, Values::dates(&s.dates), s.values));
    }
    Ok(figure)
}
