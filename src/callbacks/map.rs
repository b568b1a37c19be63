use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use tracing::debug;

use crate::callbacks::mean_present;
use crate::charts::figure::Text;
use crate::charts::palette::viridis;
use crate::charts::{Figure, RegionFill, Trace, Values};
use crate::error::{DashboardError, Result};
use crate::models::{Measure, StateBoundaries, UvDataset};

pub const GEOJSON_ROUTE: &str = "/api/geojson";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MapRequest {
    pub parameter: Option<String>,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
    /// Slider position, seconds since the Unix epoch
    pub slider: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MapResponse {
    pub figure: Figure,
    pub date: Option<NaiveDate>,
    pub regions: Vec<RegionFill>,
    /// State names in the data that no boundary feature carries
    pub unmatched: Vec<String>,
}

fn map_parameter(requested: Option<&str>) -> Result<Measure> {
    let measure = match requested {
        Some(label) if !label.trim().is_empty() => Measure::parse(label)?,
        _ => Measure::ClearSkyUvi,
    };
    if !Measure::MAP_PARAMETERS.contains(&measure) {
        return Err(DashboardError::unknown("map parameter", measure.label()));
    }
    Ok(measure)
}

/// The dropdown date wins when it is a real calendar date present in the
/// data; otherwise the slider position is used.
pub fn resolve_map_date(dataset: &UvDataset, request: &MapRequest) -> Option<NaiveDate> {
    let year = request
        .year
        .or_else(|| dataset.years().last().copied());
    let dropdown = year.and_then(|y| {
        NaiveDate::from_ymd_opt(y, request.month.unwrap_or(1), request.day.unwrap_or(1))
    });

    match dropdown {
        Some(date) if dataset.contains_date(date) => Some(date),
        _ => match request.slider {
            Some(secs) => DateTime::from_timestamp(secs, 0).map(|dt| dt.date_naive()),
            None => dataset.date_range().map(|(min, _)| min),
        },
    }
}

/// Constant across redraws so the user's map view survives control changes.
pub const MAP_UI_REVISION: &str = "uv-map";

/// Choropleth of the per-state mean of one parameter on one date.
pub fn update_map(
    dataset: &UvDataset,
    boundaries: &StateBoundaries,
    request: &MapRequest,
) -> Result<MapResponse> {
    let parameter = map_parameter(request.parameter.as_deref())?;
    let date = resolve_map_date(dataset, request);

    let rows = date.map(|d| dataset.on_date(d)).unwrap_or_default();
    let Some(date) = date.filter(|_| !rows.is_empty()) else {
        return Ok(MapResponse {
            figure: Figure::placeholder("No data available for the selected date."),
            date,
            regions: Vec::new(),
            unmatched: Vec::new(),
        });
    };

    let mut by_state: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for row in &rows {
        by_state
            .entry(row.name.as_str())
            .or_default()
            .push(row.value(parameter));
    }
    let averages: Vec<(String, f64)> = by_state
        .into_iter()
        .map(|(name, values)| (name.to_string(), mean_present(values.into_iter())))
        .collect();

    let names: Vec<String> = averages.iter().map(|(n, _)| n.clone()).collect();
    let unmatched = boundaries.unmatched(&names);

    let matched_values = averages
        .iter()
        .filter(|(n, v)| boundaries.contains(n) && v.is_finite())
        .map(|(_, v)| *v);
    let min = matched_values.clone().fold(f64::INFINITY, f64::min);
    let max = matched_values.fold(f64::NEG_INFINITY, f64::max);

    let regions: Vec<RegionFill> = averages
        .iter()
        .map(|(name, value)| RegionFill {
            name: name.clone(),
            value: *value,
            fill: if boundaries.contains(name) {
                viridis(*value, min, max)
            } else {
                None
            },
        })
        .collect();

    debug!(
        %date,
        parameter = parameter.label(),
        regions = regions.len(),
        unmatched = unmatched.len(),
        "Built state map"
    );

    let mut figure = Figure::new(format!("{} on {}", parameter, date.format("%Y-%m-%d")))
        .with_trace(Trace::Choropleth {
            geojson: GEOJSON_ROUTE.to_string(),
            featureidkey: "properties.name",
            locations: names,
            z: averages.iter().map(|(_, v)| *v).collect(),
            colorscale: "Viridis",
            colorbar: Text::new(parameter.label()),
        });
    figure.layout.geo = Some(json!({"scope": "usa", "fitbounds": "locations"}));
    figure.layout.uirevision = Some(MAP_UI_REVISION);

    Ok(MapResponse {
        figure,
        date: Some(date),
        regions,
        unmatched,
    })
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StateChartsRequest {
    /// The clicked map location; absent until a state is clicked
    pub state: Option<String>,
    pub parameter: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StateCharts {
    pub monthly: Figure,
    pub daily: Figure,
}

/// Monthly-average bar chart and daily line chart for a clicked state.
pub fn update_state_charts(dataset: &UvDataset, request: &StateChartsRequest) -> Result<StateCharts> {
    let parameter = map_parameter(request.parameter.as_deref())?;

    let Some(state) = request.state.as_deref().filter(|s| !s.is_empty()) else {
        return Ok(StateCharts {
            monthly: Figure::placeholder("No state selected"),
            daily: Figure::placeholder("No state selected"),
        });
    };

    let rows = dataset.for_state(state);
    if rows.is_empty() {
        return Ok(StateCharts {
            monthly: Figure::placeholder("No data available"),
            daily: Figure::placeholder("No data available"),
        });
    }

    let mut by_month: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    for row in &rows {
        by_month.entry(row.month()).or_default().push(row.value(parameter));
    }
    let months: Vec<f64> = by_month.keys().map(|m| *m as f64).collect();
    let means: Vec<f64> = by_month
        .into_values()
        .map(|values| mean_present(values.into_iter()))
        .collect();

    let monthly = Figure::new(format!("Monthly Average {} for {}", parameter, state))
        .with_trace(Trace::bar(parameter.label(), Values::Numbers(months), means))
        .with_axes("Month", parameter.label());

    let dates: Vec<NaiveDate> = rows.iter().map(|r| r.date).collect();
    let daily = Figure::new(format!("Daily {} for {}", parameter, state))
        .with_trace(Trace::lines(
            parameter.label(),
            Values::dates(&dates),
            rows.iter().map(|r| r.value(parameter)).collect(),
        ))
        .with_axes("Date", parameter.label());

    Ok(StateCharts { monthly, daily })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callbacks::fixtures::{boundaries, dataset, start};
    use chrono::Days;

    fn request_for(date: NaiveDate) -> MapRequest {
        use chrono::Datelike;
        MapRequest {
            parameter: Some("Clear Sky UVI".into()),
            year: Some(date.year()),
            month: Some(date.month()),
            day: Some(date.day()),
            slider: None,
        }
    }

    #[test]
    fn test_mismatched_name_has_no_fill() {
        let response = update_map(&dataset(), &boundaries(), &request_for(start())).unwrap();

        assert_eq!(response.unmatched, vec!["Texsa".to_string()]);
        assert_eq!(response.regions.len(), 3);
        for region in &response.regions {
            if region.name == "Texsa" {
                assert!(region.fill.is_none());
            } else {
                assert!(region.fill.is_some(), "{} should be shaded", region.name);
            }
        }
        assert_eq!(response.figure.title(), "Clear Sky UVI on 2023-01-01");
    }

    #[test]
    fn test_map_view_survives_redraw() {
        let ds = dataset();
        let first = update_map(&ds, &boundaries(), &request_for(start())).unwrap();
        let later = update_map(&ds, &boundaries(), &request_for(start() + Days::new(3))).unwrap();

        let layout = serde_json::to_value(&first.figure.layout).unwrap();
        assert_eq!(layout["uirevision"], "uv-map");
        assert_eq!(first.figure.layout.uirevision, later.figure.layout.uirevision);

        let placeholder = Figure::placeholder("none");
        let layout = serde_json::to_value(&placeholder.layout).unwrap();
        assert!(layout.get("uirevision").is_none());
    }

    #[test]
    fn test_dropdown_date_falls_back_to_slider() {
        let ds = dataset();
        let slider_day = start() + Days::new(10);
        let slider = slider_day.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp();

        // February 30th is not a date; 2019 is not in the data
        for (year, month, day) in [(2023, 2, 30), (2019, 1, 1)] {
            let request = MapRequest {
                parameter: None,
                year: Some(year),
                month: Some(month),
                day: Some(day),
                slider: Some(slider),
            };
            assert_eq!(resolve_map_date(&ds, &request), Some(slider_day));
        }
    }

    #[test]
    fn test_date_without_rows_is_placeholder() {
        let request = MapRequest {
            slider: Some(0),
            year: Some(1999),
            ..MapRequest::default()
        };
        let response = update_map(&dataset(), &boundaries(), &request).unwrap();
        assert!(response.figure.is_placeholder());
        assert_eq!(response.figure.title(), "No data available for the selected date.");
    }

    #[test]
    fn test_rejects_non_map_parameter() {
        let request = MapRequest {
            parameter: Some("Solar Zenith Angle".into()),
            ..MapRequest::default()
        };
        assert!(update_map(&dataset(), &boundaries(), &request).is_err());
    }

    #[test]
    fn test_state_charts() {
        let ds = dataset();
        let none = update_state_charts(&ds, &StateChartsRequest::default()).unwrap();
        assert_eq!(none.monthly.title(), "No state selected");

        let unknown = update_state_charts(
            &ds,
            &StateChartsRequest {
                state: Some("Atlantis".into()),
                parameter: None,
            },
        )
        .unwrap();
        assert_eq!(unknown.daily.title(), "No data available");

        let ohio = update_state_charts(
            &ds,
            &StateChartsRequest {
                state: Some("Ohio".into()),
                parameter: Some("Total Column Ozone".into()),
            },
        )
        .unwrap();
        assert_eq!(ohio.monthly.title(), "Monthly Average Total Column Ozone for Ohio");
        match &ohio.monthly.data[0] {
            Trace::Bar { x, y, .. } => {
                assert_eq!(x, &Values::Numbers(vec![1.0, 2.0, 3.0]));
                assert!(y.iter().all(|v| *v == 320.0));
            }
            other => panic!("unexpected trace {other:?}"),
        }
    }
}
