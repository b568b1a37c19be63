use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use validator::Validate;

use crate::analyzers::{describe_time_to_erythema, time_to_erythema, Forecast, Forecaster};
use crate::callbacks::{mean_present, resolve_state};
use crate::charts::figure::{Line, Text};
use crate::charts::palette::{histogram, risk_gauge};
use crate::charts::{Figure, RiskTableRow, Trace, Values};
use crate::error::{DashboardError, Result};
use crate::models::{Measure, RiskBand, SkinType, UvDataset, UvObservation};
use crate::utils::constants::{DEFAULT_FORECAST_DAYS, HISTOGRAM_BINS, RISK_TABLE_DAYS};

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ForecastRequest {
    pub state: Option<String>,
    /// Comma-separated extra regressors
    pub regressors: Option<String>,
    #[validate(range(max = 3650))]
    pub days: Option<u32>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForecastResponse {
    pub figure: Figure,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForecastInsights {
    pub bounds: Figure,
    pub seasonal: Figure,
    pub distribution: Figure,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct SkinRiskRequest {
    pub location: Option<String>,
    pub date: Option<NaiveDate>,
    #[validate(range(max = 3650))]
    pub days: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkinRiskResponse {
    pub figure: Figure,
    pub text: String,
}

impl SkinRiskResponse {
    fn prompt(text: &str) -> Self {
        Self {
            figure: Figure::empty(),
            text: text.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct MedRequest {
    pub state: Option<String>,
    /// Skin type constant (200, 300, ... 1000)
    pub skin: Option<u32>,
    pub date: Option<NaiveDate>,
    #[validate(range(max = 3650))]
    pub days: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct TenDayRequest {
    pub location: Option<String>,
    pub start: Option<NaiveDate>,
    #[validate(range(max = 3650))]
    pub days: Option<u32>,
}

fn selected(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Comma-separated regressor labels, limited to the forecastable set.
pub(crate) fn parse_regressors(list: Option<&str>) -> Result<Vec<Measure>> {
    let regressors = match list {
        Some(list) => Measure::parse_list(list)?,
        None => Vec::new(),
    };
    if let Some(bad) = regressors
        .iter()
        .find(|m| !Measure::FORECAST_REGRESSORS.contains(m))
    {
        return Err(DashboardError::unknown("forecast regressor", bad.label()));
    }
    Ok(regressors)
}

/// Fit and predict, treating an unfittable history as "no forecast".
fn run_forecast(
    forecaster: &Forecaster,
    rows: &[&UvObservation],
    target: Measure,
    regressors: &[Measure],
    days: Option<u32>,
) -> Result<Option<Forecast>> {
    let periods = days.unwrap_or(DEFAULT_FORECAST_DAYS);
    match forecaster.forecast(rows, target, regressors, periods) {
        Ok(forecast) => {
            debug!(
                target = target.label(),
                rows = rows.len(),
                points = forecast.points.len(),
                "Forecast computed"
            );
            Ok(Some(forecast))
        }
        Err(DashboardError::ModelFit(reason)) => {
            warn!(target = target.label(), %reason, "Forecast model could not be fitted");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Cloudy Sky UVI forecast curve for a state, plus the value on one date.
pub fn forecast_uv_index(
    dataset: &UvDataset,
    forecaster: &Forecaster,
    request: &ForecastRequest,
) -> Result<ForecastResponse> {
    request.validate()?;
    let regressors = parse_regressors(request.regressors.as_deref())?;

    let state = resolve_state(dataset, request.state.as_deref()).unwrap_or_default();
    let rows = dataset.for_state(&state);
    let Some(forecast) =
        run_forecast(forecaster, &rows, Measure::CloudySkyUvi, &regressors, request.days)?
    else {
        return Ok(ForecastResponse {
            figure: Figure::placeholder(format!("Not enough data to forecast {}", state)),
            text: "No forecast available for the selected date.".to_string(),
        });
    };

    let dates: Vec<NaiveDate> = forecast.points.iter().map(|p| p.date).collect();
    let history_dates: Vec<NaiveDate> = forecast.history.iter().map(|(d, _)| *d).collect();

    let figure = Figure::new(format!("Forecast for {}", state))
        .with_trace(Trace::markers(
            "Actual",
            Values::dates(&history_dates),
            forecast.history.iter().map(|(_, v)| *v).collect(),
        ))
        .with_trace(Trace::Scatter {
            x: Values::dates(&dates),
            y: forecast.points.iter().map(|p| p.yhat).collect(),
            mode: "lines",
            name: "Forecast".to_string(),
            line: Some(Line {
                color: "blue".to_string(),
            }),
        })
        .with_axes("Date", Measure::CloudySkyUvi.label());

    let text = match request.date {
        Some(date) => match forecast.at(date) {
            Some(point) => format!(
                "Forecasted Cloudy Sky UVI for {}: {:.2}",
                date.format("%Y-%m-%d"),
                point.yhat
            ),
            None => "No forecast available for the selected date.".to_string(),
        },
        None => "Please select a future date to see the forecast.".to_string(),
    };

    Ok(ForecastResponse { figure, text })
}

/// Interval bounds, monthly means and the distribution of one Cloudy Sky
/// UVI forecast.
pub fn analyze_forecast_insights(
    dataset: &UvDataset,
    forecaster: &Forecaster,
    request: &ForecastRequest,
) -> Result<ForecastInsights> {
    request.validate()?;

    let state = resolve_state(dataset, request.state.as_deref()).unwrap_or_default();
    let rows = dataset.for_state(&state);
    let Some(forecast) = run_forecast(forecaster, &rows, Measure::CloudySkyUvi, &[], request.days)?
    else {
        let message = format!("Not enough data to forecast {}", state);
        return Ok(ForecastInsights {
            bounds: Figure::placeholder(message.clone()),
            seasonal: Figure::placeholder(message.clone()),
            distribution: Figure::placeholder(message),
        });
    };

    let dates = Values::dates(&forecast.points.iter().map(|p| p.date).collect::<Vec<_>>());
    let yhat: Vec<f64> = forecast.points.iter().map(|p| p.yhat).collect();

    let bounds = Figure::new("Analysis of Forecasted Factors for Next Days")
        .with_trace(Trace::lines("yhat", dates.clone(), yhat.clone()))
        .with_trace(Trace::lines(
            "yhat_lower",
            dates.clone(),
            forecast.points.iter().map(|p| p.yhat_lower).collect(),
        ))
        .with_trace(Trace::lines(
            "yhat_upper",
            dates,
            forecast.points.iter().map(|p| p.yhat_upper).collect(),
        ))
        .with_axes("Date", "UVI");

    let (months, means): (Vec<f64>, Vec<f64>) = forecast
        .monthly_means()
        .into_iter()
        .map(|(m, v)| (m as f64, v))
        .unzip();
    let seasonal = Figure::new("Monthly Trends in Forecasted Cloudy Sky UVI")
        .with_trace(Trace::bar("Average UVI", Values::Numbers(months), means))
        .with_axes("Month", "Average UVI");

    let (centres, counts) = histogram(&yhat, HISTOGRAM_BINS);
    let distribution = Figure::new("Forecast Distribution")
        .with_trace(Trace::bar("Forecasted UVI", Values::Numbers(centres), counts))
        .with_axes("Forecasted UVI", "Frequency");

    Ok(ForecastInsights {
        bounds,
        seasonal,
        distribution,
    })
}

/// Forecast Clear Sky UVI, scale by the state's mean aerosol transmission,
/// and classify the result on a gauge.
pub fn calculate_skin_risk(
    dataset: &UvDataset,
    forecaster: &Forecaster,
    request: &SkinRiskRequest,
) -> Result<SkinRiskResponse> {
    request.validate()?;

    let (Some(date), Some(location)) = (request.date, selected(request.location.as_deref())) else {
        return Ok(SkinRiskResponse::prompt("Please select a valid date and location."));
    };

    let rows = dataset.for_state(location);
    if rows.is_empty() {
        return Ok(SkinRiskResponse::prompt("No data available for the selected location."));
    }

    let point = run_forecast(forecaster, &rows, Measure::ClearSkyUvi, &[], request.days)?
        .and_then(|f| f.at(date).copied());
    let Some(point) = point else {
        return Ok(SkinRiskResponse::prompt("No forecast available for the selected date."));
    };

    let aerosol = mean_present(rows.iter().map(|r| r.aerosol_transmission));
    let adjusted = point.yhat * (aerosol / 100.0);
    let band = RiskBand::classify(adjusted);
    debug!(%location, %date, adjusted, risk = band.label(), "Skin risk classified");

    let figure = Figure::empty().with_trace(Trace::Indicator {
        mode: "gauge+number",
        value: adjusted,
        title: Text::new("Adjusted UV Index"),
        gauge: risk_gauge(adjusted),
    });

    Ok(SkinRiskResponse {
        figure,
        text: format!("Risk Level: {}. {}", band, band.advisory()),
    })
}

/// Time to erythema for a skin type under the forecast Clear Sky UVI.
pub fn calculate_med(
    dataset: &UvDataset,
    forecaster: &Forecaster,
    request: &MedRequest,
) -> Result<String> {
    request.validate()?;

    let (Some(date), Some(state)) = (request.date, selected(request.state.as_deref())) else {
        return Ok("Please select a state and a date for MED calculation.".to_string());
    };
    let skin = match request.skin {
        Some(constant) => SkinType::from_constant(constant)?,
        None => SkinType::default(),
    };

    let rows = dataset.for_state(state);
    if rows.is_empty() {
        return Ok("No data available for the selected state.".to_string());
    }

    let point = run_forecast(forecaster, &rows, Measure::ClearSkyUvi, &[], request.days)?
        .and_then(|f| f.at(date).copied());
    match point {
        Some(point) => Ok(describe_time_to_erythema(time_to_erythema(skin, point.yhat))),
        None => Ok("No forecast available for the selected date.".to_string()),
    }
}

/// Risk table for the first ten forecast days on or after `start`.
pub fn generate_ten_day_forecast(
    dataset: &UvDataset,
    forecaster: &Forecaster,
    request: &TenDayRequest,
) -> Result<Vec<RiskTableRow>> {
    request.validate()?;

    let (Some(start), Some(location)) = (request.start, selected(request.location.as_deref())) else {
        return Ok(Vec::new());
    };
    let rows = dataset.for_state(location);
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let table = run_forecast(forecaster, &rows, Measure::ClearSkyUvi, &[], request.days)?
        .map(|forecast| {
            forecast
                .window(start, RISK_TABLE_DAYS)
                .iter()
                .map(RiskTableRow::from_point)
                .collect()
        })
        .unwrap_or_default();
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callbacks::fixtures::{dataset, start};
    use chrono::Days;
    use pretty_assertions::assert_eq;

    /// Thirty days of a flat Clear Sky UVI for one state.
    fn flat(clear: f64, aerosol: f64) -> UvDataset {
        let rows = (0..30u64)
            .map(|i| {
                UvObservation::new(
                    "Utah".into(),
                    start() + Days::new(i),
                    clear,
                    clear * 0.8,
                    70.0,
                    aerosol,
                    30.0,
                    300.0,
                )
            })
            .collect();
        UvDataset::new(rows)
    }

    #[test]
    fn test_forecast_text_for_dates() {
        let ds = dataset();
        let forecaster = Forecaster::new();
        let mut request = ForecastRequest {
            state: Some("Texas".into()),
            regressors: Some("Clear Sky UVI".into()),
            days: Some(30),
            date: Some(NaiveDate::from_ymd_opt(2023, 3, 10).unwrap()),
        };

        let response = forecast_uv_index(&ds, &forecaster, &request).unwrap();
        assert_eq!(response.figure.title(), "Forecast for Texas");
        assert_eq!(response.figure.data.len(), 2);
        assert!(response
            .text
            .starts_with("Forecasted Cloudy Sky UVI for 2023-03-10: "));

        request.date = Some(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        let response = forecast_uv_index(&ds, &forecaster, &request).unwrap();
        assert_eq!(response.text, "No forecast available for the selected date.");

        request.date = None;
        let response = forecast_uv_index(&ds, &forecaster, &request).unwrap();
        assert_eq!(response.text, "Please select a future date to see the forecast.");
    }

    #[test]
    fn test_forecast_rejects_bad_inputs() {
        let ds = dataset();
        let forecaster = Forecaster::new();

        let too_long = ForecastRequest {
            days: Some(4000),
            ..ForecastRequest::default()
        };
        assert!(forecast_uv_index(&ds, &forecaster, &too_long).is_err());

        let bad_regressor = ForecastRequest {
            regressors: Some("Solar Zenith Angle".into()),
            ..ForecastRequest::default()
        };
        assert!(forecast_uv_index(&ds, &forecaster, &bad_regressor).is_err());
    }

    #[test]
    fn test_parse_regressors_limits_to_forecastable_set() {
        assert_eq!(parse_regressors(None).unwrap(), Vec::<Measure>::new());
        assert_eq!(
            parse_regressors(Some("Total Column Ozone, Clear Sky UVI")).unwrap(),
            vec![Measure::TotalColumnOzone, Measure::ClearSkyUvi]
        );

        let err = parse_regressors(Some("Cloud Transmission")).unwrap_err();
        assert!(matches!(
            err,
            DashboardError::UnknownIdentifier { kind: "forecast regressor", .. }
        ));
        assert!(parse_regressors(Some("Humidity")).is_err());
    }

    #[test]
    fn test_unknown_state_forecast_is_placeholder() {
        let request = ForecastRequest {
            state: Some("Atlantis".into()),
            ..ForecastRequest::default()
        };
        let response = forecast_uv_index(&dataset(), &Forecaster::new(), &request).unwrap();
        assert!(response.figure.is_placeholder());
    }

    #[test]
    fn test_insights_share_one_forecast() {
        let request = ForecastRequest {
            state: Some("Ohio".into()),
            days: Some(30),
            ..ForecastRequest::default()
        };
        let insights = analyze_forecast_insights(&dataset(), &Forecaster::new(), &request).unwrap();

        let names: Vec<Option<&str>> = insights.bounds.data.iter().map(Trace::name).collect();
        assert_eq!(names, vec![Some("yhat"), Some("yhat_lower"), Some("yhat_upper")]);

        match &insights.seasonal.data[0] {
            Trace::Bar { x, .. } => assert_eq!(x, &Values::Numbers(vec![1.0, 2.0, 3.0])),
            other => panic!("unexpected trace {other:?}"),
        }
        match &insights.distribution.data[0] {
            // 60 history days plus 30 forecast days
            Trace::Bar { y, .. } => assert_eq!(y.iter().sum::<f64>(), 90.0),
            other => panic!("unexpected trace {other:?}"),
        }
    }

    #[test]
    fn test_skin_risk_prompts() {
        let ds = dataset();
        let forecaster = Forecaster::new();

        let missing = calculate_skin_risk(&ds, &forecaster, &SkinRiskRequest::default()).unwrap();
        assert_eq!(missing.text, "Please select a valid date and location.");

        let unknown = SkinRiskRequest {
            location: Some("Atlantis".into()),
            date: Some(start()),
            days: None,
        };
        let response = calculate_skin_risk(&ds, &forecaster, &unknown).unwrap();
        assert_eq!(response.text, "No data available for the selected location.");

        let far = SkinRiskRequest {
            location: Some("Texas".into()),
            date: Some(NaiveDate::from_ymd_opt(2030, 1, 1).unwrap()),
            days: Some(5),
        };
        let response = calculate_skin_risk(&ds, &forecaster, &far).unwrap();
        assert_eq!(response.text, "No forecast available for the selected date.");
    }

    #[test]
    fn test_skin_risk_scales_by_aerosol() {
        // 8.0 * 50 / 100 = 4.0
        let request = SkinRiskRequest {
            location: Some("Utah".into()),
            date: Some(start() + Days::new(35)),
            days: Some(10),
        };
        let response = calculate_skin_risk(&flat(8.0, 50.0), &Forecaster::new(), &request).unwrap();

        assert_eq!(
            response.text,
            "Risk Level: Moderate. Use sunscreen SPF 15+, and limit time outdoors."
        );
        match &response.figure.data[0] {
            Trace::Indicator { value, title, .. } => {
                assert!((value - 4.0).abs() < 1e-6);
                assert_eq!(title.text, "Adjusted UV Index");
            }
            other => panic!("unexpected trace {other:?}"),
        }
    }

    #[test]
    fn test_med_from_forecast() {
        let ds = flat(4.0, 90.0);
        let forecaster = Forecaster::new();
        let request = MedRequest {
            state: Some("Utah".into()),
            skin: Some(200),
            date: Some(start() + Days::new(5)),
            days: None,
        };
        assert_eq!(
            calculate_med(&ds, &forecaster, &request).unwrap(),
            "Time to Erythema: 2.00 minutes"
        );

        let prompt = calculate_med(&ds, &forecaster, &MedRequest::default()).unwrap();
        assert_eq!(prompt, "Please select a state and a date for MED calculation.");

        let zero = flat(0.0, 90.0);
        assert_eq!(
            calculate_med(&zero, &forecaster, &request).unwrap(),
            "UV Index is too low for erythema risk."
        );

        let bad_skin = MedRequest {
            skin: Some(250),
            ..request
        };
        assert!(calculate_med(&ds, &forecaster, &bad_skin).is_err());
    }

    #[test]
    fn test_ten_day_table() {
        let ds = dataset();
        let forecaster = Forecaster::new();
        let table_start = NaiveDate::from_ymd_opt(2023, 2, 25).unwrap();
        let request = TenDayRequest {
            location: Some("Texas".into()),
            start: Some(table_start),
            days: Some(30),
        };

        let table = generate_ten_day_forecast(&ds, &forecaster, &request).unwrap();
        assert_eq!(table.len(), 10);
        assert_eq!(table[0].date, "2023-02-25");
        assert_eq!(table[9].date, "2023-03-06");
        for row in &table {
            let band = [
                RiskBand::Low,
                RiskBand::Moderate,
                RiskBand::High,
                RiskBand::VeryHigh,
                RiskBand::Extreme,
            ]
            .into_iter()
            .find(|b| b.label() == row.risk)
            .unwrap();
            assert_eq!(row.recommendations, band.recommendation());
        }

        let none = generate_ten_day_forecast(&ds, &forecaster, &TenDayRequest::default()).unwrap();
        assert!(none.is_empty());
    }
}
