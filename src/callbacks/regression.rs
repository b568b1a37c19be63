use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::analyzers::{LinearModel, RegressionAnalyzer};
use crate::callbacks::resolve_state;
use crate::charts::{Figure, Trace, Values};
use crate::error::Result;
use crate::models::{Measure, UvDataset};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegressionRequest {
    pub state: Option<String>,
    /// `regression` (default) or `clustering`
    pub analysis: Option<String>,
    /// Comma-separated measure labels
    pub factors: Option<String>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegressionResponse {
    pub figure: Figure,
    pub text: String,
}

impl RegressionResponse {
    fn placeholder(title: &str, text: &str) -> Self {
        Self {
            figure: Figure::placeholder(title),
            text: text.to_string(),
        }
    }
}

/// Predict Cloudy Sky UVI from the chosen factors for one state.
pub fn perform_regression(dataset: &UvDataset, request: &RegressionRequest) -> Result<RegressionResponse> {
    let analysis = request.analysis.as_deref().unwrap_or("regression");
    if analysis != "regression" {
        return Ok(RegressionResponse::placeholder(
            "Select 'Predict Cloudy Sky UVI' for regression.",
            "",
        ));
    }

    let factors = match request.factors.as_deref() {
        Some(list) => Measure::parse_list(list)?,
        None => vec![Measure::ClearSkyUvi],
    };

    let analyzer = RegressionAnalyzer::new();
    if factors.is_empty() || factors.contains(&analyzer.target()) {
        return Ok(RegressionResponse::placeholder(
            "Please select valid factors (excluding Cloudy Sky UVI).",
            "",
        ));
    }

    let Some(state) = resolve_state(dataset, request.state.as_deref()) else {
        return Ok(RegressionResponse::placeholder(
            "No data available for the selected state and factors.",
            "No data available for the selected date.",
        ));
    };

    let state_rows = dataset.for_state(&state);
    let rows = analyzer.complete_rows(&state_rows, &factors);
    if rows.is_empty() {
        return Ok(RegressionResponse::placeholder(
            "No data available for the selected state and factors.",
            "No data available for the selected date.",
        ));
    }

    let outcome = match analyzer.evaluate(&rows, &factors) {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!(%state, error = %e, "Regression could not be fitted");
            return Ok(RegressionResponse::placeholder(
                &format!("Not enough data to fit a regression for {}.", state),
                "No data available for the selected date.",
            ));
        }
    };
    debug!(%state, r2 = outcome.r2, test_rows = outcome.actual.len(), "Regression evaluated");

    let mut figure = Figure::new(format!(
        "Regression Results for {}: Predicted vs Actual",
        state
    ))
    .with_trace(Trace::markers(
        "Predicted vs Actual",
        Values::Numbers(outcome.actual.clone()),
        outcome.predicted.clone(),
    ))
    .with_axes("Actual Cloudy Sky UVI", "Predicted Cloudy Sky UVI");

    if let Some(trendline) = trendline(&outcome.actual, &outcome.predicted) {
        figure = figure.with_trace(trendline);
    }

    let text = request
        .date
        .and_then(|date| rows.iter().find(|r| r.date == date))
        .map(|row| {
            let actual = row.value(analyzer.target());
            let predicted = outcome
                .model
                .predict_row(&RegressionAnalyzer::feature_row(row, &factors));
            format!("Actual: {:.2}, Predicted: {:.2}", actual, predicted)
        })
        .unwrap_or_else(|| "No data available for the selected date.".to_string());

    Ok(RegressionResponse { figure, text })
}

/// Least-squares line of predicted on actual, drawn across the actual range.
fn trendline(actual: &[f64], predicted: &[f64]) -> Option<Trace> {
    let features: Vec<Vec<f64>> = actual.iter().map(|a| vec![*a]).collect();
    let line = LinearModel::fit(&features, predicted).ok()?;

    let lo = actual.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = actual.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !lo.is_finite() || !hi.is_finite() {
        return None;
    }

    Some(Trace::lines(
        "OLS trendline",
        Values::Numbers(vec![lo, hi]),
        vec![line.predict_row(&[lo]), line.predict_row(&[hi])],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callbacks::fixtures::{dataset, start};

    #[test]
    fn test_clustering_is_placeholder() {
        let request = RegressionRequest {
            analysis: Some("clustering".into()),
            ..RegressionRequest::default()
        };
        let response = perform_regression(&dataset(), &request).unwrap();
        assert_eq!(response.figure.title(), "Select 'Predict Cloudy Sky UVI' for regression.");
        assert_eq!(response.text, "");
    }

    #[test]
    fn test_target_as_factor_is_rejected() {
        let request = RegressionRequest {
            factors: Some("Clear Sky UVI,Cloudy Sky UVI".into()),
            ..RegressionRequest::default()
        };
        let response = perform_regression(&dataset(), &request).unwrap();
        assert_eq!(
            response.figure.title(),
            "Please select valid factors (excluding Cloudy Sky UVI)."
        );
    }

    #[test]
    fn test_unknown_state_reports_no_data() {
        let request = RegressionRequest {
            state: Some("Atlantis".into()),
            ..RegressionRequest::default()
        };
        let response = perform_regression(&dataset(), &request).unwrap();
        assert!(response.figure.is_placeholder());
        assert_eq!(response.text, "No data available for the selected date.");
    }

    #[test]
    fn test_regression_and_selected_date() {
        let request = RegressionRequest {
            state: Some("Texas".into()),
            analysis: None,
            factors: Some("Clear Sky UVI".into()),
            date: Some(start()),
        };
        let response = perform_regression(&dataset(), &request).unwrap();

        assert_eq!(
            response.figure.title(),
            "Regression Results for Texas: Predicted vs Actual"
        );
        assert_eq!(response.figure.data.len(), 2);
        // Cloudy = 0.8 * Clear - 0.8 exactly in the fixture
        assert_eq!(response.text, "Actual: 4.00, Predicted: 4.00");
    }

    #[test]
    fn test_unknown_factor_is_error() {
        let request = RegressionRequest {
            factors: Some("Humidity".into()),
            ..RegressionRequest::default()
        };
        assert!(perform_regression(&dataset(), &request).is_err());
    }
}
