use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, instrument, warn};

use crate::callbacks::{
    analyze_forecast_insights, calculate_derived_factors, calculate_med, calculate_skin_risk,
    forecast_uv_index, generate_ten_day_forecast, perform_regression, update_map,
    update_state_charts, DerivedRequest, ForecastInsights, ForecastRequest, ForecastResponse,
    MapRequest, MapResponse, MedRequest, RegressionRequest, RegressionResponse, SkinRiskRequest,
    SkinRiskResponse, StateCharts, StateChartsRequest, TenDayRequest,
};
use crate::charts::{Figure, RiskTableRow};
use crate::error::{DashboardError, Result};
use crate::server::pages;
use crate::server::state::AppState;

/// A handler failure rendered as a JSON body.
pub struct ApiError(DashboardError);

impl From<DashboardError> for ApiError {
    fn from(e: DashboardError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_client_error() {
            warn!(error = %self.0, "Rejected request");
            StatusCode::BAD_REQUEST
        } else {
            error!(error = %self.0, "Request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

/// Run a model fit off the async reactor.
async fn blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await?
}

pub async fn home() -> Html<String> {
    Html(pages::home())
}

pub async fn uv_visualization(State(state): State<AppState>) -> Html<String> {
    Html(pages::uv_visualization(&state.dataset))
}

pub async fn dynamic_calculations(State(state): State<AppState>) -> Html<String> {
    Html(pages::dynamic_calculations(&state.dataset))
}

pub async fn forecasting(State(state): State<AppState>) -> Html<String> {
    Html(pages::forecasting(&state.dataset, state.settings.forecast.default_days))
}

pub async fn derived_factors(State(state): State<AppState>) -> Html<String> {
    Html(pages::derived_factors(&state.dataset))
}

pub async fn geojson(State(state): State<AppState>) -> Json<Value> {
    Json(state.boundaries.raw().clone())
}

#[derive(Debug, Serialize)]
pub struct DatasetOptions {
    pub states: Vec<String>,
    pub years: Vec<i32>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

pub async fn options(State(state): State<AppState>) -> Json<DatasetOptions> {
    let range = state.dataset.date_range();
    Json(DatasetOptions {
        states: state.dataset.states().to_vec(),
        years: state.dataset.years(),
        start: range.map(|(start, _)| start),
        end: range.map(|(_, end)| end),
    })
}

#[instrument(skip(state))]
pub async fn map(
    State(state): State<AppState>,
    Query(request): Query<MapRequest>,
) -> ApiResult<MapResponse> {
    Ok(Json(update_map(&state.dataset, &state.boundaries, &request)?))
}

#[instrument(skip(state))]
pub async fn state_charts(
    State(state): State<AppState>,
    Query(request): Query<StateChartsRequest>,
) -> ApiResult<StateCharts> {
    Ok(Json(update_state_charts(&state.dataset, &request)?))
}

#[instrument(skip(state))]
pub async fn regression(
    State(state): State<AppState>,
    Query(request): Query<RegressionRequest>,
) -> ApiResult<RegressionResponse> {
    let dataset = state.dataset.clone();
    let response = blocking(move || perform_regression(&dataset, &request)).await?;
    Ok(Json(response))
}

#[instrument(skip(state))]
pub async fn derived(
    State(state): State<AppState>,
    Query(request): Query<DerivedRequest>,
) -> ApiResult<Figure> {
    Ok(Json(calculate_derived_factors(&state.dataset, &request)?))
}

#[instrument(skip(state))]
pub async fn forecast(
    State(state): State<AppState>,
    Query(mut request): Query<ForecastRequest>,
) -> ApiResult<ForecastResponse> {
    request.days = state.forecast_days(request.days);
    let response = blocking(move || {
        forecast_uv_index(&state.dataset, &state.forecaster(), &request)
    })
    .await?;
    Ok(Json(response))
}

#[instrument(skip(state))]
pub async fn insights(
    State(state): State<AppState>,
    Query(mut request): Query<ForecastRequest>,
) -> ApiResult<ForecastInsights> {
    request.days = state.forecast_days(request.days);
    let response = blocking(move || {
        analyze_forecast_insights(&state.dataset, &state.forecaster(), &request)
    })
    .await?;
    Ok(Json(response))
}

#[instrument(skip(state))]
pub async fn skin_risk(
    State(state): State<AppState>,
    Query(mut request): Query<SkinRiskRequest>,
) -> ApiResult<SkinRiskResponse> {
    request.days = state.forecast_days(request.days);
    let response = blocking(move || {
        calculate_skin_risk(&state.dataset, &state.forecaster(), &request)
    })
    .await?;
    Ok(Json(response))
}

#[derive(Debug, Serialize)]
pub struct MedResponse {
    pub text: String,
}

#[instrument(skip(state))]
pub async fn med(
    State(state): State<AppState>,
    Query(mut request): Query<MedRequest>,
) -> ApiResult<MedResponse> {
    request.days = state.forecast_days(request.days);
    let text = blocking(move || calculate_med(&state.dataset, &state.forecaster(), &request)).await?;
    Ok(Json(MedResponse { text }))
}

#[instrument(skip(state))]
pub async fn ten_day(
    State(state): State<AppState>,
    Query(mut request): Query<TenDayRequest>,
) -> ApiResult<Vec<RiskTableRow>> {
    request.days = state.forecast_days(request.days);
    let rows = blocking(move || {
        generate_ten_day_forecast(&state.dataset, &state.forecaster(), &request)
    })
    .await?;
    Ok(Json(rows))
}
