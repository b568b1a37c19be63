//! HTTP surface: page routes, JSON event endpoints and the boundary
//! document.

pub mod handlers;
pub mod pages;
pub mod state;

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tracing::info;

use crate::callbacks::map::GEOJSON_ROUTE;
use crate::error::Result;
pub use state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::home))
        .route("/uv-visualization", get(handlers::uv_visualization))
        .route("/dynamic-calculations", get(handlers::dynamic_calculations))
        .route("/forecasting", get(handlers::forecasting))
        .route("/derived-factors", get(handlers::derived_factors))
        .route(GEOJSON_ROUTE, get(handlers::geojson))
        .route("/api/options", get(handlers::options))
        .route("/api/map", get(handlers::map))
        .route("/api/state-charts", get(handlers::state_charts))
        .route("/api/regression", get(handlers::regression))
        .route("/api/derived", get(handlers::derived))
        .route("/api/forecast", get(handlers::forecast))
        .route("/api/forecast/insights", get(handlers::insights))
        .route("/api/skin-risk", get(handlers::skin_risk))
        .route("/api/med", get(handlers::med))
        .route("/api/ten-day", get(handlers::ten_day))
        // Unknown paths render the home page
        .fallback(handlers::home)
        .with_state(state)
}

pub async fn serve(state: AppState) -> Result<()> {
    let address = state.settings.bind_address();
    let app = router(state);

    let listener = TcpListener::bind(&address).await?;
    info!("Listening on http://{}", address);
    axum::serve(listener, app).await?;
    Ok(())
}
