use chrono::{Days, NaiveDate};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use uv_dashboard::analyzers::derived_factors::{ozone_protection_factor, uv_attenuation};
use uv_dashboard::analyzers::{time_to_erythema, FeatureSelector, Forecaster};
use uv_dashboard::callbacks::{
    calculate_derived_factors, generate_ten_day_forecast, perform_regression, update_map,
    DerivedRequest, MapRequest, RegressionRequest, TenDayRequest,
};
use uv_dashboard::config::Settings;
use uv_dashboard::models::{RiskBand, SkinType, StateBoundaries, UvDataset, UvObservation};
use uv_dashboard::readers::{BoundaryReader, ObservationReader};
use uv_dashboard::server::{router, AppState};

const HEADER: &str = "NAME,Date,Clear Sky UVI,Cloudy Sky UVI,Cloud Transmission,Aerosol Transmission,Solar Zenith Angle,Total Column Ozone";

struct Fixture {
    _dir: TempDir,
    csv: PathBuf,
    geojson: PathBuf,
}

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 6, 1).unwrap()
}

/// Forty days for Florida and Maine, one misspelled row and one row with
/// a blank cell.
fn fixture() -> Fixture {
    let dir = TempDir::new().expect("Failed to create temp directory");

    let mut lines = vec![HEADER.to_string()];
    for i in 0..40u64 {
        let date = (start() + Days::new(i)).format("%Y%m%d").to_string();
        let wave = (i % 5) as f64;
        lines.push(format!(
            "Florida,{},{:.1},{:.2},{},90,{},300",
            date,
            8.0 + wave,
            0.75 * (8.0 + wave),
            70.0 + wave,
            25.0 + wave
        ));
        lines.push(format!(
            "Maine,{},{:.1},{:.2},60,85,45,340",
            date,
            4.0 + 0.5 * wave,
            0.6 * (4.0 + 0.5 * wave)
        ));
    }
    lines.push(format!("Flordia,{},9.0,7.0,70,90,25,300", start().format("%Y%m%d")));
    lines.push(format!("Maine,{},,2.0,60,85,45,340", (start() + Days::new(40)).format("%Y%m%d")));

    let csv = dir.path().join("todaysdata.csv");
    fs::write(&csv, lines.join("\n")).unwrap();

    let geojson = dir.path().join("us-states.json");
    fs::write(
        &geojson,
        r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {"name": "Florida"}, "geometry": null},
            {"type": "Feature", "properties": {"name": "Maine"}, "geometry": null},
            {"type": "Feature", "properties": {"name": "Ohio"}, "geometry": null}
        ]}"#,
    )
    .unwrap();

    Fixture {
        _dir: dir,
        csv,
        geojson,
    }
}

fn load(fixture: &Fixture) -> (UvDataset, StateBoundaries) {
    let dataset = ObservationReader::new().read_dataset(&fixture.csv).unwrap();
    let boundaries = BoundaryReader::new().read_boundaries(&fixture.geojson).unwrap();
    (dataset, boundaries)
}

#[test]
fn test_load_fixture_files() {
    let fixture = fixture();
    let (dataset, boundaries) = load(&fixture);

    assert_eq!(dataset.len(), 82);
    assert_eq!(dataset.states(), &["Florida", "Maine", "Flordia"]);
    assert_eq!(boundaries.feature_count(), 3);
    assert_eq!(boundaries.unmatched(dataset.states()), vec!["Flordia".to_string()]);

    let blank = dataset.on_date(start() + Days::new(40));
    assert!(blank[0].clear_sky_uvi.is_nan());
}

#[test]
fn test_choropleth_leaves_mismatched_names_unshaded() {
    let fixture = fixture();
    let (dataset, boundaries) = load(&fixture);

    let request = MapRequest {
        parameter: Some("Clear Sky UVI".into()),
        year: Some(2023),
        month: Some(6),
        day: Some(1),
        slider: None,
    };
    let response = update_map(&dataset, &boundaries, &request).unwrap();

    let fills: Vec<(&str, bool)> = response
        .regions
        .iter()
        .map(|r| (r.name.as_str(), r.fill.is_some()))
        .collect();
    assert_eq!(fills, vec![("Florida", true), ("Flordia", false), ("Maine", true)]);
    assert_eq!(response.unmatched, vec!["Flordia".to_string()]);
}

#[test]
fn test_formula_properties() {
    let obs = UvObservation::new("Texas".into(), start(), 8.0, 6.0, 70.0, 90.0, 30.0, 300.0);
    assert!((uv_attenuation(&obs) - 0.25).abs() < 1e-12);

    // Cloudier than clear sky: negative, not clamped
    let odd = UvObservation::new("Texas".into(), start(), 4.0, 5.0, 70.0, 90.0, 30.0, 300.0);
    assert!((uv_attenuation(&odd) + 0.25).abs() < 1e-12);

    let mut previous = ozone_protection_factor(0.0);
    assert_eq!(previous, 0.0);
    for ozone in (1..600).map(f64::from) {
        let next = ozone_protection_factor(ozone);
        assert!(next > previous || next == previous && next >= 0.999_999);
        assert!((0.0..1.0).contains(&next));
        previous = next;
    }

    let bands: Vec<RiskBand> = [2.0, 5.0, 7.0, 10.0, 10.1]
        .into_iter()
        .map(RiskBand::classify)
        .collect();
    assert_eq!(
        bands,
        vec![
            RiskBand::Low,
            RiskBand::Moderate,
            RiskBand::High,
            RiskBand::VeryHigh,
            RiskBand::Extreme
        ]
    );

    let minutes = time_to_erythema(SkinType::I, 4.0).unwrap();
    assert_eq!(format!("{:.2}", minutes), "2.00");
}

#[test]
fn test_unknown_state_is_empty_not_error() {
    let fixture = fixture();
    let (dataset, _) = load(&fixture);

    assert!(dataset.for_state("Atlantis").is_empty());

    let figure = calculate_derived_factors(
        &dataset,
        &DerivedRequest {
            clicks: 1,
            location: Some("Atlantis".into()),
            ..DerivedRequest::default()
        },
    )
    .unwrap();
    assert!(figure.data.iter().all(|trace| match trace {
        uv_dashboard::charts::Trace::Scatter { y, .. } => y.is_empty(),
        _ => false,
    }));

    let table = generate_ten_day_forecast(
        &dataset,
        &Forecaster::new(),
        &TenDayRequest {
            location: Some("Atlantis".into()),
            start: Some(start()),
            days: None,
        },
    )
    .unwrap();
    assert!(table.is_empty());
}

#[test]
fn test_regression_and_feature_selection() {
    let fixture = fixture();
    let (dataset, _) = load(&fixture);

    let response = perform_regression(
        &dataset,
        &RegressionRequest {
            state: Some("Florida".into()),
            analysis: Some("regression".into()),
            factors: Some("Clear Sky UVI".into()),
            date: Some(start() + Days::new(1)),
        },
    )
    .unwrap();
    // Cloudy is 0.75 * Clear rounded to two places
    assert_eq!(response.text, "Actual: 6.75, Predicted: 6.75");

    let rows = dataset.for_state("Florida");
    let report = FeatureSelector::new().select(&rows).unwrap();
    assert_eq!(report.scores.len(), 31);
    let best = report.best.expect("a perfect predictor exists");
    assert!(best.r2 > 0.999);
}

async fn http_get(address: std::net::SocketAddr, path: &str) -> (u16, String) {
    let mut stream = TcpStream::connect(address).await.unwrap();
    let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut raw = String::new();
    stream.read_to_string(&mut raw).await.unwrap();
    let status = raw
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .unwrap();
    let body = raw.split("\r\n\r\n").nth(1).unwrap_or_default().to_string();
    (status, body)
}

#[tokio::test]
async fn test_router_pages_and_api() {
    let fixture = fixture();
    let (dataset, boundaries) = load(&fixture);
    let state = AppState::new(dataset, boundaries, Settings::default());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });

    let (status, body) = http_get(address, "/no-such-page").await;
    assert_eq!(status, 200);
    assert!(body.contains("UV Index Dashboard"));

    let (status, body) = http_get(address, "/forecasting").await;
    assert_eq!(status, 200);
    assert!(body.contains("toggle-insights-btn"));

    let (status, body) = http_get(address, "/api/geojson").await;
    assert_eq!(status, 200);
    assert!(body.contains("FeatureCollection"));

    let (status, body) = http_get(address, "/api/map?parameter=Total%20Column%20Ozone&year=2023&month=6&day=2").await;
    assert_eq!(status, 200);
    assert!(body.contains("Total Column Ozone on 2023-06-02"));

    let (status, body) = http_get(address, "/api/map?parameter=Humidity").await;
    assert_eq!(status, 400);
    assert!(body.contains("error"));

    let (status, body) = http_get(address, "/api/med?state=Maine&skin=200&date=2023-06-05").await;
    assert_eq!(status, 200);
    assert!(body.contains("Time to Erythema"));
}
