//! Server-rendered page layouts.
//!
//! Each page is static HTML with a small script that reads its controls,
//! calls the matching `/api` endpoint and hands the returned figure to
//! Plotly. Collapsible sections are toggled entirely in the browser.

use chrono::Datelike;

use crate::analyzers::DerivedFactor;
use crate::models::{Measure, SkinType, UvDataset};

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

const STYLE: &str = r#"
body { background: #f8f9fa; font-family: Arial, sans-serif; margin: 0; padding: 20px; }
h1, h3, h4 { text-align: center; color: #343a40; }
nav { text-align: center; margin-bottom: 20px; }
nav a { margin: 0 10px; }
.cards { display: flex; flex-wrap: wrap; justify-content: center; gap: 20px; }
.card { width: 300px; padding: 20px; border: 2px solid #dee2e6; border-radius: 10px;
        background: #fff; box-shadow: 0 4px 8px rgba(0,0,0,0.1); text-align: center; }
.card p { font-size: 14px; color: #6c757d; }
.panel { border: 1px solid black; padding: 10px; margin: 10px; text-align: center; }
.controls label { font-weight: bold; margin: 0 6px; }
.graph { height: 500px; border: 2px solid black; margin: 10px auto; }
.result { text-align: center; margin: 10px; }
.collapse { display: none; }
.collapse.open { display: block; }
table { margin: 10px auto; border-collapse: collapse; }
td, th { border: 1px solid #dee2e6; padding: 4px 10px; }
"#;

/// Shared browser helpers: query the API and draw figures.
const COMMON_JS: &str = r#"
async function api(path, params) {
  const query = new URLSearchParams();
  for (const [k, v] of Object.entries(params)) {
    if (v !== null && v !== undefined && v !== '') query.append(k, v);
  }
  const res = await fetch(path + '?' + query.toString());
  const body = await res.json();
  if (!res.ok) throw new Error(body.error || res.statusText);
  return body;
}
function draw(id, figure) { Plotly.react(id, figure.data, figure.layout); }
function value(id) { const el = document.getElementById(id); return el ? el.value : null; }
function checked(name) {
  return Array.from(document.querySelectorAll('input[name="' + name + '"]:checked'))
    .map(el => el.value).join(',');
}
function selectedList(id) {
  return Array.from(document.getElementById(id).selectedOptions).map(o => o.value).join(',');
}
function setText(id, text) { document.getElementById(id).textContent = text; }
function collapsible(buttonId, sectionId, onOpen) {
  let clicks = 0;
  document.getElementById(buttonId).addEventListener('click', () => {
    clicks += 1;
    const open = clicks % 2 === 1;
    document.getElementById(sectionId).classList.toggle('open', open);
    if (open && onOpen) onOpen();
  });
}
function onChange(ids, handler) {
  ids.forEach(id => document.getElementById(id).addEventListener('change', handler));
}
"#;

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn page(title: &str, body: &str, script: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title} | UV Index Dashboard</title>
<script src="{cdn}"></script>
<style>{style}</style>
</head>
<body>
<nav>
<a href="/">Home</a>
<a href="/uv-visualization">UV Index Visualization</a>
<a href="/dynamic-calculations">Dynamic Calculations</a>
<a href="/forecasting">Forecasting</a>
<a href="/derived-factors">Derived Factors</a>
</nav>
{body}
<script>{common}
{script}</script>
</body>
</html>"#,
        title = escape(title),
        cdn = PLOTLY_CDN,
        style = STYLE,
        body = body,
        common = COMMON_JS,
        script = script,
    )
}

fn select(id: &str, options: &[(String, String)], selected: Option<&str>) -> String {
    let items: String = options
        .iter()
        .map(|(value, label)| {
            let mark = if Some(value.as_str()) == selected { " selected" } else { "" };
            format!(
                r#"<option value="{}"{}>{}</option>"#,
                escape(value),
                mark,
                escape(label)
            )
        })
        .collect();
    format!(r#"<select id="{id}">{items}</select>"#)
}

fn state_options(dataset: &UvDataset) -> Vec<(String, String)> {
    dataset
        .states()
        .iter()
        .map(|s| (s.clone(), s.clone()))
        .collect()
}

fn measure_options(measures: &[Measure]) -> Vec<(String, String)> {
    measures
        .iter()
        .map(|m| (m.label().to_string(), m.label().to_string()))
        .collect()
}

fn numbered(range: std::ops::RangeInclusive<u32>) -> Vec<(String, String)> {
    range.map(|n| (n.to_string(), n.to_string())).collect()
}

fn date_attr(date: Option<chrono::NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default()
}

pub fn home() -> String {
    let cards = [
        (
            "UV Index Visualization",
            "Explore detailed visualizations of UV Index trends and data points.",
            "/uv-visualization",
        ),
        (
            "Dynamic Calculations",
            "Perform dynamic calculations using custom parameters and analyze results.",
            "/dynamic-calculations",
        ),
        (
            "Forecasting",
            "View predictive analysis and forecasts of UV Index levels for future dates.",
            "/forecasting",
        ),
        (
            "Derived Factors Analysis",
            "Analyze and visualize derived factors from UV Index data for deeper insights.",
            "/derived-factors",
        ),
    ];

    let body: String = cards
        .iter()
        .map(|(title, blurb, href)| {
            format!(
                r#"<div class="card"><h3>{title}</h3><p>{blurb}</p><a href="{href}">Go to {title}</a></div>"#
            )
        })
        .collect();

    page(
        "Home",
        &format!(r#"<h1>UV Index Dashboard</h1><div class="cards">{body}</div>"#),
        "",
    )
}

pub fn uv_visualization(dataset: &UvDataset) -> String {
    let years: Vec<(String, String)> = dataset
        .years()
        .iter()
        .map(|y| (y.to_string(), y.to_string()))
        .collect();
    let (min, max) = dataset.date_range().unzip();
    let epoch = |d: Option<chrono::NaiveDate>| {
        d.and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or(0)
    };
    let first_year = min.map(|d| d.year().to_string());

    let body = format!(
        r#"<h1>Interactive UV Index Map</h1>
<div class="panel controls">
<label>Select Parameter:</label>{parameter}
<label>Select Year:</label>{year}
<label>Select Month:</label>{month}
<label>Select Day:</label>{day}
</div>
<div id="uv-map" class="graph"></div>
<div class="panel">
<label>Select Date Range:</label>
<input id="date-slider" type="range" min="{slider_min}" max="{slider_max}" step="86400" value="{slider_min}" style="width: 80%">
<div id="slider-date" class="result"></div>
</div>
<h3>State-Specific Data Visualization</h3>
<div id="state-bar-chart" class="graph"></div>
<div id="state-line-chart" class="graph"></div>"#,
        parameter = select(
            "parameter-dropdown",
            &measure_options(&Measure::MAP_PARAMETERS),
            Some(Measure::ClearSkyUvi.label())
        ),
        year = select("year-dropdown", &years, first_year.as_deref()),
        month = select("month-dropdown", &numbered(1..=12), Some("1")),
        day = select("day-dropdown", &numbered(1..=31), Some("1")),
        slider_min = epoch(min),
        slider_max = epoch(max),
    );

    let script = r#"
let clickedState = null;
async function refreshMap() {
  try {
    const response = await api('/api/map', {
      parameter: value('parameter-dropdown'), year: value('year-dropdown'),
      month: value('month-dropdown'), day: value('day-dropdown'), slider: value('date-slider'),
    });
    setText('slider-date', response.date || '');
    const geojson = await geojsonOnce();
    response.figure.data.forEach(trace => { if (trace.type === 'choropleth') trace.geojson = geojson; });
    draw('uv-map', response.figure);
  } catch (e) { setText('slider-date', e.message); }
}
let boundaryCache = null;
async function geojsonOnce() {
  if (!boundaryCache) boundaryCache = await (await fetch('/api/geojson')).json();
  return boundaryCache;
}
async function refreshStateCharts() {
  const charts = await api('/api/state-charts', { state: clickedState, parameter: value('parameter-dropdown') });
  draw('state-bar-chart', charts.monthly);
  draw('state-line-chart', charts.daily);
}
onChange(['parameter-dropdown', 'year-dropdown', 'month-dropdown', 'day-dropdown', 'date-slider'], () => {
  refreshMap();
  refreshStateCharts();
});
refreshMap().then(() => {
  document.getElementById('uv-map').on('plotly_click', event => {
    clickedState = event.points[0].location;
    refreshStateCharts();
  });
});
refreshStateCharts();
"#;

    page("UV Index Visualization", &body, script)
}

pub fn dynamic_calculations(dataset: &UvDataset) -> String {
    let analysis = vec![
        ("regression".to_string(), "Predict Cloudy Sky UVI".to_string()),
        ("clustering".to_string(), "Clustering".to_string()),
    ];
    let factors: String = Measure::REGRESSION_FACTORS
        .iter()
        .map(|m| {
            let mark = if *m == Measure::ClearSkyUvi { " selected" } else { "" };
            format!(r#"<option value="{0}"{1}>{0}</option>"#, m.label(), mark)
        })
        .collect();
    let last_date = dataset.date_range().map(|(_, max)| max);

    let body = format!(
        r#"<h1>Dynamic Calculations and Machine Learning</h1>
<div class="panel controls">
<label>Select Your State:</label>{state}
<label>Select Analysis Type:</label>{analysis}
<label>Select Factors:</label><select id="factors-dropdown" multiple>{factors}</select>
<label>Select Date:</label><input id="date-picker" type="date" value="{date}">
</div>
<div id="ml-output-graph" class="graph"></div>
<div class="panel"><label>Actual and Predicted Values:</label><div id="actual-predicted-values" class="result"></div></div>"#,
        state = select("state-dropdown", &state_options(dataset), dataset.default_state()),
        analysis = select("analysis-type-dropdown", &analysis, Some("regression")),
        factors = factors,
        date = date_attr(last_date),
    );

    let script = r#"
async function refresh() {
  try {
    const response = await api('/api/regression', {
      state: value('state-dropdown'), analysis: value('analysis-type-dropdown'),
      factors: selectedList('factors-dropdown'), date: value('date-picker'),
    });
    draw('ml-output-graph', response.figure);
    setText('actual-predicted-values', response.text);
  } catch (e) { setText('actual-predicted-values', e.message); }
}
onChange(['state-dropdown', 'analysis-type-dropdown', 'factors-dropdown', 'date-picker'], refresh);
refresh();
"#;

    page("Dynamic Calculations", &body, script)
}

pub fn forecasting(dataset: &UvDataset, default_days: u32) -> String {
    let states = state_options(dataset);
    let first = dataset.default_state();
    let last_date = date_attr(dataset.date_range().map(|(_, max)| max));
    let regressors: String = Measure::FORECAST_REGRESSORS
        .iter()
        .map(|m| {
            format!(
                r#"<label><input type="checkbox" name="regressor" value="{0}"> {0}</label>"#,
                m.label()
            )
        })
        .collect();
    let skins: Vec<(String, String)> = SkinType::ALL
        .iter()
        .map(|s| (s.constant().to_string(), s.label().to_string()))
        .collect();

    let body = format!(
        r#"<h1>UV Index Forecasting</h1>
<div class="panel controls">
<label>Select State:</label>{state}
<label>Additional Regressors:</label>{regressors}
<label>Forecast Days:</label><input id="forecast-days-input" type="number" min="1" max="3650" value="{days}">
<label>Select Future Date:</label><input id="future-date-picker" type="date" value="{date}">
</div>
<div id="forecast-graph" class="graph"></div>
<div id="forecast-value" class="result"></div>

<button id="toggle-insights-btn">Show/Hide Insights</button>
<div id="insights-collapse" class="collapse">
<div id="future-factors-analysis" class="graph"></div>
<div id="seasonal-trends" class="graph"></div>
<div id="distribution-plot" class="graph"></div>
</div>

<button id="toggle-skin-risk-btn">Show/Hide Skin Damage Risk Analysis</button>
<div id="skin-risk-collapse" class="collapse panel">
<label>Select Date:</label><input id="skin-risk-date-picker" type="date" value="{date}">
<label>Select Location:</label>{skin_location}
<div id="skin-risk-gauge" class="graph"></div>
<div id="skin-risk-recommendations" class="result"></div>
<h4>10-Day Skin Damage Risk Forecast</h4>
<label>Start Date:</label><input id="ten-day-forecast-start-date" type="date" value="{date}">
<table id="ten-day-forecast-table"><thead><tr><th>Date</th><th>UV Index</th><th>Risk</th><th>Recommendations</th></tr></thead><tbody></tbody></table>
</div>

<button id="toggle-med-btn">Show/Hide MED Analysis</button>
<div id="med-collapse" class="collapse panel">
<label>Select State:</label>{med_state}
<label>Skin Type:</label>{skin}
<label>Select Date:</label><input id="med-date-picker" type="date" value="{date}">
<div id="med-result" class="result"></div>
</div>"#,
        state = select("state-dropdown", &states, first),
        regressors = regressors,
        days = default_days,
        date = last_date,
        skin_location = select("skin-risk-location", &states, first),
        med_state = select("med-state-dropdown", &states, first),
        skin = select("skin-type-dropdown", &skins, Some("200")),
    );

    let script = r#"
function days() { return value('forecast-days-input'); }
async function refreshForecast() {
  try {
    const response = await api('/api/forecast', {
      state: value('state-dropdown'), regressors: checked('regressor'),
      days: days(), date: value('future-date-picker'),
    });
    draw('forecast-graph', response.figure);
    setText('forecast-value', response.text);
  } catch (e) { setText('forecast-value', e.message); }
}
async function refreshInsights() {
  const insights = await api('/api/forecast/insights', { state: value('state-dropdown'), days: days() });
  draw('future-factors-analysis', insights.bounds);
  draw('seasonal-trends', insights.seasonal);
  draw('distribution-plot', insights.distribution);
}
async function refreshSkinRisk() {
  const params = { location: value('skin-risk-location'), days: days() };
  try {
    const risk = await api('/api/skin-risk', Object.assign({ date: value('skin-risk-date-picker') }, params));
    draw('skin-risk-gauge', risk.figure);
    setText('skin-risk-recommendations', risk.text);
    const rows = await api('/api/ten-day', Object.assign({ start: value('ten-day-forecast-start-date') }, params));
    const body = document.querySelector('#ten-day-forecast-table tbody');
    body.innerHTML = '';
    rows.forEach(row => {
      const tr = document.createElement('tr');
      [row.date, row.uv_index, row.risk, row.recommendations].forEach(cell => {
        const td = document.createElement('td');
        td.textContent = cell;
        tr.appendChild(td);
      });
      body.appendChild(tr);
    });
  } catch (e) { setText('skin-risk-recommendations', e.message); }
}
async function refreshMed() {
  try {
    const med = await api('/api/med', {
      state: value('med-state-dropdown'), skin: value('skin-type-dropdown'),
      date: value('med-date-picker'), days: days(),
    });
    setText('med-result', med.text);
  } catch (e) { setText('med-result', e.message); }
}
document.querySelectorAll('input[name="regressor"]').forEach(el => el.addEventListener('change', refreshForecast));
onChange(['state-dropdown', 'forecast-days-input', 'future-date-picker'], refreshForecast);
onChange(['state-dropdown', 'forecast-days-input'], () => {
  if (document.getElementById('insights-collapse').classList.contains('open')) refreshInsights();
});
onChange(['skin-risk-date-picker', 'skin-risk-location', 'ten-day-forecast-start-date'], refreshSkinRisk);
onChange(['med-state-dropdown', 'skin-type-dropdown', 'med-date-picker'], refreshMed);
collapsible('toggle-insights-btn', 'insights-collapse', refreshInsights);
collapsible('toggle-skin-risk-btn', 'skin-risk-collapse', refreshSkinRisk);
collapsible('toggle-med-btn', 'med-collapse', refreshMed);
refreshForecast();
"#;

    page("Forecasting", &body, script)
}

pub fn derived_factors(dataset: &UvDataset) -> String {
    let range = dataset.date_range();
    let checklist: String = DerivedFactor::ALL
        .iter()
        .map(|f| {
            let mark = if matches!(f, DerivedFactor::DirectDiffuse | DerivedFactor::UvAttenuation) {
                " checked"
            } else {
                ""
            };
            format!(
                r#"<label><input type="checkbox" name="factor" value="{}"{}> {}</label><br>"#,
                f.id(),
                mark,
                f.label()
            )
        })
        .collect();

    let body = format!(
        r#"<h1>Derived Factor Calculations</h1>
<div class="panel controls">
<label>Select Location:</label>{location}
<label>Select Date Range:</label>
<input id="start-date" type="date" value="{start}"> to <input id="end-date" type="date" value="{end}">
<div>{checklist}</div>
<button id="calculate-btn">Calculate</button>
</div>
<div class="panel"><h4>Derived Factor Visualizations</h4><div id="derived-factor-visualization" class="graph"></div></div>"#,
        location = select("location-dropdown", &state_options(dataset), dataset.default_state()),
        start = date_attr(range.map(|(min, _)| min)),
        end = date_attr(range.map(|(_, max)| max)),
        checklist = checklist,
    );

    let script = r#"
let calculateClicks = 0;
document.getElementById('calculate-btn').addEventListener('click', async () => {
  calculateClicks += 1;
  const figure = await api('/api/derived', {
    clicks: calculateClicks, location: value('location-dropdown'),
    start: value('start-date'), end: value('end-date'), factors: checked('factor'),
  });
  draw('derived-factor-visualization', figure);
});
draw('derived-factor-visualization', { data: [], layout: { title: { text: '' } } });
"#;

    page("Derived Factors", &body, script)
}
