use chrono::NaiveDate;
use serde::Serialize;

/// Axis values: dates and labels travel as text, everything else as numbers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Values {
    Text(Vec<String>),
    Numbers(Vec<f64>),
}

impl Values {
    pub fn dates(dates: &[NaiveDate]) -> Self {
        Values::Text(dates.iter().map(|d| d.format("%Y-%m-%d").to_string()).collect())
    }

    pub fn len(&self) -> usize {
        match self {
            Values::Text(v) => v.len(),
            Values::Numbers(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Line {
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Range {
    pub range: [f64; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GaugeStep {
    pub range: [f64; 2],
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Gauge {
    pub axis: Range,
    pub bar: Line,
    pub steps: Vec<GaugeStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Text {
    pub text: String,
}

impl Text {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// A single Plotly trace.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Trace {
    Scatter {
        x: Values,
        y: Vec<f64>,
        mode: &'static str,
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        line: Option<Line>,
    },
    Bar {
        x: Values,
        y: Vec<f64>,
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        marker: Option<Marker>,
    },
    Choropleth {
        /// URL the client loads the boundary document from
        geojson: String,
        featureidkey: &'static str,
        locations: Vec<String>,
        z: Vec<f64>,
        colorscale: &'static str,
        colorbar: Text,
    },
    Indicator {
        mode: &'static str,
        value: f64,
        title: Text,
        gauge: Gauge,
    },
}

impl Trace {
    pub fn lines(name: impl Into<String>, x: Values, y: Vec<f64>) -> Self {
        Trace::Scatter {
            x,
            y,
            mode: "lines",
            name: name.into(),
            line: None,
        }
    }

    pub fn markers(name: impl Into<String>, x: Values, y: Vec<f64>) -> Self {
        Trace::Scatter {
            x,
            y,
            mode: "markers",
            name: name.into(),
            line: None,
        }
    }

    pub fn bar(name: impl Into<String>, x: Values, y: Vec<f64>) -> Self {
        Trace::Bar {
            x,
            y,
            name: name.into(),
            marker: None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Trace::Scatter { name, .. } | Trace::Bar { name, .. } => Some(name),
            Trace::Choropleth { .. } | Trace::Indicator { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Axis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Text>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub title: Text,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xaxis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geo: Option<serde_json::Value>,
    /// Plotly keeps zoom and pan across redraws while this stays unchanged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uirevision: Option<&'static str>,
}

/// A chart payload in the shape Plotly's `react` expects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

impl Figure {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            data: Vec::new(),
            layout: Layout {
                title: Text::new(title),
                xaxis: None,
                yaxis: None,
                geo: None,
                uirevision: None,
            },
        }
    }

    /// An untitled figure with no traces.
    pub fn empty() -> Self {
        Self::new("")
    }

    /// A figure carrying only a message in its title.
    pub fn placeholder(message: impl Into<String>) -> Self {
        Self::new(message)
    }

    pub fn with_trace(mut self, trace: Trace) -> Self {
        self.data.push(trace);
        self
    }

    pub fn with_axes(mut self, x_title: impl Into<String>, y_title: impl Into<String>) -> Self {
        self.layout.xaxis = Some(Axis {
            title: Some(Text::new(x_title)),
        });
        self.layout.yaxis = Some(Axis {
            title: Some(Text::new(y_title)),
        });
        self
    }

    pub fn title(&self) -> &str {
        &self.layout.title.text
    }

    pub fn is_placeholder(&self) -> bool {
        self.data.is_empty()
    }
}
