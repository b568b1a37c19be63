use crate::charts::figure::{Gauge, GaugeStep, Line, Range};
use crate::utils::constants::{GAUGE_AXIS_MAX, GAUGE_RED_ABOVE, GAUGE_YELLOW_ABOVE};

/// Viridis anchor colours at evenly spaced positions.
const VIRIDIS: [(u8, u8, u8); 5] = [
    (68, 1, 84),
    (59, 82, 139),
    (33, 145, 140),
    (94, 201, 98),
    (253, 231, 37),
];

/// Hex colour for `value` within `[min, max]`, or `None` if it is not finite.
pub fn viridis(value: f64, min: f64, max: f64) -> Option<String> {
    if !value.is_finite() {
        return None;
    }
    let t = if max > min {
        ((value - min) / (max - min)).clamp(0.0, 1.0)
    } else {
        0.5
    };

    let scaled = t * (VIRIDIS.len() - 1) as f64;
    let lower = scaled.floor() as usize;
    let upper = (lower + 1).min(VIRIDIS.len() - 1);
    let frac = scaled - lower as f64;

    let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
    let (r0, g0, b0) = VIRIDIS[lower];
    let (r1, g1, b1) = VIRIDIS[upper];
    Some(format!("#{:02x}{:02x}{:02x}", mix(r0, r1), mix(g0, g1), mix(b0, b1)))
}

pub fn gauge_bar_color(value: f64) -> &'static str {
    if value > GAUGE_RED_ABOVE {
        "red"
    } else if value > GAUGE_YELLOW_ABOVE {
        "yellow"
    } else {
        "green"
    }
}

pub fn risk_gauge(value: f64) -> Gauge {
    Gauge {
        axis: Range {
            range: [0.0, GAUGE_AXIS_MAX],
        },
        bar: Line {
            color: gauge_bar_color(value).to_string(),
        },
        steps: vec![
            GaugeStep { range: [0.0, 2.0], color: "green" },
            GaugeStep { range: [3.0, 5.0], color: "yellow" },
            GaugeStep { range: [6.0, 7.0], color: "orange" },
            GaugeStep { range: [8.0, 10.0], color: "red" },
            GaugeStep { range: [11.0, 15.0], color: "purple" },
        ],
    }
}

/// Equal-width bins over the finite values: `(bin centres, counts)`.
pub fn histogram(values: &[f64], bins: usize) -> (Vec<f64>, Vec<f64>) {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() || bins == 0 {
        return (Vec::new(), Vec::new());
    }

    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == min {
        return (vec![min], vec![finite.len() as f64]);
    }

    let width = (max - min) / bins as f64;
    let mut counts = vec![0.0; bins];
    for v in finite {
        // The maximum lands in the last bin rather than past it
        let idx = (((v - min) / width) as usize).min(bins - 1);
        counts[idx] += 1.0;
    }
    let centres = (0..bins).map(|i| min + width * (i as f64 + 0.5)).collect();
    (centres, counts)
}
