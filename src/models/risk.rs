use serde::{Deserialize, Serialize};

use crate::utils::constants::{
    RISK_HIGH_MAX, RISK_LOW_MAX, RISK_MODERATE_MAX, RISK_VERY_HIGH_MAX,
};

/// Ordered UV exposure risk bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskBand {
    Low,
    Moderate,
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
    Extreme,
}

impl RiskBand {
    /// Upper bounds are inclusive. Anything that fails every comparison
    /// (including NaN) is Extreme.
    pub fn classify(uv_index: f64) -> Self {
        if uv_index <= RISK_LOW_MAX {
            RiskBand::Low
        } else if uv_index <= RISK_MODERATE_MAX {
            RiskBand::Moderate
        } else if uv_index <= RISK_HIGH_MAX {
            RiskBand::High
        } else if uv_index <= RISK_VERY_HIGH_MAX {
            RiskBand::VeryHigh
        } else {
            RiskBand::Extreme
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskBand::Low => "Low",
            RiskBand::Moderate => "Moderate",
            RiskBand::High => "High",
            RiskBand::VeryHigh => "Very High",
            RiskBand::Extreme => "Extreme",
        }
    }

    /// Short per-day advice used in forecast tables.
    pub fn recommendation(&self) -> &'static str {
        match self {
            RiskBand::Low => "Minimal protection required.",
            RiskBand::Moderate => "Use sunscreen SPF 15+, limit outdoor time.",
            RiskBand::High => "Use sunscreen SPF 30+, wear sunglasses.",
            RiskBand::VeryHigh => "Avoid prolonged sun exposure, use SPF 50+.",
            RiskBand::Extreme => "Stay indoors, avoid sun exposure.",
        }
    }

    /// Advice shown next to the risk gauge.
    pub fn advisory(&self) -> &'static str {
        match self {
            RiskBand::High | RiskBand::VeryHigh | RiskBand::Extreme => {
                "Use sunscreen SPF 30+, wear a hat and sunglasses, avoid prolonged exposure."
            }
            RiskBand::Moderate => "Use sunscreen SPF 15+, and limit time outdoors.",
            RiskBand::Low => "Minimal protection required. Enjoy your day!",
        }
    }
}

impl std::fmt::Display for RiskBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
