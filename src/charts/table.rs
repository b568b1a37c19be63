use serde::Serialize;

use crate::analyzers::ForecastPoint;
use crate::models::RiskBand;

/// One row of the multi-day skin damage risk table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskTableRow {
    pub date: String,
    pub uv_index: String,
    pub risk: &'static str,
    pub recommendations: &'static str,
}

impl RiskTableRow {
    pub fn from_point(point: &ForecastPoint) -> Self {
        let band = RiskBand::classify(point.yhat);
        Self {
            date: point.date.format("%Y-%m-%d").to_string(),
            uv_index: format!("{:.2}", point.yhat),
            risk: band.label(),
            recommendations: band.recommendation(),
        }
    }
}

/// Shading for one state on the choropleth.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionFill {
    pub name: String,
    pub value: f64,
    /// `None` when the name has no boundary feature or the value is not finite
    pub fill: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_row_formatting() {
        let point = ForecastPoint {
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            yhat: 6.456,
            yhat_lower: 5.0,
            yhat_upper: 8.0,
        };
        let row = RiskTableRow::from_point(&point);
        assert_eq!(row.date, "2024-06-01");
        assert_eq!(row.uv_index, "6.46");
        assert_eq!(row.risk, "High");
        assert_eq!(row.recommendations, "Use sunscreen SPF 30+, wear sunglasses.");
    }
}
