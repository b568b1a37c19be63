use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{DashboardError, Result};

/// One day of UV measurements for a single state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UvObservation {
    pub name: String,
    pub date: NaiveDate,
    pub clear_sky_uvi: f64,
    pub cloudy_sky_uvi: f64,
    /// Percent, 0-100
    pub cloud_transmission: f64,
    /// Percent, 0-100
    pub aerosol_transmission: f64,
    /// Degrees
    pub solar_zenith_angle: f64,
    pub total_column_ozone: f64,
}

impl UvObservation {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: String,
        date: NaiveDate,
        clear_sky_uvi: f64,
        cloudy_sky_uvi: f64,
        cloud_transmission: f64,
        aerosol_transmission: f64,
        solar_zenith_angle: f64,
        total_column_ozone: f64,
    ) -> Self {
        Self {
            name,
            date,
            clear_sky_uvi,
            cloudy_sky_uvi,
            cloud_transmission,
            aerosol_transmission,
            solar_zenith_angle,
            total_column_ozone,
        }
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }

    pub fn month(&self) -> u32 {
        self.date.month()
    }

    pub fn day(&self) -> u32 {
        self.date.day()
    }

    pub fn value(&self, measure: Measure) -> f64 {
        match measure {
            Measure::ClearSkyUvi => self.clear_sky_uvi,
            Measure::CloudySkyUvi => self.cloudy_sky_uvi,
            Measure::CloudTransmission => self.cloud_transmission,
            Measure::AerosolTransmission => self.aerosol_transmission,
            Measure::SolarZenithAngle => self.solar_zenith_angle,
            Measure::TotalColumnOzone => self.total_column_ozone,
        }
    }

    /// True when every listed measure is a real number.
    pub fn has_values(&self, measures: &[Measure]) -> bool {
        measures.iter().all(|m| !self.value(*m).is_nan())
    }
}

/// The numeric columns of the dataset, addressed by their display label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Measure {
    #[serde(rename = "Clear Sky UVI")]
    ClearSkyUvi,
    #[serde(rename = "Cloudy Sky UVI")]
    CloudySkyUvi,
    #[serde(rename = "Cloud Transmission")]
    CloudTransmission,
    #[serde(rename = "Aerosol Transmission")]
    AerosolTransmission,
    #[serde(rename = "Solar Zenith Angle")]
    SolarZenithAngle,
    #[serde(rename = "Total Column Ozone")]
    TotalColumnOzone,
}

impl Measure {
    pub const ALL: [Measure; 6] = [
        Measure::ClearSkyUvi,
        Measure::CloudySkyUvi,
        Measure::CloudTransmission,
        Measure::AerosolTransmission,
        Measure::SolarZenithAngle,
        Measure::TotalColumnOzone,
    ];

    /// Candidate predictors for Cloudy Sky UVI.
    pub const REGRESSION_FACTORS: [Measure; 5] = [
        Measure::ClearSkyUvi,
        Measure::CloudTransmission,
        Measure::SolarZenithAngle,
        Measure::AerosolTransmission,
        Measure::TotalColumnOzone,
    ];

    /// Parameters that can be drawn on the state map.
    pub const MAP_PARAMETERS: [Measure; 3] = [
        Measure::ClearSkyUvi,
        Measure::CloudySkyUvi,
        Measure::TotalColumnOzone,
    ];

    /// Extra regressors offered to the forecaster.
    pub const FORECAST_REGRESSORS: [Measure; 2] =
        [Measure::ClearSkyUvi, Measure::TotalColumnOzone];

    pub fn label(&self) -> &'static str {
        match self {
            Measure::ClearSkyUvi => "Clear Sky UVI",
            Measure::CloudySkyUvi => "Cloudy Sky UVI",
            Measure::CloudTransmission => "Cloud Transmission",
            Measure::AerosolTransmission => "Aerosol Transmission",
            Measure::SolarZenithAngle => "Solar Zenith Angle",
            Measure::TotalColumnOzone => "Total Column Ozone",
        }
    }

    pub fn parse(label: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.label().eq_ignore_ascii_case(label.trim()))
            .ok_or_else(|| DashboardError::unknown("measure", label))
    }

    /// Parse a comma-separated list of labels, ignoring blanks.
    pub fn parse_list(labels: &str) -> Result<Vec<Self>> {
        labels
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Self::parse)
            .collect()
    }
}

impl std::fmt::Display for Measure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> UvObservation {
        UvObservation::new(
            "Texas".to_string(),
            NaiveDate::from_ymd_opt(2023, 7, 15).unwrap(),
            9.5,
            7.1,
            80.0,
            90.0,
            30.0,
            300.0,
        )
    }

    #[test]
    fn test_derived_date_parts() {
        let obs = sample();
        assert_eq!(obs.year(), 2023);
        assert_eq!(obs.month(), 7);
        assert_eq!(obs.day(), 15);
    }

    #[test]
    fn test_measure_lookup() {
        let obs = sample();
        assert_eq!(obs.value(Measure::CloudySkyUvi), 7.1);
        assert_eq!(obs.value(Measure::TotalColumnOzone), 300.0);
    }

    #[test]
    fn test_measure_parse() {
        assert_eq!(Measure::parse("Clear Sky UVI").unwrap(), Measure::ClearSkyUvi);
        assert_eq!(
            Measure::parse(" total column ozone ").unwrap(),
            Measure::TotalColumnOzone
        );
        assert!(Measure::parse("Humidity").is_err());

        let list = Measure::parse_list("Clear Sky UVI, Cloud Transmission,").unwrap();
        assert_eq!(list, vec![Measure::ClearSkyUvi, Measure::CloudTransmission]);
    }

    #[test]
    fn test_has_values_detects_nan() {
        let mut obs = sample();
        assert!(obs.has_values(&Measure::ALL));
        obs.cloud_transmission = f64::NAN;
        assert!(!obs.has_values(&[Measure::CloudTransmission]));
        assert!(obs.has_values(&[Measure::ClearSkyUvi]));
    }
}
