use crate::error::{DashboardError, Result};
use crate::models::{Measure, UvDataset, UvObservation};
use crate::utils::constants::PACKED_DATE_FORMAT;
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Row layout of the UV CSV. Columns not listed here are ignored.
#[derive(Debug, Deserialize)]
struct RawObservation {
    #[serde(rename = "NAME")]
    name: String,
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Clear Sky UVI")]
    clear_sky_uvi: Option<f64>,
    #[serde(rename = "Cloudy Sky UVI")]
    cloudy_sky_uvi: Option<f64>,
    #[serde(rename = "Cloud Transmission")]
    cloud_transmission: Option<f64>,
    #[serde(rename = "Aerosol Transmission")]
    aerosol_transmission: Option<f64>,
    #[serde(rename = "Solar Zenith Angle")]
    solar_zenith_angle: Option<f64>,
    #[serde(rename = "Total Column Ozone")]
    total_column_ozone: Option<f64>,
}

pub struct ObservationReader {
    delimiter: u8,
}

impl ObservationReader {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    pub fn with_delimiter(delimiter: u8) -> Self {
        Self { delimiter }
    }

    /// Read the whole CSV into an immutable dataset
    pub fn read_dataset(&self, path: &Path) -> Result<UvDataset> {
        let observations = self.read_observations(path)?;
        let dataset = UvDataset::new(observations);
        info!(
            path = %path.display(),
            rows = dataset.len(),
            states = dataset.states().len(),
            "Loaded UV observations"
        );
        Ok(dataset)
    }

    pub fn read_observations(&self, path: &Path) -> Result<Vec<UvObservation>> {
        let file = File::open(path)?;
        self.read_from(file)
    }

    pub fn read_from<R: Read>(&self, input: R) -> Result<Vec<UvObservation>> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .trim(csv::Trim::All)
            .from_reader(input);

        // Absent columns would otherwise deserialize as all-NaN
        let headers = reader.headers()?;
        let missing: Vec<&str> = ["NAME", "Date"]
            .into_iter()
            .chain(Measure::ALL.iter().map(Measure::label))
            .filter(|required| !headers.iter().any(|h| h == *required))
            .collect();
        if !missing.is_empty() {
            return Err(DashboardError::MissingData(format!(
                "CSV columns: {}",
                missing.join(", ")
            )));
        }

        let mut observations = Vec::new();
        for result in reader.deserialize::<RawObservation>() {
            let raw = result?;
            // Header is line 1; records start on line 2
            let line = observations.len() as u64 + 2;
            observations.push(self.convert(raw, line)?);
        }

        debug!(rows = observations.len(), "Parsed CSV records");
        Ok(observations)
    }

    fn convert(&self, raw: RawObservation, line: u64) -> Result<UvObservation> {
        let date = parse_packed_date(&raw.date).map_err(|_| DashboardError::InvalidDate {
            value: raw.date.clone(),
            line,
        })?;

        let value = |v: Option<f64>| v.unwrap_or(f64::NAN);

        Ok(UvObservation::new(
            raw.name,
            date,
            value(raw.clear_sky_uvi),
            value(raw.cloudy_sky_uvi),
            value(raw.cloud_transmission),
            value(raw.aerosol_transmission),
            value(raw.solar_zenith_angle),
            value(raw.total_column_ozone),
        ))
    }
}

/// Parse a packed `YYYYMMDD` date. Accepts a trailing `.0` from float exports.
pub fn parse_packed_date(value: &str) -> Result<NaiveDate> {
    let trimmed = value.trim();
    let digits = trimmed.strip_suffix(".0").unwrap_or(trimmed);
    Ok(NaiveDate::parse_from_str(digits, PACKED_DATE_FORMAT)?)
}

impl Default for ObservationReader {
    fn default() -> Self {
        Self::new()
    }
}
