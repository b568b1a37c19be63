//! Closed-form transforms of a single observation.
//!
//! Nothing here guards against zero or missing denominators: a zero
//! Clear Sky UVI gives an infinite or NaN attenuation, exactly as the
//! formula says. Values are never clamped.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{DashboardError, Result};
use crate::models::UvObservation;
use crate::utils::constants::{ACTION_SPECTRUM_WEIGHT, BASE_IRRADIANCE, OZONE_DECAY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivedFactor {
    DirectDiffuse,
    UvAttenuation,
    CloudImpact,
    OzoneProtection,
    TransmissionEfficiency,
    SolarEnergyPotential,
    WeightedUv,
}

impl DerivedFactor {
    /// Catalogue order; also the order series are emitted in.
    pub const ALL: [DerivedFactor; 7] = [
        DerivedFactor::DirectDiffuse,
        DerivedFactor::UvAttenuation,
        DerivedFactor::CloudImpact,
        DerivedFactor::OzoneProtection,
        DerivedFactor::TransmissionEfficiency,
        DerivedFactor::SolarEnergyPotential,
        DerivedFactor::WeightedUv,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            DerivedFactor::DirectDiffuse => "direct_diffuse",
            DerivedFactor::UvAttenuation => "uv_attenuation",
            DerivedFactor::CloudImpact => "cloud_impact",
            DerivedFactor::OzoneProtection => "ozone_protection",
            DerivedFactor::TransmissionEfficiency => "transmission_efficiency",
            DerivedFactor::SolarEnergyPotential => "solar_energy_potential",
            DerivedFactor::WeightedUv => "weighted_uv",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DerivedFactor::DirectDiffuse => "Direct and Diffuse UV Components",
            DerivedFactor::UvAttenuation => "UV Attenuation Factor",
            DerivedFactor::CloudImpact => "Cloud Impact Factor",
            DerivedFactor::OzoneProtection => "Ozone Protection Factor",
            DerivedFactor::TransmissionEfficiency => "Transmission Efficiency",
            DerivedFactor::SolarEnergyPotential => "Solar Energy Potential Adjustment",
            DerivedFactor::WeightedUv => "Weighted UV Exposure",
        }
    }

    pub fn parse(id: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.id() == id.trim())
            .ok_or_else(|| DashboardError::unknown("derived factor", id))
    }

    pub fn parse_list(ids: &str) -> Result<Vec<Self>> {
        ids.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Self::parse)
            .collect()
    }

    /// Names and per-row functions of the series this factor produces.
    fn components(&self) -> &'static [(&'static str, RowFn)] {
        match self {
            DerivedFactor::DirectDiffuse => DIRECT_DIFFUSE,
            DerivedFactor::UvAttenuation => UV_ATTENUATION,
            DerivedFactor::CloudImpact => CLOUD_IMPACT,
            DerivedFactor::OzoneProtection => OZONE_PROTECTION,
            DerivedFactor::TransmissionEfficiency => TRANSMISSION_EFFICIENCY,
            DerivedFactor::SolarEnergyPotential => SOLAR_ENERGY_POTENTIAL,
            DerivedFactor::WeightedUv => WEIGHTED_UV,
        }
    }
}

type RowFn = fn(&UvObservation) -> f64;

const DIRECT_DIFFUSE: &[(&str, RowFn)] = &[("Direct UV", direct_uv), ("Diffuse UV", diffuse_uv)];
const UV_ATTENUATION: &[(&str, RowFn)] = &[("UV Attenuation", uv_attenuation)];
const CLOUD_IMPACT: &[(&str, RowFn)] = &[("Cloud Impact Factor", cloud_impact)];
const OZONE_PROTECTION: &[(&str, RowFn)] = &[("Ozone Protection Factor", ozone_protection)];
const TRANSMISSION_EFFICIENCY: &[(&str, RowFn)] =
    &[("Transmission Efficiency", transmission_efficiency)];
const SOLAR_ENERGY_POTENTIAL: &[(&str, RowFn)] =
    &[("Solar Energy Potential", solar_energy_potential)];
const WEIGHTED_UV: &[(&str, RowFn)] = &[("Weighted UV", weighted_uv)];

pub fn direct_uv(obs: &UvObservation) -> f64 {
    obs.clear_sky_uvi * (obs.aerosol_transmission / 100.0) * obs.solar_zenith_angle.to_radians().cos()
}

pub fn diffuse_uv(obs: &UvObservation) -> f64 {
    obs.clear_sky_uvi - direct_uv(obs)
}

pub fn uv_attenuation(obs: &UvObservation) -> f64 {
    1.0 - obs.cloudy_sky_uvi / obs.clear_sky_uvi
}

pub fn cloud_impact(obs: &UvObservation) -> f64 {
    1.0 - obs.cloud_transmission / 100.0
}

pub fn ozone_protection(obs: &UvObservation) -> f64 {
    ozone_protection_factor(obs.total_column_ozone)
}

pub fn ozone_protection_factor(total_column_ozone: f64) -> f64 {
    1.0 - (-OZONE_DECAY * total_column_ozone).exp()
}

pub fn transmission_efficiency(obs: &UvObservation) -> f64 {
    (obs.cloud_transmission / 100.0) * (obs.aerosol_transmission / 100.0)
}

pub fn solar_energy_potential(obs: &UvObservation) -> f64 {
    BASE_IRRADIANCE * transmission_efficiency(obs)
}

pub fn weighted_uv(obs: &UvObservation) -> f64 {
    obs.clear_sky_uvi * ACTION_SPECTRUM_WEIGHT
}

/// One derived value per input row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactorSeries {
    pub name: &'static str,
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
}

pub struct DerivedFactorCalculator;

impl DerivedFactorCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Compute the requested factors over `rows`.
    ///
    /// Requests are an unordered set: duplicates collapse and output follows
    /// catalogue order.
    pub fn calculate(&self, rows: &[&UvObservation], requested: &[DerivedFactor]) -> Vec<FactorSeries> {
        let dates: Vec<NaiveDate> = rows.iter().map(|o| o.date).collect();

        DerivedFactor::ALL
            .iter()
            .filter(|f| requested.contains(f))
            .flat_map(|f| f.components().iter())
            .map(|&(name, func)| FactorSeries {
                name,
                dates: dates.clone(),
                values: rows.iter().map(|o| func(o)).collect(),
            })
            .collect()
    }
}

impl Default for DerivedFactorCalculator {
    fn default() -> Self {
        Self::new()
    }
}
