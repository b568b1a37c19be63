use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;

use crate::error::{DashboardError, Result};

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(rename = "type")]
    kind: String,
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    properties: FeatureProperties,
}

#[derive(Debug, Default, Deserialize)]
struct FeatureProperties {
    name: Option<String>,
}

/// State boundary polygons keyed by `properties.name`.
///
/// The raw document is kept untouched so it can be handed to the map
/// renderer as-is; only the feature names are indexed for joins.
#[derive(Debug, Clone)]
pub struct StateBoundaries {
    raw: Value,
    names: HashSet<String>,
}

impl StateBoundaries {
    pub fn from_value(raw: Value) -> Result<Self> {
        let collection: FeatureCollection = serde_json::from_value(raw.clone())?;
        if collection.kind != "FeatureCollection" {
            return Err(DashboardError::InvalidFormat(format!(
                "expected a GeoJSON FeatureCollection, found '{}'",
                collection.kind
            )));
        }

        let names = collection
            .features
            .into_iter()
            .filter_map(|f| f.properties.name)
            .collect();

        Ok(Self { raw, names })
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn feature_count(&self) -> usize {
        self.names.len()
    }

    /// Exact, case-sensitive match against `properties.name`.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Names from `candidates` that have no matching feature.
    pub fn unmatched<'a, I>(&self, candidates: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut missing: Vec<String> = candidates
            .into_iter()
            .filter(|n| !self.contains(n))
            .cloned()
            .collect();
        missing.sort();
        missing.dedup();
        missing
    }
}
