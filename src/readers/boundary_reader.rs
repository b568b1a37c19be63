use crate::error::Result;
use crate::models::StateBoundaries;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

pub struct BoundaryReader;

impl BoundaryReader {
    pub fn new() -> Self {
        Self
    }

    /// Read a GeoJSON FeatureCollection of state outlines
    pub fn read_boundaries(&self, path: &Path) -> Result<StateBoundaries> {
        let file = File::open(path)?;
        let raw: serde_json::Value = serde_json::from_reader(BufReader::new(file))?;
        let boundaries = StateBoundaries::from_value(raw)?;

        info!(
            path = %path.display(),
            features = boundaries.feature_count(),
            "Loaded state boundaries"
        );
        Ok(boundaries)
    }
}

impl Default for BoundaryReader {
    fn default() -> Self {
        Self::new()
    }
}
