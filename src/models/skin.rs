use serde::{Deserialize, Serialize};

use crate::error::{DashboardError, Result};

/// Fitzpatrick skin types with their erythema constants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkinType {
    #[default]
    I,
    II,
    III,
    IV,
    V,
    VI,
}

impl SkinType {
    pub const ALL: [SkinType; 6] = [
        SkinType::I,
        SkinType::II,
        SkinType::III,
        SkinType::IV,
        SkinType::V,
        SkinType::VI,
    ];

    pub fn constant(&self) -> u32 {
        match self {
            SkinType::I => 200,
            SkinType::II => 300,
            SkinType::III => 400,
            SkinType::IV => 600,
            SkinType::V => 800,
            SkinType::VI => 1000,
        }
    }

    pub fn from_constant(value: u32) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|s| s.constant() == value)
            .ok_or_else(|| DashboardError::unknown("skin type constant", value.to_string()))
    }

    pub fn label(&self) -> &'static str {
        match self {
            SkinType::I => "Type I - Very Fair",
            SkinType::II => "Type II - Fair",
            SkinType::III => "Type III - Medium",
            SkinType::IV => "Type IV - Olive",
            SkinType::V => "Type V - Brown",
            SkinType::VI => "Type VI - Dark Brown/Black",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_round_trip() {
        for skin in SkinType::ALL {
            assert_eq!(SkinType::from_constant(skin.constant()).unwrap(), skin);
        }
        assert!(SkinType::from_constant(250).is_err());
    }

    #[test]
    fn test_constants_span_range() {
        assert_eq!(SkinType::I.constant(), 200);
        assert_eq!(SkinType::VI.constant(), 1000);
    }
}
