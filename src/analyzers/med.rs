use crate::models::SkinType;
use crate::utils::constants::MED_UV_DIVISOR;

/// Minutes of exposure before erythema for a skin type at a UV index.
///
/// Returns `None` when the UV index is not positive (or not a number).
pub fn time_to_erythema(skin: SkinType, uv_index: f64) -> Option<f64> {
    if uv_index > 0.0 {
        Some(skin.constant() as f64 / (uv_index * MED_UV_DIVISOR))
    } else {
        None
    }
}

pub fn describe_time_to_erythema(minutes: Option<f64>) -> String {
    match minutes {
        Some(m) => format!("Time to Erythema: {:.2} minutes", m),
        None => "UV Index is too low for erythema risk.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_one_at_uv_four() {
        let minutes = time_to_erythema(SkinType::I, 4.0).unwrap();
        assert!((minutes - 2.0).abs() < 1e-12);
        assert_eq!(
            describe_time_to_erythema(Some(minutes)),
            "Time to Erythema: 2.00 minutes"
        );
    }

    #[test]
    fn test_darker_skin_takes_longer() {
        let fair = time_to_erythema(SkinType::II, 6.0).unwrap();
        let dark = time_to_erythema(SkinType::VI, 6.0).unwrap();
        assert!(dark > fair);
    }

    #[test]
    fn test_non_positive_uv_has_no_time() {
        assert_eq!(time_to_erythema(SkinType::III, 0.0), None);
        assert_eq!(time_to_erythema(SkinType::III, -1.5), None);
        assert_eq!(time_to_erythema(SkinType::III, f64::NAN), None);
        assert_eq!(
            describe_time_to_erythema(None),
            "UV Index is too low for erythema risk."
        );
    }
}
