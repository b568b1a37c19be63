use crate::error::{DashboardError, Result};
use crate::models::{Measure, UvObservation};
use crate::utils::constants::{SPLIT_SEED, TEST_FRACTION};
use chrono::NaiveDate;
use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::debug;

const SVD_EPSILON: f64 = 1e-12;

/// Ordinary least squares with an intercept.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearModel {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl LinearModel {
    /// Fit `target ~ 1 + features`. Rank-deficient designs get the
    /// minimum-norm solution.
    pub fn fit(features: &[Vec<f64>], target: &[f64]) -> Result<Self> {
        let n = target.len();
        if n == 0 || features.len() != n {
            return Err(DashboardError::ModelFit(format!(
                "need matching non-empty inputs, got {} rows and {} targets",
                features.len(),
                n
            )));
        }

        let p = features[0].len();
        if features.iter().any(|row| row.len() != p) {
            return Err(DashboardError::ModelFit(
                "feature rows have differing widths".to_string(),
            ));
        }

        let design = DMatrix::from_fn(n, p + 1, |i, j| if j == 0 { 1.0 } else { features[i][j - 1] });
        let y = DVector::from_column_slice(target);

        let beta = design
            .svd(true, true)
            .solve(&y, SVD_EPSILON)
            .map_err(|e| DashboardError::ModelFit(e.to_string()))?;

        Ok(Self {
            intercept: beta[0],
            coefficients: beta.iter().skip(1).copied().collect(),
        })
    }

    pub fn predict_row(&self, row: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(row)
                .map(|(c, x)| c * x)
                .sum::<f64>()
    }

    pub fn predict(&self, rows: &[Vec<f64>]) -> Vec<f64> {
        rows.iter().map(|r| self.predict_row(r)).collect()
    }

    /// Coefficient of determination on held-out data.
    pub fn r2_score(&self, rows: &[Vec<f64>], target: &[f64]) -> f64 {
        r2_score(target, &self.predict(rows))
    }
}

/// R² of `predicted` against `actual`. A constant target scores 1.0 when
/// matched exactly and 0.0 otherwise; fewer than two samples is NaN.
pub fn r2_score(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.len() < 2 {
        return f64::NAN;
    }
    let mean = actual.iter().sum::<f64>() / actual.len() as f64;
    let ss_res: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        if ss_res == 0.0 {
            1.0
        } else {
            0.0
        }
    } else {
        1.0 - ss_res / ss_tot
    }
}

/// Row indices of a shuffled train/test partition.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainTestSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffle `0..n` with a fixed seed and hold out `ceil(n * test_fraction)` rows.
pub fn train_test_split(n: usize, test_fraction: f64, seed: u64) -> Result<TrainTestSplit> {
    let n_test = (n as f64 * test_fraction).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(DashboardError::ModelFit(format!(
            "cannot split {} rows with test fraction {}",
            n, test_fraction
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let train = indices.split_off(n_test);
    Ok(TrainTestSplit {
        train,
        test: indices,
    })
}

#[derive(Debug, Clone)]
pub struct RegressionOutcome {
    pub model: LinearModel,
    pub test_dates: Vec<NaiveDate>,
    pub actual: Vec<f64>,
    pub predicted: Vec<f64>,
    pub r2: f64,
    pub train_rows: usize,
}

/// Predicts one measure from others on a held-out split.
pub struct RegressionAnalyzer {
    target: Measure,
    test_fraction: f64,
    seed: u64,
}

impl RegressionAnalyzer {
    pub fn new() -> Self {
        Self {
            target: Measure::CloudySkyUvi,
            test_fraction: TEST_FRACTION,
            seed: SPLIT_SEED,
        }
    }

    pub fn with_target(mut self, target: Measure) -> Self {
        self.target = target;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn target(&self) -> Measure {
        self.target
    }

    /// Rows where the target and every factor are present.
    pub fn complete_rows<'a>(
        &self,
        rows: &[&'a UvObservation],
        factors: &[Measure],
    ) -> Vec<&'a UvObservation> {
        rows.iter()
            .copied()
            .filter(|o| o.has_values(factors) && o.has_values(&[self.target]))
            .collect()
    }

    pub fn feature_row(observation: &UvObservation, factors: &[Measure]) -> Vec<f64> {
        factors.iter().map(|m| observation.value(*m)).collect()
    }

    /// Split, fit on the training rows, and score on the test rows.
    pub fn evaluate(&self, rows: &[&UvObservation], factors: &[Measure]) -> Result<RegressionOutcome> {
        if factors.is_empty() {
            return Err(DashboardError::MissingData("no regression factors selected".to_string()));
        }
        if factors.contains(&self.target) {
            return Err(DashboardError::InvalidFormat(format!(
                "{} cannot predict itself",
                self.target
            )));
        }

        let split = train_test_split(rows.len(), self.test_fraction, self.seed)?;

        let pick = |indices: &[usize]| -> (Vec<Vec<f64>>, Vec<f64>) {
            indices
                .iter()
                .map(|&i| (Self::feature_row(rows[i], factors), rows[i].value(self.target)))
                .unzip()
        };

        let (x_train, y_train) = pick(&split.train);
        let (x_test, y_test) = pick(&split.test);

        let model = LinearModel::fit(&x_train, &y_train)?;
        let predicted = model.predict(&x_test);
        let r2 = r2_score(&y_test, &predicted);

        debug!(
            factors = factors.len(),
            train = y_train.len(),
            test = y_test.len(),
            r2,
            "Fitted regression"
        );

        Ok(RegressionOutcome {
            model,
            test_dates: split.test.iter().map(|&i| rows[i].date).collect(),
            actual: y_test,
            predicted,
            r2,
            train_rows: split.train.len(),
        })
    }
}

impl Default for RegressionAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-8
    }

    #[test]
    fn test_fit_recovers_exact_plane() {
        let features: Vec<Vec<f64>> = (0..20)
            .map(|i| vec![i as f64, ((i * 7) % 5) as f64])
            .collect();
        let target: Vec<f64> = features.iter().map(|r| 1.5 + 2.0 * r[0] - 0.5 * r[1]).collect();

        let model = LinearModel::fit(&features, &target).unwrap();
        assert!(close(model.intercept, 1.5));
        assert!(close(model.coefficients[0], 2.0));
        assert!(close(model.coefficients[1], -0.5));
        assert!(close(model.predict_row(&[10.0, 2.0]), 20.5));
        assert!(close(model.r2_score(&features, &target), 1.0));
    }

    #[test]
    fn test_fit_rejects_empty() {
        assert!(LinearModel::fit(&[], &[]).is_err());
        assert!(LinearModel::fit(&[vec![1.0], vec![1.0, 2.0]], &[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_r2_edge_cases() {
        assert!(r2_score(&[1.0], &[1.0]).is_nan());
        assert_eq!(r2_score(&[2.0, 2.0], &[2.0, 2.0]), 1.0);
        assert_eq!(r2_score(&[2.0, 2.0], &[1.0, 3.0]), 0.0);
        assert!(close(r2_score(&[1.0, 2.0, 3.0], &[2.0, 2.0, 2.0]), 0.0));
    }

    #[test]
    fn test_split_is_deterministic_partition() {
        let a = train_test_split(10, 0.2, 42).unwrap();
        let b = train_test_split(10, 0.2, 42).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.test.len(), 2);
        assert_eq!(a.train.len(), 8);

        let mut all: Vec<usize> = a.train.iter().chain(&a.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..10).collect::<Vec<_>>());

        // ceil(0.2 * 11) = 3
        assert_eq!(train_test_split(11, 0.2, 42).unwrap().test.len(), 3);
        assert!(train_test_split(1, 0.2, 42).is_err());
        assert!(train_test_split(0, 0.2, 42).is_err());
    }

    #[test]
    fn test_evaluate_linear_relationship() {
        let observations: Vec<UvObservation> = (0..30)
            .map(|i| {
                let clear = 2.0 + i as f64 * 0.3;
                UvObservation::new(
                    "Texas".to_string(),
                    NaiveDate::from_ymd_opt(2023, 1, 1).unwrap() + chrono::Days::new(i),
                    clear,
                    0.8 * clear,
                    80.0,
                    90.0,
                    30.0,
                    300.0,
                )
            })
            .collect();
        let rows: Vec<&UvObservation> = observations.iter().collect();

        let analyzer = RegressionAnalyzer::new();
        let outcome = analyzer.evaluate(&rows, &[Measure::ClearSkyUvi]).unwrap();

        assert_eq!(outcome.actual.len(), 6);
        assert_eq!(outcome.train_rows, 24);
        assert!(close(outcome.model.coefficients[0], 0.8));
        assert!(close(outcome.r2, 1.0));
    }

    #[test]
    fn test_evaluate_rejects_target_as_factor() {
        let analyzer = RegressionAnalyzer::new();
        assert!(analyzer.evaluate(&[], &[Measure::CloudySkyUvi]).is_err());
        assert!(analyzer.evaluate(&[], &[]).is_err());
    }

    #[test]
    fn test_complete_rows_drops_missing() {
        let date = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let good = UvObservation::new("A".into(), date, 5.0, 4.0, 80.0, 90.0, 30.0, 300.0);
        let bad = UvObservation::new("A".into(), date, 5.0, f64::NAN, 80.0, 90.0, 30.0, 300.0);
        let rows = vec![&good, &bad];

        let analyzer = RegressionAnalyzer::new();
        assert_eq!(analyzer.complete_rows(&rows, &[Measure::ClearSkyUvi]).len(), 1);
    }
}
