use crate::analyzers::regression::RegressionAnalyzer;
use crate::error::Result;
use crate::models::{Measure, UvObservation};
use rayon::prelude::*;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct FactorScore {
    pub factors: Vec<Measure>,
    pub r2: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionReport {
    /// Best combination, if any scored above zero
    pub best: Option<FactorScore>,
    /// Every scored combination in enumeration order
    pub scores: Vec<FactorScore>,
}

impl SelectionReport {
    pub fn summary(&self) -> String {
        match &self.best {
            Some(best) => format!(
                "Best Combination: {}, R^2: {:.4} ({} combinations scored)",
                best.factors
                    .iter()
                    .map(Measure::label)
                    .collect::<Vec<_>>()
                    .join(", "),
                best.r2,
                self.scores.len()
            ),
            None => format!(
                "No combination scored above R^2 0 ({} combinations scored)",
                self.scores.len()
            ),
        }
    }
}

/// Exhaustive search over factor subsets for the best held-out R².
pub struct FeatureSelector {
    analyzer: RegressionAnalyzer,
    candidates: Vec<Measure>,
}

impl FeatureSelector {
    pub fn new() -> Self {
        Self {
            analyzer: RegressionAnalyzer::new(),
            candidates: Measure::REGRESSION_FACTORS.to_vec(),
        }
    }

    pub fn with_candidates(mut self, candidates: Vec<Measure>) -> Self {
        self.candidates = candidates;
        self
    }

    pub fn select(&self, rows: &[&UvObservation]) -> Result<SelectionReport> {
        let complete = self.analyzer.complete_rows(rows, &self.candidates);
        let combinations = combinations(&self.candidates);
        debug!(
            rows = complete.len(),
            combinations = combinations.len(),
            "Scoring factor combinations"
        );

        let scored: Vec<Result<FactorScore>> = combinations
            .into_par_iter()
            .map(|factors| {
                let outcome = self.analyzer.evaluate(&complete, &factors)?;
                Ok(FactorScore {
                    factors,
                    r2: outcome.r2,
                })
            })
            .collect();
        let scores = scored.into_iter().collect::<Result<Vec<_>>>()?;

        // Strictly greater keeps the earliest combination on ties
        let mut best: Option<&FactorScore> = None;
        for score in &scores {
            if score.r2 > best.map_or(0.0, |b| b.r2) {
                best = Some(score);
            }
        }

        if best.is_none() {
            warn!("No factor combination beat an R^2 of zero");
        }

        Ok(SelectionReport {
            best: best.cloned(),
            scores,
        })
    }
}

impl Default for FeatureSelector {
    fn default() -> Self {
        Self::new()
    }
}

/// All non-empty subsets, by size then lexicographic position.
pub fn combinations<T: Clone>(items: &[T]) -> Vec<Vec<T>> {
    let mut out = Vec::new();
    for size in 1..=items.len() {
        let mut indices: Vec<usize> = (0..size).collect();
        loop {
            out.push(indices.iter().map(|&i| items[i].clone()).collect());

            // Advance the rightmost index that still has room
            let mut pos = size;
            while pos > 0 && indices[pos - 1] == items.len() - size + pos - 1 {
                pos -= 1;
            }
            if pos == 0 {
                break;
            }
            indices[pos - 1] += 1;
            for j in pos..size {
                indices[j] = indices[j - 1] + 1;
            }
        }
    }
    out
}
