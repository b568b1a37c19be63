use chrono::NaiveDate;
use std::collections::{BTreeSet, HashSet};

use crate::models::UvObservation;

/// The full table of observations, loaded once and never mutated.
#[derive(Debug, Clone, Default)]
pub struct UvDataset {
    observations: Vec<UvObservation>,
    states: Vec<String>,
}

impl UvDataset {
    pub fn new(observations: Vec<UvObservation>) -> Self {
        let mut seen = HashSet::new();
        let states = observations
            .iter()
            .filter(|o| seen.insert(o.name.as_str()))
            .map(|o| o.name.clone())
            .collect();

        Self {
            observations,
            states,
        }
    }

    pub fn observations(&self) -> &[UvObservation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// State names in order of first appearance.
    pub fn states(&self) -> &[String] {
        &self.states
    }

    pub fn default_state(&self) -> Option<&str> {
        self.states.first().map(String::as_str)
    }

    /// All rows for a state, in file order. Unknown names give an empty slice.
    pub fn for_state(&self, name: &str) -> Vec<&UvObservation> {
        self.observations.iter().filter(|o| o.name == name).collect()
    }

    /// Rows for a state with `start <= date <= end`.
    pub fn for_state_between(
        &self,
        name: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<&UvObservation> {
        self.observations
            .iter()
            .filter(|o| o.name == name && o.date >= start && o.date <= end)
            .collect()
    }

    pub fn on_date(&self, date: NaiveDate) -> Vec<&UvObservation> {
        self.observations.iter().filter(|o| o.date == date).collect()
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.observations.iter().any(|o| o.date == date)
    }

    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.observations.iter().map(|o| o.date).min()?;
        let max = self.observations.iter().map(|o| o.date).max()?;
        Some((min, max))
    }

    /// Distinct years, ascending.
    pub fn years(&self) -> Vec<i32> {
        self.observations
            .iter()
            .map(|o| o.year())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
