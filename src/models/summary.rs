//! Accumulated nutrient totals
//!
//! Used for meal totals, multi-meal sums and per-meal averages.

use std::collections::BTreeMap;
use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use super::{NutrientKey, NutrientLookup};

/// Additive map of nutrient name to accumulated amount.
///
/// Reading a nutrient that was never added yields `0.0`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NutritionSummary {
    nutrients: BTreeMap<NutrientKey, f64>,
}

impl NutritionSummary {
    /// Create an empty summary (every nutrient reads zero)
    pub fn zero() -> Self {
        Self::default()
    }

    /// Add an amount to one nutrient
    pub fn add(&mut self, nutrient: impl Into<NutrientKey>, amount: f64) {
        *self.nutrients.entry(nutrient.into()).or_insert(0.0) += amount;
    }

    /// Merge another summary into this one, nutrient by nutrient
    pub fn merge(&mut self, other: &NutritionSummary) {
        for (key, amount) in &other.nutrients {
            self.add(key, *amount);
        }
    }

    /// Divide every amount by `divisor`, e.g. to turn a multi-meal total into
    /// a per-meal average
    pub fn divided_by(&self, divisor: NonZeroUsize) -> Self {
        let d = divisor.get() as f64;
        Self {
            nutrients: self
                .nutrients
                .iter()
                .map(|(key, amount)| (key.clone(), amount / d))
                .collect(),
        }
    }

    /// Amount for a nutrient name, case-insensitive
    pub fn get(&self, nutrient: &str) -> f64 {
        self.amount(&NutrientKey::new(nutrient))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NutrientKey, f64)> {
        self.nutrients.iter().map(|(k, v)| (k, *v))
    }

    pub fn len(&self) -> usize {
        self.nutrients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nutrients.is_empty()
    }
}

impl NutrientLookup for NutritionSummary {
    fn amount(&self, key: &NutrientKey) -> f64 {
        self.nutrients.get(key).copied().unwrap_or(0.0)
    }
}

impl std::ops::Add for NutritionSummary {
    type Output = NutritionSummary;

    fn add(mut self, other: NutritionSummary) -> NutritionSummary {
        self.merge(&other);
        self
    }
}

impl std::iter::Sum for NutritionSummary {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(NutritionSummary::zero(), |acc, s| acc + s)
    }
}

impl<K: Into<NutrientKey>> FromIterator<(K, f64)> for NutritionSummary {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        let mut summary = NutritionSummary::zero();
        for (key, amount) in iter {
            summary.add(key, amount);
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_nutrient_reads_zero() {
        let summary = NutritionSummary::zero();
        assert_eq!(summary.get("protein"), 0.0);
        assert!(summary.is_empty());
    }

    #[test]
    fn test_add_accumulates_case_insensitively() {
        let mut summary = NutritionSummary::zero();
        summary.add("Protein", 10.0);
        summary.add("protein", 5.5);
        assert!((summary.get("PROTEIN") - 15.5).abs() < 1e-9);
        assert_eq!(summary.len(), 1);
    }

    #[test]
    fn test_merge_and_divide() {
        let mut total: NutritionSummary = [("calories", 100.0), ("fat", 3.0)].into_iter().collect();
        let other: NutritionSummary = [("calories", 200.0), ("fiber", 6.0)].into_iter().collect();
        total.merge(&other);

        let avg = total.divided_by(NonZeroUsize::new(2).unwrap());
        assert!((avg.get("calories") - 150.0).abs() < 1e-9);
        assert!((avg.get("fat") - 1.5).abs() < 1e-9);
        assert!((avg.get("fiber") - 3.0).abs() < 1e-9);
        // divided_by leaves the source untouched
        assert!((total.get("calories") - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_sum_of_summaries() {
        let parts = vec![
            [("sodium", 120.0)].into_iter().collect::<NutritionSummary>(),
            [("sodium", 80.0)].into_iter().collect::<NutritionSummary>(),
        ];
        let total: NutritionSummary = parts.into_iter().sum();
        assert!((total.get("sodium") - 200.0).abs() < 1e-9);
    }
}
