//! Reference intake standard
//!
//! A fixed per-nutrient baseline that daily intake is compared against.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{NutrientKey, NutrientLookup};

/// Differences at or below this are treated as equal
pub const DIFFERENCE_EPSILON: f64 = 1e-6;

/// Standard daily amounts per nutrient
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceStandard {
    values: BTreeMap<NutrientKey, f64>,
}

impl ReferenceStandard {
    pub fn new<K: Into<NutrientKey>>(values: impl IntoIterator<Item = (K, f64)>) -> Self {
        Self {
            values: values.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Canada's Food Guide baseline
    pub fn canada_food_guide() -> Self {
        Self::new([("protein", 50.0), ("fiber", 30.0), ("vitaminC", 75.0)])
    }

    pub fn get(&self, nutrient: &str) -> Option<f64> {
        self.values.get(NutrientKey::new(nutrient).as_str()).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NutrientKey, f64)> {
        self.values.iter().map(|(k, v)| (k, *v))
    }

    /// `standard - actual` for each reference nutrient whose difference
    /// exceeds [`DIFFERENCE_EPSILON`]. Positive means a shortfall, negative a
    /// surplus. Nutrients outside the table are ignored.
    pub fn differences<L: NutrientLookup + ?Sized>(&self, actual: &L) -> BTreeMap<NutrientKey, f64> {
        self.values
            .iter()
            .filter_map(|(nutrient, standard)| {
                let diff = standard - actual.amount(nutrient);
                (diff.abs() > DIFFERENCE_EPSILON).then(|| (nutrient.clone(), diff))
            })
            .collect()
    }
}

impl Default for ReferenceStandard {
    fn default() -> Self {
        Self::canada_food_guide()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NutritionSummary;

    #[test]
    fn test_canada_food_guide_values() {
        let guide = ReferenceStandard::canada_food_guide();
        assert_eq!(guide.get("Protein"), Some(50.0));
        assert_eq!(guide.get("fiber"), Some(30.0));
        assert_eq!(guide.get("VITAMINC"), Some(75.0));
        assert_eq!(guide.get("sodium"), None);
    }

    #[test]
    fn test_differences_signed_and_filtered() {
        let guide = ReferenceStandard::canada_food_guide();
        let actual: NutritionSummary = [
            ("protein", 50.0000001),
            ("fiber", 40.0),
            ("sodium", 900.0),
        ]
        .into_iter()
        .collect();

        let diff = guide.differences(&actual);
        assert!(!diff.contains_key("protein"));
        assert!((diff["fiber"] - (-10.0)).abs() < 1e-9);
        assert!((diff["vitaminc"] - 75.0).abs() < 1e-9);
        assert!(!diff.contains_key("sodium"));
    }
}
