//! Nutrient names
//!
//! Nutrient maps are keyed case-insensitively. The key is folded once when it
//! is built so lookups never re-normalise.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A case-folded nutrient name ("Protein", "PROTEIN" and "protein" are one key)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct NutrientKey(String);

impl NutrientKey {
    pub fn new(name: &str) -> Self {
        Self(name.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for NutrientKey {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for NutrientKey {
    fn from(name: String) -> Self {
        Self::new(&name)
    }
}

impl From<&NutrientKey> for NutrientKey {
    fn from(key: &NutrientKey) -> Self {
        key.clone()
    }
}

impl From<NutrientKey> for String {
    fn from(key: NutrientKey) -> Self {
        key.0
    }
}

impl Borrow<str> for NutrientKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NutrientKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Anything that can report an amount for a nutrient.
///
/// Missing nutrients read as zero; nutrient maps are sparse.
pub trait NutrientLookup {
    fn amount(&self, key: &NutrientKey) -> f64;
}
