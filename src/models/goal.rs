//! Nutrient goal model
//!
//! A goal bounds one nutrient from below, above, or both. Its kind is derived
//! from which bounds are active every time it is asked for.

use std::collections::BTreeMap;
use std::fmt;

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::DbResult;
use super::{FoodItem, NutrientKey, NutrientLookup};

/// Rejected goal configurations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GoalError {
    #[error("goal nutrient name cannot be empty")]
    EmptyNutrient,

    #[error("bounds for '{nutrient}' must be numbers")]
    NotANumber { nutrient: String },

    #[error("minimum for '{nutrient}' must be finite")]
    InfiniteMinimum { nutrient: String },

    #[error("minimum for '{nutrient}' cannot be negative (got {min})")]
    NegativeMinimum { nutrient: String, min: f64 },

    #[error("minimum {min} for '{nutrient}' is above maximum {max}")]
    InvertedBounds { nutrient: String, min: f64, max: f64 },
}

/// Which bounds of a goal are active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GoalKind {
    /// Only a lower bound
    Min,
    /// Only an upper bound
    Max,
    /// Both bounds
    Range,
    /// Neither bound
    None,
}

impl GoalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalKind::Min => "MIN",
            GoalKind::Max => "MAX",
            GoalKind::Range => "RANGE",
            GoalKind::None => "NONE",
        }
    }
}

impl fmt::Display for GoalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target for one nutrient.
///
/// A minimum of `0.0` and a maximum of `f64::INFINITY` (or `f64::MAX`) are the
/// open-ended defaults and count as inactive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NutrientGoal {
    nutrient: NutrientKey,
    min: f64,
    max: f64,
}

impl NutrientGoal {
    /// Build a goal, rejecting NaN, infinite or negative minimums and inverted
    /// bounds
    pub fn new(nutrient: impl Into<NutrientKey>, min: f64, max: f64) -> Result<Self, GoalError> {
        let nutrient = nutrient.into();
        if nutrient.is_empty() {
            return Err(GoalError::EmptyNutrient);
        }
        if min.is_nan() || max.is_nan() {
            return Err(GoalError::NotANumber { nutrient: nutrient.to_string() });
        }
        if min.is_infinite() && min > 0.0 {
            return Err(GoalError::InfiniteMinimum { nutrient: nutrient.to_string() });
        }
        if min < 0.0 {
            return Err(GoalError::NegativeMinimum { nutrient: nutrient.to_string(), min });
        }
        if min > max {
            return Err(GoalError::InvertedBounds { nutrient: nutrient.to_string(), min, max });
        }
        Ok(Self { nutrient, min, max })
    }

    /// Goal with only a lower bound
    pub fn at_least(nutrient: impl Into<NutrientKey>, min: f64) -> Result<Self, GoalError> {
        Self::new(nutrient, min, f64::INFINITY)
    }

    /// Goal with only an upper bound
    pub fn at_most(nutrient: impl Into<NutrientKey>, max: f64) -> Result<Self, GoalError> {
        Self::new(nutrient, 0.0, max)
    }

    pub fn nutrient(&self) -> &NutrientKey {
        &self.nutrient
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    fn has_min(&self) -> bool {
        self.min > 0.0
    }

    fn has_max(&self) -> bool {
        self.max < f64::MAX
    }

    /// Classify the goal from its active bounds. Both active is always RANGE.
    pub fn kind(&self) -> GoalKind {
        match (self.has_min(), self.has_max()) {
            (true, true) => GoalKind::Range,
            (true, false) => GoalKind::Min,
            (false, true) => GoalKind::Max,
            (false, false) => GoalKind::None,
        }
    }

    /// The single ideal value: the minimum for MIN goals, the maximum otherwise
    pub fn target_amount(&self) -> f64 {
        match self.kind() {
            GoalKind::Min => self.min,
            _ => self.max,
        }
    }

    /// `min <= value <= max`
    pub fn is_satisfied_by_value(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }

    /// Range test on this goal's nutrient, wherever the amount comes from
    pub fn is_satisfied_by<L: NutrientLookup + ?Sized>(&self, source: &L) -> bool {
        self.is_satisfied_by_value(source.amount(&self.nutrient))
    }

    /// Directional preference between two amounts of this goal's nutrient.
    ///
    /// MIN prefers the lower amount, MAX the higher, RANGE whichever is
    /// strictly closer to the midpoint of the bounds. NONE never prefers.
    pub fn is_better_choice(&self, candidate: f64, original: f64) -> bool {
        match self.kind() {
            GoalKind::Min => candidate < original,
            GoalKind::Max => candidate > original,
            GoalKind::Range => {
                let midpoint = (self.min + self.max) / 2.0;
                (candidate - midpoint).abs() < (original - midpoint).abs()
            }
            GoalKind::None => false,
        }
    }

    /// [`is_better_choice`](Self::is_better_choice) applied to two foods
    pub fn prefers(&self, candidate: &FoodItem, original: &FoodItem) -> bool {
        self.is_better_choice(candidate.amount(&self.nutrient), original.amount(&self.nutrient))
    }
}

impl<'de> Deserialize<'de> for NutrientGoal {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            nutrient: String,
            #[serde(default)]
            min: f64,
            #[serde(default)]
            max: Option<f64>,
        }

        let raw = Raw::deserialize(deserializer)?;
        NutrientGoal::new(raw.nutrient.as_str(), raw.min, raw.max.unwrap_or(f64::INFINITY))
            .map_err(serde::de::Error::custom)
    }
}

/// The user's goals, one per nutrient. Setting a goal for a nutrient that
/// already has one replaces it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GoalSet {
    goals: BTreeMap<NutrientKey, NutrientGoal>,
}

impl GoalSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace; returns the goal that was replaced, if any
    pub fn set(&mut self, goal: NutrientGoal) -> Option<NutrientGoal> {
        self.goals.insert(goal.nutrient.clone(), goal)
    }

    pub fn get(&self, nutrient: &str) -> Option<&NutrientGoal> {
        self.goals.get(NutrientKey::new(nutrient).as_str())
    }

    pub fn remove(&mut self, nutrient: &str) -> Option<NutrientGoal> {
        self.goals.remove(NutrientKey::new(nutrient).as_str())
    }

    pub fn clear(&mut self) {
        self.goals.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &NutrientGoal> {
        self.goals.values()
    }

    pub fn len(&self) -> usize {
        self.goals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.goals.is_empty()
    }
}

impl FromIterator<NutrientGoal> for GoalSet {
    fn from_iter<I: IntoIterator<Item = NutrientGoal>>(iter: I) -> Self {
        let mut set = GoalSet::new();
        for goal in iter {
            set.set(goal);
        }
        set
    }
}

// ============================================================================
// Persistence
// ============================================================================

impl NutrientGoal {
    fn from_row(row: &Row) -> rusqlite::Result<(String, f64, Option<f64>)> {
        Ok((row.get("nutrient")?, row.get("min_amount")?, row.get("max_amount")?))
    }

    fn from_stored(nutrient: String, min: f64, max: Option<f64>) -> DbResult<Self> {
        Ok(Self::new(nutrient, min, max.unwrap_or(f64::INFINITY))?)
    }

    /// Insert or replace the stored goal for this nutrient
    pub fn save(&self, conn: &Connection) -> DbResult<()> {
        let max = if self.has_max() { Some(self.max) } else { None };
        conn.execute(
            r#"
            INSERT INTO nutrient_goals (nutrient, min_amount, max_amount)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(nutrient) DO UPDATE SET
                min_amount = excluded.min_amount,
                max_amount = excluded.max_amount,
                updated_at = datetime('now')
            "#,
            params![self.nutrient.as_str(), self.min, max],
        )?;
        Ok(())
    }

    /// Stored goal for a nutrient
    pub fn get(conn: &Connection, nutrient: &NutrientKey) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM nutrient_goals WHERE nutrient = ?1")?;

        let result = stmt.query_row([nutrient.as_str()], Self::from_row);
        match result {
            Ok((name, min, max)) => Ok(Some(Self::from_stored(name, min, max)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete the stored goal for a nutrient
    pub fn delete(conn: &Connection, nutrient: &NutrientKey) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM nutrient_goals WHERE nutrient = ?1", [nutrient.as_str()])?;
        Ok(rows > 0)
    }
}

impl GoalSet {
    /// Load every stored goal
    pub fn load(conn: &Connection) -> DbResult<Self> {
        let mut stmt = conn.prepare("SELECT * FROM nutrient_goals ORDER BY nutrient ASC")?;
        let rows = stmt
            .query_map([], NutrientGoal::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut set = GoalSet::new();
        for (name, min, max) in rows {
            set.set(NutrientGoal::from_stored(name, min, max)?);
        }
        Ok(set)
    }

    /// Delete every stored goal, returning how many were removed
    pub fn clear_stored(conn: &Connection) -> DbResult<usize> {
        Ok(conn.execute("DELETE FROM nutrient_goals", [])?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::models::NutritionSummary;

    #[test]
    fn test_kind_from_active_bounds() {
        assert_eq!(NutrientGoal::at_least("protein", 50.0).unwrap().kind(), GoalKind::Min);
        assert_eq!(NutrientGoal::at_most("sodium", 2300.0).unwrap().kind(), GoalKind::Max);
        assert_eq!(NutrientGoal::new("fiber", 25.0, 35.0).unwrap().kind(), GoalKind::Range);
        assert_eq!(NutrientGoal::new("sugar", 0.0, f64::INFINITY).unwrap().kind(), GoalKind::None);
        assert_eq!(NutrientGoal::new("sugar", 0.0, f64::MAX).unwrap().kind(), GoalKind::None);
    }

    #[test]
    fn test_equal_bounds_are_still_range() {
        let goal = NutrientGoal::new("protein", 40.0, 40.0).unwrap();
        assert_eq!(goal.kind(), GoalKind::Range);
        assert!(goal.is_satisfied_by_value(40.0));
    }

    #[test]
    fn test_target_amount() {
        assert_eq!(NutrientGoal::at_least("protein", 50.0).unwrap().target_amount(), 50.0);
        assert_eq!(NutrientGoal::at_most("fat", 70.0).unwrap().target_amount(), 70.0);
        assert_eq!(NutrientGoal::new("fiber", 25.0, 35.0).unwrap().target_amount(), 35.0);
    }

    #[test]
    fn test_invalid_goals_fail_fast() {
        assert_eq!(NutrientGoal::new("  ", 1.0, 2.0), Err(GoalError::EmptyNutrient));
        assert!(matches!(NutrientGoal::new("fat", f64::NAN, 2.0), Err(GoalError::NotANumber { .. })));
        assert!(matches!(NutrientGoal::new("fat", -1.0, 2.0), Err(GoalError::NegativeMinimum { .. })));
        assert!(matches!(NutrientGoal::new("fat", 5.0, 2.0), Err(GoalError::InvertedBounds { .. })));
        assert!(matches!(
            NutrientGoal::new("fat", f64::INFINITY, f64::INFINITY),
            Err(GoalError::InfiniteMinimum { .. })
        ));
        assert!(matches!(NutrientGoal::at_least("fat", f64::INFINITY), Err(GoalError::InfiniteMinimum { .. })));
    }

    #[test]
    fn test_satisfaction_is_a_range_test() {
        let goal = NutrientGoal::at_least("Protein", 50.0).unwrap();
        assert!(!goal.is_satisfied_by(&FoodItem::new("Beans").with_nutrient("protein", 30.0)));
        assert!(goal.is_satisfied_by(&FoodItem::new("Steak").with_nutrient("protein", 60.0)));
        assert!(goal.is_satisfied_by_value(50.0));

        let summary: NutritionSummary = [("protein", 49.9)].into_iter().collect();
        assert!(!goal.is_satisfied_by(&summary));
    }

    #[test]
    fn test_none_goal_accepts_everything() {
        let goal = NutrientGoal::new("sugar", 0.0, f64::INFINITY).unwrap();
        assert!(goal.is_satisfied_by_value(0.0));
        assert!(goal.is_satisfied_by_value(1e12));
        assert!(!goal.is_better_choice(1.0, 2.0));
        assert!(!goal.is_better_choice(2.0, 1.0));
    }

    #[test]
    fn test_directional_preference() {
        let min = NutrientGoal::at_least("protein", 50.0).unwrap();
        assert!(min.is_better_choice(10.0, 20.0));
        assert!(!min.is_better_choice(20.0, 10.0));
        assert!(!min.is_better_choice(10.0, 10.0));

        let max = NutrientGoal::at_most("fat", 20.0).unwrap();
        assert!(max.is_better_choice(15.0, 5.0));
        assert!(!max.is_better_choice(5.0, 15.0));
    }

    #[test]
    fn test_range_preference_is_symmetric_around_midpoint() {
        let goal = NutrientGoal::new("protein", 20.0, 40.0).unwrap();
        // midpoint 30
        assert!(goal.is_better_choice(31.0, 18.0));
        assert!(goal.is_better_choice(29.0, 42.0));
        assert!(!goal.is_better_choice(25.0, 35.0));
        assert!(!goal.is_better_choice(35.0, 25.0));
        assert!(!goal.is_better_choice(50.0, 28.0));
    }

    #[test]
    fn test_goal_set_replaces_on_set() {
        let mut goals = GoalSet::new();
        assert!(goals.set(NutrientGoal::at_least("protein", 50.0).unwrap()).is_none());
        let replaced = goals.set(NutrientGoal::at_least("PROTEIN", 60.0).unwrap());
        assert_eq!(replaced.map(|g| g.min()), Some(50.0));
        assert_eq!(goals.len(), 1);
        assert_eq!(goals.get("Protein").map(|g| g.min()), Some(60.0));

        goals.clear();
        assert!(goals.is_empty());
    }

    #[test]
    fn test_deserialize_validates() {
        let goal: NutrientGoal = serde_json::from_str(r#"{"nutrient": "Fiber", "min": 25}"#).unwrap();
        assert_eq!(goal.kind(), GoalKind::Min);
        assert!(serde_json::from_str::<NutrientGoal>(r#"{"nutrient": "fat", "min": 9, "max": 3}"#).is_err());
    }

    #[test]
    fn test_goal_persistence() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        NutrientGoal::at_least("protein", 50.0).unwrap().save(&conn).unwrap();
        NutrientGoal::new("fiber", 25.0, 35.0).unwrap().save(&conn).unwrap();
        NutrientGoal::at_most("Protein", 120.0).unwrap().save(&conn).unwrap();

        let protein = NutrientGoal::get(&conn, &NutrientKey::new("protein")).unwrap().unwrap();
        assert_eq!(protein.kind(), GoalKind::Max);
        assert_eq!(protein.max(), 120.0);

        let goals = GoalSet::load(&conn).unwrap();
        assert_eq!(goals.len(), 2);
        assert_eq!(goals.get("fiber").map(|g| g.kind()), Some(GoalKind::Range));

        assert!(NutrientGoal::delete(&conn, &NutrientKey::new("fiber")).unwrap());
        assert_eq!(GoalSet::clear_stored(&conn).unwrap(), 1);
        assert!(GoalSet::load(&conn).unwrap().is_empty());
    }
}
