//! Goal-directed food substitution
//!
//! Two searches live here and they answer different questions:
//!
//! - [`suggest_alternatives`] ranks an explicit candidate list by the goal's
//!   directional preference. No tolerance band, no food-group scoping.
//! - [`find_swap_in`] is the constrained search used when rewriting a meal. A
//!   candidate must clear the goal's target threshold (MIN/MAX only) and keep
//!   every other nutrient of the original within the tolerance band. The first
//!   acceptable candidate in pool order wins.

use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};
use crate::models::{FoodItem, GoalKind, Meal, NutrientGoal, NutrientKey, NutrientLookup};
use super::NutritionSource;

/// Relative deviation allowed on non-target nutrients
pub const DEFAULT_TOLERANCE: f64 = 0.10;

/// Substitutions allowed per meal in one pass
pub const DEFAULT_MAX_REPLACEMENTS: usize = 2;

/// Limits applied by the constrained search and meal rewriting
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwapPolicy {
    pub tolerance: f64,
    pub max_replacements: usize,
}

impl Default for SwapPolicy {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            max_replacements: DEFAULT_MAX_REPLACEMENTS,
        }
    }
}

/// One substitution made in a meal
#[derive(Debug, Clone, Serialize)]
pub struct Replacement {
    pub position: usize,
    pub original: FoodItem,
    pub replacement: FoodItem,
}

/// A rewritten meal together with what changed
#[derive(Debug, Clone, Serialize)]
pub struct SwapOutcome {
    pub meal: Meal,
    pub replacements: Vec<Replacement>,
}

impl SwapOutcome {
    pub fn replacement_count(&self) -> usize {
        self.replacements.len()
    }
}

/// Every candidate that is not the original and that the goal prefers over it.
///
/// Pool order is kept; nothing is re-sorted by how much better a candidate is.
pub fn suggest_alternatives(original: &FoodItem, goal: &NutrientGoal, candidates: &[FoodItem]) -> Vec<FoodItem> {
    candidates
        .iter()
        .filter(|candidate| !candidate.same_food(original) && goal.prefers(candidate, original))
        .cloned()
        .collect()
}

/// Whether `candidate` clears the goal's target threshold.
///
/// MIN goals need at least the target, MAX goals at most the target. RANGE and
/// NONE goals have no threshold here.
pub fn clears_target(goal: &NutrientGoal, candidate: &FoodItem) -> bool {
    let value = candidate.amount(goal.nutrient());
    match goal.kind() {
        GoalKind::Min => value >= goal.target_amount(),
        GoalKind::Max => value <= goal.target_amount(),
        GoalKind::Range | GoalKind::None => true,
    }
}

/// Whether every nutrient of `original` other than `target` stays within
/// `tolerance` (relative) in `candidate`. Nutrients the original has at zero
/// are not checked.
pub fn within_tolerance(original: &FoodItem, candidate: &FoodItem, target: &NutrientKey, tolerance: f64) -> bool {
    original
        .nutrients()
        .filter(|(nutrient, _)| *nutrient != target)
        .all(|(nutrient, original_value)| {
            if original_value <= 0.0 {
                return true;
            }
            let deviation = (candidate.amount(nutrient) - original_value).abs() / original_value;
            deviation <= tolerance
        })
}

/// Constrained search over an explicit pool: first candidate that is not the
/// original, clears the target and stays within tolerance.
pub fn find_swap_in<'a>(
    original: &FoodItem,
    goal: &NutrientGoal,
    pool: &'a [FoodItem],
    tolerance: f64,
) -> Option<&'a FoodItem> {
    pool.iter().find(|candidate| {
        if candidate.same_food(original) {
            return false;
        }
        if !clears_target(goal, candidate) {
            tracing::debug!(candidate = %candidate.name, goal = %goal.nutrient(), "misses target");
            return false;
        }
        if !within_tolerance(original, candidate, goal.nutrient(), tolerance) {
            tracing::debug!(candidate = %candidate.name, original = %original.name, "outside tolerance band");
            return false;
        }
        true
    })
}

/// Substitution engine bound to a data source
pub struct SwapEngine<'a, S: NutritionSource + ?Sized> {
    source: &'a S,
    policy: SwapPolicy,
}

impl<'a, S: NutritionSource + ?Sized> SwapEngine<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self::with_policy(source, SwapPolicy::default())
    }

    pub fn with_policy(source: &'a S, policy: SwapPolicy) -> Self {
        Self { source, policy }
    }

    pub fn policy(&self) -> SwapPolicy {
        self.policy
    }

    fn pool_for(&self, original: &FoodItem) -> DbResult<Vec<FoodItem>> {
        match original.food_group.as_deref() {
            Some(group) => self.source.candidate_foods(group),
            None => Ok(Vec::new()),
        }
    }

    /// Constrained search within the original's food group
    pub fn find_swap(&self, original: &FoodItem, goal: &NutrientGoal) -> DbResult<Option<FoodItem>> {
        let pool = self.pool_for(original)?;
        Ok(find_swap_in(original, goal, &pool, self.policy.tolerance).cloned())
    }

    /// Every candidate in the original's food group that passes the constrained
    /// search's filters, in pool order
    pub fn tolerant_alternatives(&self, original: &FoodItem, goal: &NutrientGoal) -> DbResult<Vec<FoodItem>> {
        let pool = self.pool_for(original)?;
        Ok(pool
            .into_iter()
            .filter(|candidate| {
                !candidate.same_food(original)
                    && clears_target(goal, candidate)
                    && within_tolerance(original, candidate, goal.nutrient(), self.policy.tolerance)
            })
            .collect())
    }

    /// Rewrite a meal toward a goal.
    ///
    /// Items already satisfying the goal are kept. Unsatisfying items are
    /// replaced by the constrained search's pick when there is one. At most
    /// `max_replacements` items change; the input meal is left untouched.
    pub fn apply_swap_to_meal(&self, meal: &Meal, goal: &NutrientGoal) -> DbResult<SwapOutcome> {
        // no active bound: every item already meets it
        if goal.kind() == GoalKind::None {
            return Ok(SwapOutcome {
                meal: meal.clone(),
                replacements: Vec::new(),
            });
        }

        let mut items = Vec::with_capacity(meal.len());
        let mut replacements = Vec::new();

        for (position, item) in meal.items().iter().enumerate() {
            if replacements.len() >= self.policy.max_replacements || goal.is_satisfied_by(item) {
                items.push(item.clone());
                continue;
            }

            match self.find_swap(item, goal)? {
                Some(swap) => {
                    tracing::info!(
                        position,
                        original = %item.name,
                        replacement = %swap.name,
                        nutrient = %goal.nutrient(),
                        "swapped meal item"
                    );
                    replacements.push(Replacement {
                        position,
                        original: item.clone(),
                        replacement: swap.clone(),
                    });
                    items.push(swap);
                }
                None => items.push(item.clone()),
            }
        }

        Ok(SwapOutcome {
            meal: meal.with_items(items),
            replacements,
        })
    }

    /// Look up the stored goal for `nutrient` and rewrite the meal toward it.
    ///
    /// Errors with `NotFound` when no goal is set for that nutrient.
    pub fn apply_goal_to_meal(&self, meal: &Meal, nutrient: &str) -> DbResult<SwapOutcome> {
        let goal = self.require_goal(nutrient)?;
        self.apply_swap_to_meal(meal, &goal)
    }

    /// Stored goal for `nutrient`, or `NotFound`
    pub fn require_goal(&self, nutrient: &str) -> DbResult<NutrientGoal> {
        let key = NutrientKey::new(nutrient);
        self.source
            .goal(&key)?
            .ok_or_else(|| DbError::NotFound(format!("no goal set for '{}'", key)))
    }
}
