//! Goal evaluation for meals and aggregates

use crate::models::{GoalSet, Meal, NutrientGoal, NutrientLookup};

/// Goals the given totals fail, in goal-set order
pub fn unmet_goals<'g, L: NutrientLookup + ?Sized>(totals: &L, goals: &'g GoalSet) -> Vec<&'g NutrientGoal> {
    goals.iter().filter(|goal| !goal.is_satisfied_by(totals)).collect()
}

/// Goals the meal's total nutrition fails
pub fn evaluate_meal_against_goals(meal: &Meal, goals: &GoalSet) -> Vec<NutrientGoal> {
    let totals = meal.total_nutrition();
    unmet_goals(&totals, goals).into_iter().cloned().collect()
}
