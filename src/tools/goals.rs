//! Goal Tools
//!
//! Setting nutrient goals and checking meals against them.

use serde::Serialize;

use crate::db::Database;
use crate::models::{GoalError, GoalKind, GoalSet, Meal, NutrientGoal, NutrientKey, NutritionSummary};
use crate::nutrition::evaluate_meal_against_goals;
use super::{parse_date_param, parse_meal_type_param};

/// A goal as shown to callers
#[derive(Debug, Serialize)]
pub struct GoalView {
    pub nutrient: String,
    pub kind: GoalKind,
    pub min: f64,
    /// None when open-ended
    pub max: Option<f64>,
    pub target_amount: f64,
}

impl From<&NutrientGoal> for GoalView {
    fn from(goal: &NutrientGoal) -> Self {
        Self {
            nutrient: goal.nutrient().to_string(),
            kind: goal.kind(),
            min: goal.min(),
            max: (goal.max() < f64::MAX).then_some(goal.max()),
            target_amount: goal.target_amount(),
        }
    }
}

/// Response for set_goal
#[derive(Debug, Serialize)]
pub struct SetGoalResponse {
    pub goal: GoalView,
    pub replaced: bool,
}

/// Response for list_goals
#[derive(Debug, Serialize)]
pub struct ListGoalsResponse {
    pub goals: Vec<GoalView>,
}

/// Response for evaluate_meal and unmet_goals_for_meal
#[derive(Debug, Serialize)]
pub struct EvaluateMealResponse {
    pub meal_id: Option<i64>,
    pub nutrition_total: NutritionSummary,
    pub unmet_goals: Vec<GoalView>,
    pub all_met: bool,
}

/// Build a goal from optional bounds; a missing min is 0 and a missing max
/// is open-ended
pub fn goal_from_params(nutrient: &str, min: Option<f64>, max: Option<f64>) -> Result<NutrientGoal, GoalError> {
    NutrientGoal::new(nutrient, min.unwrap_or(0.0), max.unwrap_or(f64::INFINITY))
}

/// Store a goal, replacing any earlier goal for the same nutrient
pub fn save_goal(db: &Database, goal: NutrientGoal) -> Result<SetGoalResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let replaced = NutrientGoal::get(&conn, goal.nutrient())
        .map_err(|e| format!("Failed to read goal: {}", e))?
        .is_some();
    goal.save(&conn).map_err(|e| format!("Failed to save goal: {}", e))?;

    tracing::info!(nutrient = %goal.nutrient(), kind = %goal.kind(), replaced, "goal set");

    Ok(SetGoalResponse {
        goal: GoalView::from(&goal),
        replaced,
    })
}

/// Set (or replace) the goal for a nutrient
pub fn set_goal(db: &Database, nutrient: &str, min: Option<f64>, max: Option<f64>) -> Result<SetGoalResponse, String> {
    let goal = goal_from_params(nutrient, min, max).map_err(|e| e.to_string())?;
    save_goal(db, goal)
}

/// All stored goals
pub fn list_goals(db: &Database) -> Result<ListGoalsResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let goals = GoalSet::load(&conn).map_err(|e| format!("Failed to load goals: {}", e))?;
    Ok(ListGoalsResponse {
        goals: goals.iter().map(GoalView::from).collect(),
    })
}

/// Remove the goal for one nutrient
pub fn remove_goal(db: &Database, nutrient: &str) -> Result<bool, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    NutrientGoal::delete(&conn, &NutrientKey::new(nutrient)).map_err(|e| format!("Failed to remove goal: {}", e))
}

/// Remove every goal
pub fn clear_goals(db: &Database) -> Result<usize, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    GoalSet::clear_stored(&conn).map_err(|e| format!("Failed to clear goals: {}", e))
}

fn evaluate(conn: &rusqlite::Connection, meal: &Meal) -> Result<EvaluateMealResponse, String> {
    let goals = GoalSet::load(conn).map_err(|e| format!("Failed to load goals: {}", e))?;
    let unmet = evaluate_meal_against_goals(meal, &goals);
    Ok(EvaluateMealResponse {
        meal_id: meal.id,
        nutrition_total: meal.total_nutrition(),
        all_met: unmet.is_empty(),
        unmet_goals: unmet.iter().map(GoalView::from).collect(),
    })
}

/// Check a stored meal against every stored goal
pub fn evaluate_meal(db: &Database, meal_id: i64) -> Result<EvaluateMealResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let meal = Meal::get_by_id(&conn, meal_id)
        .map_err(|e| format!("Failed to get meal: {}", e))?
        .ok_or_else(|| format!("Meal {} not found", meal_id))?;
    evaluate(&conn, &meal)
}

/// Check the first meal of a type on a date against every stored goal.
///
/// A date with no such meal evaluates an empty meal.
pub fn unmet_goals_for_meal(db: &Database, date: &str, meal_type: &str) -> Result<EvaluateMealResponse, String> {
    let date = parse_date_param("date", date)?;
    let meal_type = parse_meal_type_param(meal_type)?;
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let meal = Meal::find_by_type(&conn, date, meal_type)
        .map_err(|e| format!("Failed to find meal: {}", e))?
        .unwrap_or_else(|| Meal::new(meal_type, date));
    evaluate(&conn, &meal)
}
