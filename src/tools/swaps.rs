//! Swap Tools
//!
//! Substitution suggestions for single foods and goal-directed rewriting of
//! logged meals.

use serde::Serialize;

use crate::db::{Database, DbError};
use crate::models::{FoodItem, Meal, NutrientGoal, NutrientKey};
use crate::nutrition::{suggest_alternatives as rank_alternatives, SwapEngine};
use super::goals::GoalView;
use super::meals::MealDetail;

/// Response for suggest_alternatives and tolerant_alternatives
#[derive(Debug, Serialize)]
pub struct AlternativesResponse {
    pub original: FoodItem,
    pub goal: GoalView,
    pub suggestions: Vec<FoodItem>,
}

/// One item swapped in a meal
#[derive(Debug, Serialize)]
pub struct ReplacementView {
    pub position: usize,
    pub original: String,
    pub replacement: String,
}

/// Response for apply_swap_to_meal
#[derive(Debug, Serialize)]
pub struct ApplySwapResponse {
    pub goal: GoalView,
    pub replacements: Vec<ReplacementView>,
    pub saved: bool,
    pub before: MealDetail,
    pub after: MealDetail,
}

fn load_goal(db: &Database, nutrient: &str) -> Result<NutrientGoal, String> {
    let key = NutrientKey::new(nutrient);
    db.with_conn(|conn| NutrientGoal::get(conn, &key))
        .map_err(|e| format!("Failed to read goal: {}", e))?
        .ok_or_else(|| format!("No goal set for '{}'", key))
}

fn load_food(db: &Database, id: i64) -> Result<FoodItem, String> {
    db.with_conn(|conn| FoodItem::get_by_id(conn, id))
        .map_err(|e| format!("Failed to get food item: {}", e))?
        .ok_or_else(|| format!("Food item {} not found", id))
}

/// Rank candidates the stored goal prefers over a food.
///
/// Candidates are the given ids in the given order, or the food's own group
/// pool when none are given. No tolerance band is applied.
pub fn suggest_alternatives(
    db: &Database,
    food_item_id: i64,
    nutrient: &str,
    candidate_ids: Option<Vec<i64>>,
) -> Result<AlternativesResponse, String> {
    let goal = load_goal(db, nutrient)?;
    let original = load_food(db, food_item_id)?;

    let candidates = match candidate_ids {
        Some(ids) => ids
            .into_iter()
            .map(|id| load_food(db, id))
            .collect::<Result<Vec<_>, _>>()?,
        None => match original.food_group.as_deref() {
            Some(group) => db
                .with_conn(|conn| FoodItem::list_by_group(conn, group))
                .map_err(|e| format!("Failed to list candidates: {}", e))?,
            None => Vec::new(),
        },
    };

    let suggestions = rank_alternatives(&original, &goal, &candidates);

    Ok(AlternativesResponse {
        goal: GoalView::from(&goal),
        original,
        suggestions,
    })
}

/// Every same-group candidate that clears the goal's target and keeps the
/// food's other nutrients within the tolerance band
pub fn tolerant_alternatives(db: &Database, food_item_id: i64, nutrient: &str) -> Result<AlternativesResponse, String> {
    let engine = SwapEngine::new(db);
    let goal = engine.require_goal(nutrient).map_err(|e| e.to_string())?;
    let original = load_food(db, food_item_id)?;

    let suggestions = engine
        .tolerant_alternatives(&original, &goal)
        .map_err(|e| format!("Failed to search alternatives: {}", e))?;

    Ok(AlternativesResponse {
        goal: GoalView::from(&goal),
        original,
        suggestions,
    })
}

/// Rewrite a logged meal toward the stored goal for `nutrient`.
///
/// With `save` the stored meal's items are replaced; otherwise the rewritten
/// meal is only returned.
pub fn apply_swap_to_meal(db: &Database, meal_id: i64, nutrient: &str, save: bool) -> Result<ApplySwapResponse, String> {
    let meal = db
        .with_conn(|conn| Meal::get_by_id(conn, meal_id))
        .map_err(|e| format!("Failed to get meal: {}", e))?
        .ok_or_else(|| format!("Meal {} not found", meal_id))?;

    let engine = SwapEngine::new(db);
    let outcome = engine.apply_goal_to_meal(&meal, nutrient).map_err(|e| match e {
        DbError::NotFound(msg) => msg,
        other => format!("Failed to apply swap: {}", other),
    })?;
    let goal = engine.require_goal(nutrient).map_err(|e| e.to_string())?;

    let saved = save && !outcome.replacements.is_empty();
    let after = if saved {
        let stored = db
            .with_conn(|conn| Meal::replace_items(conn, meal_id, outcome.meal.items()))
            .map_err(|e| format!("Failed to save swapped meal: {}", e))?;
        tracing::info!(meal_id, replacements = outcome.replacement_count(), "saved swapped meal");
        stored
    } else {
        outcome.meal.clone()
    };

    Ok(ApplySwapResponse {
        goal: GoalView::from(&goal),
        replacements: outcome
            .replacements
            .iter()
            .map(|r| ReplacementView {
                position: r.position,
                original: r.original.name.clone(),
                replacement: r.replacement.name.clone(),
            })
            .collect(),
        saved,
        before: meal.into(),
        after: after.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FoodItemCreate;
    use crate::tools::goals::set_goal;
    use crate::tools::meals::{get_meal, log_meal};
    use crate::tools::test_database;

    fn meat(db: &Database, name: &str, protein: f64, fat: f64, carbs: f64) -> i64 {
        db.with_conn(|conn| {
            FoodItem::create(conn, &FoodItemCreate {
                name: name.to_string(),
                food_group: Some("Meat".to_string()),
                nutrients: [
                    ("protein".to_string(), protein),
                    ("fat".to_string(), fat),
                    ("carbs".to_string(), carbs),
                ]
                .into_iter()
                .collect(),
            })
        })
        .unwrap()
        .id
        .unwrap()
    }

    #[test]
    fn test_suggest_alternatives_from_group_pool() {
        let db = test_database();
        let bacon = meat(&db, "Bacon", 10.0, 40.0, 1.0);
        meat(&db, "Chicken", 31.0, 3.6, 0.0);
        meat(&db, "Salami", 5.0, 30.0, 1.0);
        set_goal(&db, "protein", Some(20.0), Some(40.0)).unwrap();

        let result = suggest_alternatives(&db, bacon, "protein", None).unwrap();
        let names: Vec<&str> = result.suggestions.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Chicken"]);
    }

    #[test]
    fn test_suggest_alternatives_with_explicit_candidates() {
        let db = test_database();
        let bacon = meat(&db, "Bacon", 10.0, 40.0, 1.0);
        let chicken = meat(&db, "Chicken", 31.0, 3.6, 0.0);
        let turkey = meat(&db, "Turkey", 29.0, 1.0, 0.0);
        set_goal(&db, "protein", Some(20.0), Some(40.0)).unwrap();

        let result = suggest_alternatives(&db, bacon, "protein", Some(vec![turkey, bacon, chicken])).unwrap();
        let names: Vec<&str> = result.suggestions.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Turkey", "Chicken"]);

        assert!(suggest_alternatives(&db, bacon, "fiber", None).is_err());
    }

    #[test]
    fn test_apply_swap_to_meal_and_save() {
        let db = test_database();
        let bacon = meat(&db, "Bacon", 10.0, 10.0, 20.0);
        let steak = meat(&db, "Steak", 60.0, 15.0, 0.0);
        meat(&db, "Lean Turkey", 55.0, 10.5, 19.0);
        set_goal(&db, "protein", Some(50.0), None).unwrap();

        let meal_id = log_meal(&db, "2025-07-01", "dinner", vec![bacon, steak]).unwrap().meal.id.unwrap();

        let preview = apply_swap_to_meal(&db, meal_id, "protein", false).unwrap();
        assert_eq!(preview.replacements.len(), 1);
        assert!(!preview.saved);
        assert_eq!(get_meal(&db, meal_id).unwrap().unwrap().meal.items()[0].name, "Bacon");

        let saved = apply_swap_to_meal(&db, meal_id, "protein", true).unwrap();
        assert!(saved.saved);
        assert_eq!(saved.replacements[0].replacement, "Lean Turkey");
        let stored = get_meal(&db, meal_id).unwrap().unwrap();
        let names: Vec<&str> = stored.meal.items().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Lean Turkey", "Steak"]);
    }

    #[test]
    fn test_apply_swap_requires_goal() {
        let db = test_database();
        let bacon = meat(&db, "Bacon", 10.0, 10.0, 20.0);
        let meal_id = log_meal(&db, "2025-07-01", "dinner", vec![bacon]).unwrap().meal.id.unwrap();
        let err = apply_swap_to_meal(&db, meal_id, "protein", true).unwrap_err();
        assert!(err.contains("protein"));
        assert!(apply_swap_to_meal(&db, meal_id + 1, "protein", true).is_err());
    }

    #[test]
    fn test_tolerant_alternatives() {
        let db = test_database();
        let ham = meat(&db, "Ham", 10.0, 10.0, 10.0);
        meat(&db, "Fit", 55.0, 10.0, 10.0);
        meat(&db, "Greasy", 60.0, 30.0, 10.0);
        set_goal(&db, "protein", Some(50.0), None).unwrap();

        let result = tolerant_alternatives(&db, ham, "protein").unwrap();
        assert_eq!(result.suggestions.len(), 1);
        assert_eq!(result.suggestions[0].name, "Fit");
    }
}
