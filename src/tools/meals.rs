//! Meal Tools
//!
//! Logging meals and reading them back.

use serde::Serialize;

use crate::db::Database;
use crate::models::{Meal, MealCreate, NutritionSummary};
use super::{parse_date_param, parse_meal_type_param};

/// A meal together with its derived totals
#[derive(Debug, Serialize)]
pub struct MealDetail {
    pub meal: Meal,
    pub nutrition_total: NutritionSummary,
}

impl From<Meal> for MealDetail {
    fn from(meal: Meal) -> Self {
        Self {
            nutrition_total: meal.total_nutrition(),
            meal,
        }
    }
}

/// Response for list_meals
#[derive(Debug, Serialize)]
pub struct ListMealsResponse {
    pub date: String,
    pub meals: Vec<MealDetail>,
    pub day_total: NutritionSummary,
}

/// Log a meal from catalog food item ids
pub fn log_meal(db: &Database, date: &str, meal_type: &str, food_item_ids: Vec<i64>) -> Result<MealDetail, String> {
    let date = parse_date_param("date", date)?;
    let meal_type = parse_meal_type_param(meal_type)?;
    if food_item_ids.is_empty() {
        return Err("A meal needs at least one food item".to_string());
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let meal = Meal::create(&conn, &MealCreate {
        date,
        meal_type,
        food_item_ids,
    })
    .map_err(|e| format!("Failed to log meal: {}", e))?;

    tracing::info!(id = ?meal.id, %date, items = meal.len(), "logged meal");

    Ok(meal.into())
}

/// Get a meal by ID
pub fn get_meal(db: &Database, id: i64) -> Result<Option<MealDetail>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let meal = Meal::get_by_id(&conn, id).map_err(|e| format!("Failed to get meal: {}", e))?;
    Ok(meal.map(MealDetail::from))
}

/// All meals logged on a date
pub fn list_meals(db: &Database, date: &str) -> Result<ListMealsResponse, String> {
    let parsed = parse_date_param("date", date)?;
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let meals = Meal::list_for_date(&conn, parsed).map_err(|e| format!("Failed to list meals: {}", e))?;
    let day_total = crate::nutrition::total_nutrition(&meals);

    Ok(ListMealsResponse {
        date: date.trim().to_string(),
        meals: meals.into_iter().map(MealDetail::from).collect(),
        day_total,
    })
}

/// Delete a meal
pub fn delete_meal(db: &Database, id: i64) -> Result<bool, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    Meal::delete(&conn, id).map_err(|e| format!("Failed to delete meal: {}", e))
}
