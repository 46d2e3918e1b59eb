//! Data models
//!
//! Value objects for foods, meals and goals, with their SQLite row mapping.

mod food_item;
mod goal;
mod meal;
mod nutrient;
mod summary;

pub use food_item::{FoodItem, FoodItemCreate};
pub use goal::{GoalError, GoalKind, GoalSet, NutrientGoal};
pub use meal::{parse_date, Meal, MealCreate, MealType};
pub use nutrient::{NutrientKey, NutrientLookup};
pub use summary::NutritionSummary;
