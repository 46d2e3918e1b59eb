//! NutriSwap Tools module
//!
//! Tool implementations behind the MCP server. Each returns a serializable
//! response or a message suitable for showing to the caller.

pub mod analysis;
pub mod food_items;
pub mod goals;
pub mod meals;
pub mod status;
pub mod swaps;

use chrono::NaiveDate;

use crate::models::MealType;

/// Parse a YYYY-MM-DD date parameter
pub fn parse_date_param(name: &str, value: &str) -> Result<NaiveDate, String> {
    crate::models::parse_date(value)
        .map_err(|_| format!("{} must be an ISO date (YYYY-MM-DD), got '{}'", name, value))
}

/// Parse a meal type parameter; only breakfast, lunch, dinner and snack
pub fn parse_meal_type_param(value: &str) -> Result<MealType, String> {
    MealType::parse(value).ok_or_else(|| {
        format!("meal_type must be breakfast, lunch, dinner or snack, got '{}'", value)
    })
}

#[cfg(test)]
pub(crate) fn test_database() -> crate::db::Database {
    let db = crate::db::Database::in_memory().expect("in-memory database");
    db.with_conn(crate::db::migrations::run_migrations)
        .expect("migrations");
    db
}
