//! Food Item Tools
//!
//! Catalog management: adding foods and browsing candidate pools.

use serde::Serialize;

use crate::db::Database;
use crate::models::{FoodItem, FoodItemCreate};

/// Response for add_food_item
#[derive(Debug, Serialize)]
pub struct AddFoodItemResponse {
    pub id: i64,
    pub name: String,
    pub food_group: Option<String>,
    pub nutrient_count: usize,
}

/// Response for search_food_items and list_food_group
#[derive(Debug, Serialize)]
pub struct FoodItemListResponse {
    pub items: Vec<FoodItem>,
    pub total: usize,
}

/// Response for list_food_groups
#[derive(Debug, Serialize)]
pub struct FoodGroupsResponse {
    pub groups: Vec<String>,
}

/// Add a new food item
pub fn add_food_item(db: &Database, data: FoodItemCreate) -> Result<AddFoodItemResponse, String> {
    data.validate().map_err(|e| e.to_string())?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let item = FoodItem::create(&conn, &data)
        .map_err(|e| format!("Failed to create food item: {}", e))?;

    tracing::info!(id = ?item.id, name = %item.name, "added food item");

    Ok(AddFoodItemResponse {
        id: item.id.unwrap_or_default(),
        nutrient_count: item.nutrient_names().count(),
        name: item.name,
        food_group: item.food_group,
    })
}

/// Get a food item by ID
pub fn get_food_item(db: &Database, id: i64) -> Result<Option<FoodItem>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    FoodItem::get_by_id(&conn, id).map_err(|e| format!("Failed to get food item: {}", e))
}

/// Search food items by name
pub fn search_food_items(db: &Database, query: &str, limit: i64) -> Result<FoodItemListResponse, String> {
    let limit = limit.clamp(1, 100);
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let items = FoodItem::search(&conn, query, limit)
        .map_err(|e| format!("Failed to search food items: {}", e))?;

    Ok(FoodItemListResponse {
        total: items.len(),
        items,
    })
}

/// The candidate pool for a food group, in the order the swap search sees it
pub fn list_food_group(db: &Database, group: &str) -> Result<FoodItemListResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let items = FoodItem::list_by_group(&conn, group)
        .map_err(|e| format!("Failed to list food group: {}", e))?;

    Ok(FoodItemListResponse {
        total: items.len(),
        items,
    })
}

/// Distinct food groups in the catalog
pub fn list_food_groups(db: &Database) -> Result<FoodGroupsResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let groups = FoodItem::list_groups(&conn).map_err(|e| format!("Failed to list food groups: {}", e))?;
    Ok(FoodGroupsResponse { groups })
}
