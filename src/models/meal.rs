//! Meal model
//!
//! An ordered list of food items eaten together on one date.

use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};
use super::{FoodItem, NutritionSummary};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Meal type enum
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
    #[default]
    Unspecified,
}

impl MealType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
            MealType::Unspecified => "unspecified",
        }
    }

    /// One of the four named meal types, case-insensitive
    pub fn parse(s: &str) -> Option<Self> {
        match Self::from_str(s) {
            MealType::Unspecified => None,
            known => Some(known),
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "breakfast" => MealType::Breakfast,
            "lunch" => MealType::Lunch,
            "dinner" => MealType::Dinner,
            "snack" => MealType::Snack,
            _ => MealType::Unspecified,
        }
    }
}

/// A logged meal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meal {
    pub id: Option<i64>,
    pub meal_type: MealType,
    pub date: NaiveDate,
    items: Vec<FoodItem>,
}

/// Data for logging a meal from catalog food items
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealCreate {
    pub date: NaiveDate,
    pub meal_type: MealType,
    pub food_item_ids: Vec<i64>,
}

impl Meal {
    pub fn new(meal_type: MealType, date: NaiveDate) -> Self {
        Self {
            id: None,
            meal_type,
            date,
            items: Vec::new(),
        }
    }

    pub fn with_item(mut self, item: FoodItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn add_item(&mut self, item: FoodItem) {
        self.items.push(item);
    }

    pub fn items(&self) -> &[FoodItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Same meal (id, type, date) holding a different item sequence
    pub fn with_items(&self, items: Vec<FoodItem>) -> Self {
        Self {
            id: self.id,
            meal_type: self.meal_type,
            date: self.date,
            items,
        }
    }

    /// Sum of every item's nutrients. Always derived, never stored.
    pub fn total_nutrition(&self) -> NutritionSummary {
        let mut summary = NutritionSummary::zero();
        for item in &self.items {
            for (nutrient, amount) in item.nutrients() {
                summary.add(nutrient, amount);
            }
        }
        summary
    }
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse an ISO date ("2025-01-09")
pub fn parse_date(s: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
}

// ============================================================================
// Persistence
// ============================================================================

impl Meal {
    /// Create from a database row (items are loaded separately)
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let date_str: String = row.get("date")?;
        let date = parse_date(&date_str)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?;
        let meal_type_str: String = row.get("meal_type")?;
        Ok(Self {
            id: Some(row.get("id")?),
            meal_type: MealType::from_str(&meal_type_str),
            date,
            items: Vec::new(),
        })
    }

    fn load_items(conn: &Connection, mut meal: Self) -> DbResult<Self> {
        let Some(id) = meal.id else {
            return Ok(meal);
        };
        let mut stmt = conn.prepare(
            "SELECT food_item_id FROM meal_items WHERE meal_id = ?1 ORDER BY position ASC",
        )?;
        let food_ids = stmt
            .query_map([id], |row| row.get::<_, i64>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        for food_id in food_ids {
            let item = FoodItem::get_by_id(conn, food_id)?
                .ok_or_else(|| DbError::NotFound(format!("food item {}", food_id)))?;
            meal.items.push(item);
        }
        Ok(meal)
    }

    fn hydrate(conn: &Connection, meals: Vec<Self>) -> DbResult<Vec<Self>> {
        meals
            .into_iter()
            .map(|meal| Self::load_items(conn, meal))
            .collect()
    }

    fn write_items(conn: &Connection, meal_id: i64, food_ids: &[i64]) -> DbResult<()> {
        let mut stmt = conn.prepare(
            "INSERT INTO meal_items (meal_id, position, food_item_id) VALUES (?1, ?2, ?3)",
        )?;
        for (position, food_id) in food_ids.iter().enumerate() {
            stmt.execute(params![meal_id, position as i64, food_id])?;
        }
        Ok(())
    }

    /// Log a new meal
    pub fn create(conn: &Connection, data: &MealCreate) -> DbResult<Self> {
        for food_id in &data.food_item_ids {
            if FoodItem::get_by_id(conn, *food_id)?.is_none() {
                return Err(DbError::NotFound(format!("food item {}", food_id)));
            }
        }

        let tx = conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO meals (date, meal_type) VALUES (?1, ?2)",
            params![format_date(data.date), data.meal_type.as_str()],
        )?;
        let id = tx.last_insert_rowid();
        Self::write_items(&tx, id, &data.food_item_ids)?;
        tx.commit()?;

        Self::get_by_id(conn, id)?.ok_or_else(|| {
            DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Get a meal by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM meals WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(meal) => Ok(Some(Self::load_items(conn, meal)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Meals dated within `[start, end]`, ordered by date then log order
    pub fn list_in_range(conn: &Connection, start: NaiveDate, end: NaiveDate) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM meals WHERE date >= ?1 AND date <= ?2 ORDER BY date ASC, id ASC",
        )?;

        let meals = stmt
            .query_map(params![format_date(start), format_date(end)], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Self::hydrate(conn, meals)
    }

    /// Meals logged on one date
    pub fn list_for_date(conn: &Connection, date: NaiveDate) -> DbResult<Vec<Self>> {
        Self::list_in_range(conn, date, date)
    }

    /// First meal of the given type on a date
    pub fn find_by_type(conn: &Connection, date: NaiveDate, meal_type: MealType) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM meals WHERE date = ?1 AND meal_type = ?2 ORDER BY id ASC LIMIT 1",
        )?;

        let result = stmt.query_row(params![format_date(date), meal_type.as_str()], Self::from_row);
        match result {
            Ok(meal) => Ok(Some(Self::load_items(conn, meal)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Replace a stored meal's item sequence wholesale.
    ///
    /// Every item must be a catalog food item (carry an id).
    pub fn replace_items(conn: &Connection, meal_id: i64, items: &[FoodItem]) -> DbResult<Self> {
        let food_ids = items
            .iter()
            .map(|item| {
                item.id.ok_or_else(|| {
                    DbError::InvalidData(format!("food item '{}' is not in the catalog", item.name))
                })
            })
            .collect::<DbResult<Vec<i64>>>()?;

        if Self::get_by_id(conn, meal_id)?.is_none() {
            return Err(DbError::NotFound(format!("meal {}", meal_id)));
        }

        let tx = conn.unchecked_transaction()?;
        tx.execute("DELETE FROM meal_items WHERE meal_id = ?1", [meal_id])?;
        Self::write_items(&tx, meal_id, &food_ids)?;
        tx.commit()?;

        Self::get_by_id(conn, meal_id)?.ok_or_else(|| DbError::NotFound(format!("meal {}", meal_id)))
    }

    /// Delete a meal and its items
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM meals WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}
