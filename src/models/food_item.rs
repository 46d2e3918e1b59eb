//! Food Item model
//!
//! A named bag of nutrient amounts, optionally tied to a catalog row and a
//! food group.

use std::collections::BTreeMap;

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};
use super::{NutrientKey, NutrientLookup};

/// A food with its nutrient amounts.
///
/// Two food items are equal when they share a catalog id, or, when either has
/// no id, when their names match ignoring case. Nutrient content plays no part
/// in equality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodItem {
    pub id: Option<i64>,
    pub name: String,
    pub food_group: Option<String>,
    nutrients: BTreeMap<NutrientKey, f64>,
}

/// Data for creating a catalog food item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodItemCreate {
    pub name: String,
    pub food_group: Option<String>,
    #[serde(default)]
    pub nutrients: BTreeMap<String, f64>,
}

impl FoodItemCreate {
    /// Reject a blank name or group, blank nutrient names, and amounts that are
    /// negative or not finite
    pub fn validate(&self) -> DbResult<()> {
        if self.name.trim().is_empty() {
            return Err(DbError::InvalidData("food item name cannot be empty".to_string()));
        }
        if let Some(group) = &self.food_group {
            if group.trim().is_empty() {
                return Err(DbError::InvalidData(format!(
                    "food_group for '{}' cannot be blank (omit it instead)",
                    self.name.trim()
                )));
            }
        }
        for (nutrient, amount) in &self.nutrients {
            if nutrient.trim().is_empty() {
                return Err(DbError::InvalidData("nutrient names cannot be empty".to_string()));
            }
            if !amount.is_finite() {
                return Err(DbError::InvalidData(format!("{} must be a finite number", nutrient)));
            }
            if *amount < 0.0 {
                return Err(DbError::InvalidData(format!("{} cannot be negative (got {})", nutrient, amount)));
            }
        }
        Ok(())
    }
}

impl FoodItem {
    /// Create a food item with no nutrients and no catalog id
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            food_group: None,
            nutrients: BTreeMap::new(),
        }
    }

    /// Shorthand for the common macro set (calories, protein, fat, carbs)
    pub fn with_macros(name: impl Into<String>, calories: f64, protein: f64, fat: f64, carbs: f64) -> Self {
        Self::new(name)
            .with_nutrient("calories", calories)
            .with_nutrient("protein", protein)
            .with_nutrient("fat", fat)
            .with_nutrient("carbs", carbs)
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.food_group = Some(group.into());
        self
    }

    pub fn with_nutrient(mut self, nutrient: impl Into<NutrientKey>, amount: f64) -> Self {
        self.add_nutrient(nutrient, amount);
        self
    }

    /// Set a nutrient amount, replacing any previous value for that nutrient
    pub fn add_nutrient(&mut self, nutrient: impl Into<NutrientKey>, amount: f64) {
        self.nutrients.insert(nutrient.into(), amount);
    }

    /// Amount of a nutrient by name, case-insensitive; zero when absent
    pub fn nutrient(&self, nutrient: &str) -> f64 {
        self.amount(&NutrientKey::new(nutrient))
    }

    pub fn nutrient_names(&self) -> impl Iterator<Item = &NutrientKey> {
        self.nutrients.keys()
    }

    pub fn nutrients(&self) -> impl Iterator<Item = (&NutrientKey, f64)> {
        self.nutrients.iter().map(|(k, v)| (k, *v))
    }

    /// Identity comparison (id when both carry one, otherwise name)
    pub fn same_food(&self, other: &FoodItem) -> bool {
        match (self.id, other.id) {
            (Some(a), Some(b)) => a == b,
            _ => self.name.to_lowercase() == other.name.to_lowercase(),
        }
    }
}

impl PartialEq for FoodItem {
    fn eq(&self, other: &Self) -> bool {
        self.same_food(other)
    }
}

impl NutrientLookup for FoodItem {
    fn amount(&self, key: &NutrientKey) -> f64 {
        self.nutrients.get(key).copied().unwrap_or(0.0)
    }
}

// ============================================================================
// Persistence
// ============================================================================

impl FoodItem {
    /// Create from a database row (nutrients are loaded separately)
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get("id")?),
            name: row.get("name")?,
            food_group: row.get("food_group")?,
            nutrients: BTreeMap::new(),
        })
    }

    fn load_nutrients(conn: &Connection, mut item: Self) -> DbResult<Self> {
        let Some(id) = item.id else {
            return Ok(item);
        };
        let mut stmt = conn.prepare(
            "SELECT nutrient, amount FROM food_nutrients WHERE food_item_id = ?1",
        )?;
        let rows = stmt.query_map([id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
        })?;
        for row in rows {
            let (nutrient, amount) = row?;
            item.add_nutrient(nutrient, amount);
        }
        Ok(item)
    }

    fn hydrate(conn: &Connection, items: Vec<Self>) -> DbResult<Vec<Self>> {
        items
            .into_iter()
            .map(|item| Self::load_nutrients(conn, item))
            .collect()
    }

    /// Insert a new food item and its nutrients
    pub fn create(conn: &Connection, data: &FoodItemCreate) -> DbResult<Self> {
        data.validate()?;

        let tx = conn.unchecked_transaction()?;

        tx.execute(
            "INSERT INTO food_items (name, food_group) VALUES (?1, ?2)",
            params![data.name.trim(), data.food_group.as_deref().map(str::trim)],
        )?;
        let id = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO food_nutrients (food_item_id, nutrient, amount) VALUES (?1, ?2, ?3)",
            )?;
            for (nutrient, amount) in &data.nutrients {
                stmt.execute(params![id, NutrientKey::new(nutrient).as_str(), amount])?;
            }
        }

        tx.commit()?;

        Self::get_by_id(conn, id)?.ok_or_else(|| {
            DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Get a food item by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM food_items WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(item) => Ok(Some(Self::load_nutrients(conn, item)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Candidate pool for a food group, in catalog (id) order
    pub fn list_by_group(conn: &Connection, group: &str) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM food_items WHERE food_group = ?1 COLLATE NOCASE ORDER BY id ASC",
        )?;

        let items = stmt
            .query_map([group.trim()], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Self::hydrate(conn, items)
    }

    /// Search food items by name
    pub fn search(conn: &Connection, query: &str, limit: i64) -> DbResult<Vec<Self>> {
        let search_pattern = format!("%{}%", query.trim());
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM food_items
            WHERE name LIKE ?1
            ORDER BY name ASC
            LIMIT ?2
            "#,
        )?;

        let items = stmt
            .query_map(params![search_pattern, limit], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Self::hydrate(conn, items)
    }

    /// Distinct food groups present in the catalog
    pub fn list_groups(conn: &Connection) -> DbResult<Vec<String>> {
        let mut stmt = conn.prepare(
            "SELECT DISTINCT food_group FROM food_items WHERE food_group IS NOT NULL ORDER BY food_group ASC",
        )?;
        let groups = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn create(conn: &Connection, name: &str, group: &str, nutrients: &[(&str, f64)]) -> FoodItem {
        FoodItem::create(conn, &FoodItemCreate {
            name: name.to_string(),
            food_group: Some(group.to_string()),
            nutrients: nutrients.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        })
        .unwrap()
    }

    #[test]
    fn test_nutrient_lookup_is_case_insensitive_and_sparse() {
        let item = FoodItem::new("Tofu").with_nutrient("Protein", 8.0);
        assert_eq!(item.nutrient("PROTEIN"), 8.0);
        assert_eq!(item.nutrient("vitaminC"), 0.0);
    }

    #[test]
    fn test_identity_ignores_nutrients() {
        let a = FoodItem::new("Apple").with_nutrient("fiber", 2.4);
        let b = FoodItem::new("APPLE").with_nutrient("fiber", 9.0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_identity_prefers_ids() {
        let a = FoodItem::new("Apple").with_id(1);
        let b = FoodItem::new("Apple").with_id(2);
        let c = FoodItem::new("Green Apple").with_id(1);
        assert_ne!(a, b);
        assert_eq!(a, c);
        // one side without an id falls back to the name
        assert_eq!(a, FoodItem::new("apple"));
    }

    #[test]
    fn test_create_round_trips_nutrients() {
        let conn = setup();
        let item = create(&conn, "Chicken Breast", "Meat", &[("Protein", 31.0), ("fat", 3.6)]);
        assert!(item.id.is_some());
        assert_eq!(item.food_group.as_deref(), Some("Meat"));
        assert_eq!(item.nutrient("protein"), 31.0);
        assert_eq!(item.nutrient("fat"), 3.6);
    }

    #[test]
    fn test_create_rejects_bad_catalog_data() {
        let conn = setup();
        let bad = |name: &str, group: Option<&str>, nutrients: &[(&str, f64)]| FoodItemCreate {
            name: name.to_string(),
            food_group: group.map(str::to_string),
            nutrients: nutrients.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        };

        for data in [
            bad("Odd", Some("Meat"), &[("protein", -1.0)]),
            bad("Odd", Some("Meat"), &[("protein", f64::INFINITY)]),
            bad("Odd", Some("Meat"), &[(" ", 1.0)]),
            bad("Odd", Some("  "), &[("protein", 1.0)]),
            bad(" ", Some("Meat"), &[("protein", 1.0)]),
        ] {
            assert!(matches!(FoodItem::create(&conn, &data), Err(DbError::InvalidData(_))));
        }
        assert!(FoodItem::list_groups(&conn).unwrap().is_empty());
    }

    #[test]
    fn test_list_by_group_is_in_insert_order() {
        let conn = setup();
        let first = create(&conn, "Zucchini", "Vegetables", &[("fiber", 1.0)]);
        create(&conn, "Salmon", "Fish", &[("protein", 20.0)]);
        let third = create(&conn, "Asparagus", "vegetables", &[("fiber", 2.1)]);

        let pool = FoodItem::list_by_group(&conn, "Vegetables").unwrap();
        assert_eq!(pool.len(), 2);
        assert_eq!(pool[0], first);
        assert_eq!(pool[1], third);
        assert_eq!(pool[1].nutrient("fiber"), 2.1);
    }

    #[test]
    fn test_search_and_groups() {
        let conn = setup();
        create(&conn, "Brown Rice", "Grains", &[]);
        create(&conn, "White Rice", "Grains", &[]);
        create(&conn, "Lentils", "Legumes", &[]);

        let found = FoodItem::search(&conn, "rice", 10).unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(FoodItem::list_groups(&conn).unwrap(), vec!["Grains", "Legumes"]);
    }
}
