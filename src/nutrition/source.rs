//! Where the engine gets its data
//!
//! The engine never owns meals, catalogs or goals. It reads a consistent
//! snapshot through [`NutritionSource`], implemented here for the SQLite
//! [`Database`] and for the in-memory [`MealLog`].

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::db::{Database, DbResult};
use crate::models::{FoodItem, GoalSet, Meal, NutrientGoal, NutrientKey};

/// Read access to meal history, candidate pools and goals.
///
/// `candidate_foods` must return the same order for the same data on every
/// call; the constrained swap search takes the first acceptable candidate.
pub trait NutritionSource {
    /// Meals dated within `[start, end]`, inclusive on both ends
    fn meals_in_range(&self, start: NaiveDate, end: NaiveDate) -> DbResult<Vec<Meal>>;

    /// Catalog foods in a food group, in stable catalog order
    fn candidate_foods(&self, food_group: &str) -> DbResult<Vec<FoodItem>>;

    /// The goal set for a nutrient, if any
    fn goal(&self, nutrient: &NutrientKey) -> DbResult<Option<NutrientGoal>>;

    /// Meals logged on a single date
    fn meals_on(&self, date: NaiveDate) -> DbResult<Vec<Meal>> {
        self.meals_in_range(date, date)
    }
}

impl NutritionSource for Database {
    fn meals_in_range(&self, start: NaiveDate, end: NaiveDate) -> DbResult<Vec<Meal>> {
        self.with_conn(|conn| Meal::list_in_range(conn, start, end))
    }

    fn candidate_foods(&self, food_group: &str) -> DbResult<Vec<FoodItem>> {
        self.with_conn(|conn| FoodItem::list_by_group(conn, food_group))
    }

    fn goal(&self, nutrient: &NutrientKey) -> DbResult<Option<NutrientGoal>> {
        self.with_conn(|conn| NutrientGoal::get(conn, nutrient))
    }
}

/// In-memory meal history, food catalog and goals.
///
/// Useful for embedding the engine without a database and for tests.
#[derive(Debug, Clone, Default)]
pub struct MealLog {
    history: BTreeMap<NaiveDate, Vec<Meal>>,
    catalog: Vec<FoodItem>,
    goals: GoalSet,
}

impl MealLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a meal under its own date
    pub fn log_meal(&mut self, meal: Meal) {
        self.history.entry(meal.date).or_default().push(meal);
    }

    /// Add a food to the catalog; catalog order is insertion order
    pub fn add_food(&mut self, item: FoodItem) {
        self.catalog.push(item);
    }

    pub fn set_goal(&mut self, goal: NutrientGoal) -> Option<NutrientGoal> {
        self.goals.set(goal)
    }

    pub fn goals(&self) -> &GoalSet {
        &self.goals
    }

    /// First meal of a type on a date, matching the type case-insensitively
    pub fn find_meal(&self, date: NaiveDate, meal_type: &str) -> Option<&Meal> {
        let wanted = crate::models::MealType::from_str(meal_type);
        self.history
            .get(&date)
            .and_then(|meals| meals.iter().find(|m| m.meal_type == wanted))
    }
}

impl NutritionSource for MealLog {
    fn meals_in_range(&self, start: NaiveDate, end: NaiveDate) -> DbResult<Vec<Meal>> {
        if start > end {
            return Ok(Vec::new());
        }
        Ok(self
            .history
            .range(start..=end)
            .flat_map(|(_, meals)| meals.iter().cloned())
            .collect())
    }

    fn candidate_foods(&self, food_group: &str) -> DbResult<Vec<FoodItem>> {
        let wanted = food_group.trim().to_lowercase();
        Ok(self
            .catalog
            .iter()
            .filter(|item| {
                item.food_group
                    .as_deref()
                    .is_some_and(|g| g.trim().to_lowercase() == wanted)
            })
            .cloned()
            .collect())
    }

    fn goal(&self, nutrient: &NutrientKey) -> DbResult<Option<NutrientGoal>> {
        Ok(self.goals.get(nutrient.as_str()).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::models::{FoodItemCreate, MealCreate, MealType};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    #[test]
    fn test_meal_log_range_is_inclusive() {
        let mut log = MealLog::new();
        for d in [9, 10, 11, 12] {
            log.log_meal(Meal::new(MealType::Lunch, day(d)));
        }
        assert_eq!(log.meals_in_range(day(10), day(11)).unwrap().len(), 2);
        assert_eq!(log.meals_on(day(12)).unwrap().len(), 1);
        assert!(log.meals_in_range(day(12), day(10)).unwrap().is_empty());
    }

    #[test]
    fn test_meal_log_candidates_keep_catalog_order() {
        let mut log = MealLog::new();
        log.add_food(FoodItem::new("Kale").with_group("Vegetables"));
        log.add_food(FoodItem::new("Cod").with_group("Fish"));
        log.add_food(FoodItem::new("Beet").with_group("vegetables"));
        log.add_food(FoodItem::new("Mystery Bar"));

        let pool = log.candidate_foods("Vegetables").unwrap();
        let names: Vec<&str> = pool.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Kale", "Beet"]);
    }

    #[test]
    fn test_meal_log_find_meal() {
        let mut log = MealLog::new();
        log.log_meal(Meal::new(MealType::Dinner, day(3)));
        assert!(log.find_meal(day(3), "DINNER").is_some());
        assert!(log.find_meal(day(3), "lunch").is_none());
    }

    #[test]
    fn test_database_source() {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| {
            run_migrations(conn)?;
            let oats = FoodItem::create(conn, &FoodItemCreate {
                name: "Oats".to_string(),
                food_group: Some("Grains".to_string()),
                nutrients: [("fiber".to_string(), 10.0)].into_iter().collect(),
            })?;
            Meal::create(conn, &MealCreate {
                date: day(5),
                meal_type: MealType::Breakfast,
                food_item_ids: vec![oats.id.unwrap()],
            })?;
            NutrientGoal::at_least("fiber", 30.0)?.save(conn)?;
            Ok(())
        })
        .unwrap();

        assert_eq!(db.meals_on(day(5)).unwrap().len(), 1);
        assert_eq!(db.candidate_foods("grains").unwrap().len(), 1);
        assert!(db.goal(&NutrientKey::new("Fiber")).unwrap().is_some());
        assert!(db.goal(&NutrientKey::new("sodium")).unwrap().is_none());
    }
}
