//! End-to-end runs of goals, swaps and analysis over both data sources.

use chrono::NaiveDate;

use nutriswap::db::{migrations::run_migrations, Database, DbError};
use nutriswap::models::{FoodItem, FoodItemCreate, GoalKind, Meal, MealCreate, MealType, NutrientGoal};
use nutriswap::nutrition::{
    evaluate_meal_against_goals, MealLog, NutritionSource, RangeAnalyzer, SwapEngine,
};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
}

fn meat(name: &str, protein: f64, fat: f64, carbs: f64) -> FoodItem {
    FoodItem::new(name)
        .with_group("Meat")
        .with_nutrient("protein", protein)
        .with_nutrient("fat", fat)
        .with_nutrient("carbs", carbs)
}

fn seeded_database() -> Database {
    let db = Database::in_memory().unwrap();
    db.with_conn(run_migrations).unwrap();
    db
}

fn store(db: &Database, item: &FoodItem) -> i64 {
    db.with_conn(|conn| {
        FoodItem::create(conn, &FoodItemCreate {
            name: item.name.clone(),
            food_group: item.food_group.clone(),
            nutrients: item.nutrients().map(|(k, v)| (k.to_string(), v)).collect(),
        })
    })
    .unwrap()
    .id
    .unwrap()
}

#[test]
fn min_goal_classifies_foods() {
    let goal = NutrientGoal::new("protein", 50.0, f64::INFINITY).unwrap();
    assert_eq!(goal.kind(), GoalKind::Min);
    assert_eq!(goal.target_amount(), 50.0);
    assert!(!goal.is_satisfied_by(&FoodItem::new("Rice").with_nutrient("protein", 30.0)));
    assert!(goal.is_satisfied_by(&FoodItem::new("Steak").with_nutrient("protein", 60.0)));
}

#[test]
fn meal_swap_in_memory() {
    let mut log = MealLog::new();
    log.add_food(meat("Turkey", 55.0, 10.5, 19.0));
    log.set_goal(NutrientGoal::at_least("protein", 50.0).unwrap());

    let meal = Meal::new(MealType::Dinner, day(1))
        .with_item(meat("Bacon", 10.0, 10.0, 20.0))
        .with_item(meat("Steak", 60.0, 15.0, 0.0));
    log.log_meal(meal.clone());

    let unmet = evaluate_meal_against_goals(&meal, log.goals());
    assert!(unmet.is_empty(), "meal total protein is 70");

    let outcome = SwapEngine::new(&log).apply_goal_to_meal(&meal, "protein").unwrap();
    assert_eq!(outcome.replacement_count(), 1);
    assert_eq!(outcome.meal.items()[0].name, "Turkey");
    assert_eq!(outcome.meal.items()[1].name, "Steak");
}

#[test]
fn meal_swap_over_database() {
    let db = seeded_database();
    let bacon = store(&db, &meat("Bacon", 10.0, 10.0, 20.0));
    let steak = store(&db, &meat("Steak", 60.0, 15.0, 0.0));
    store(&db, &meat("Turkey", 55.0, 10.5, 19.0));

    let meal = db
        .with_conn(|conn| {
            NutrientGoal::at_least("protein", 50.0)?.save(conn)?;
            Meal::create(conn, &MealCreate {
                date: day(2),
                meal_type: MealType::Dinner,
                food_item_ids: vec![bacon, steak],
            })
        })
        .unwrap();

    let outcome = SwapEngine::new(&db).apply_goal_to_meal(&meal, "Protein").unwrap();
    assert_eq!(outcome.replacement_count(), 1);
    assert_eq!(outcome.replacements[0].position, 0);
    assert_eq!(outcome.meal.items()[0].name, "Turkey");
    assert_eq!(outcome.meal.id, meal.id);
}

#[test]
fn empty_pool_keeps_original_item() {
    let db = seeded_database();
    let lentils = FoodItem::new("Lentils").with_group("Legumes").with_nutrient("protein", 9.0);
    store(&db, &lentils);

    let goal = NutrientGoal::at_least("protein", 50.0).unwrap();
    let engine = SwapEngine::new(&db);
    assert!(engine.find_swap(&lentils, &goal).unwrap().is_none());

    let meal = Meal::new(MealType::Lunch, day(3)).with_item(lentils);
    let outcome = engine.apply_swap_to_meal(&meal, &goal).unwrap();
    assert_eq!(outcome.replacement_count(), 0);
    assert_eq!(outcome.meal.items()[0].name, "Lentils");
}

#[test]
fn range_average_and_reference_over_database() {
    let db = seeded_database();
    let soup = store(&db, &FoodItem::new("Soup").with_nutrient("calories", 100.0));
    let shake = store(&db, &FoodItem::new("Shake").with_nutrient("protein", 50.0000001));

    db.with_conn(|conn| {
        for d in [4, 5, 6] {
            Meal::create(conn, &MealCreate {
                date: day(d),
                meal_type: MealType::Lunch,
                food_item_ids: vec![soup],
            })?;
        }
        Meal::create(conn, &MealCreate {
            date: day(9),
            meal_type: MealType::Breakfast,
            food_item_ids: vec![shake],
        })?;
        Ok(())
    })
    .unwrap();

    let analyzer = RangeAnalyzer::new(&db);
    let average = analyzer.analyze_range(day(4), day(6)).unwrap();
    assert!((average.get("calories") - 100.0).abs() < 1e-9);

    assert!(analyzer.analyze_range(day(20), day(25)).unwrap().is_empty());

    let diff = analyzer.compare_to_reference(day(9)).unwrap();
    assert!(!diff.contains_key("protein"));
    assert!((diff["fiber"] - 30.0).abs() < 1e-9);

    assert_eq!(db.meals_in_range(day(1), day(31)).unwrap().len(), 4);
}

#[test]
fn catalog_rejects_negative_amounts_and_none_goal_never_swaps() {
    let db = seeded_database();
    let rejected = db.with_conn(|conn| {
        FoodItem::create(conn, &FoodItemCreate {
            name: "Odd".to_string(),
            food_group: Some("Meat".to_string()),
            nutrients: [("protein".to_string(), -1.0), ("fat".to_string(), 5.0)].into_iter().collect(),
        })
    });
    assert!(matches!(rejected, Err(DbError::InvalidData(_))));

    let lean = store(&db, &FoodItem::new("Lean Ham").with_group("Meat").with_nutrient("protein", 5.0).with_nutrient("fat", 5.0));
    store(&db, &FoodItem::new("Chicken").with_group("Meat").with_nutrient("protein", 30.0).with_nutrient("fat", 5.0));

    let meal = db
        .with_conn(|conn| {
            Meal::create(conn, &MealCreate {
                date: day(7),
                meal_type: MealType::Lunch,
                food_item_ids: vec![lean],
            })
        })
        .unwrap();

    let goal = NutrientGoal::new("protein", 0.0, f64::INFINITY).unwrap();
    assert_eq!(goal.kind(), GoalKind::None);
    let outcome = SwapEngine::new(&db).apply_swap_to_meal(&meal, &goal).unwrap();
    assert_eq!(outcome.replacement_count(), 0);
    assert_eq!(outcome.meal.items()[0].name, "Lean Ham");
}
