//! Utility to load a food catalog into the database
//!
//! Usage: `seed_foods <catalog.json>` where the file holds
//! `[{"name": "...", "food_group": "...", "nutrients": {"protein": 31.0}}]`.

use std::path::PathBuf;

use nutriswap::models::{FoodItem, FoodItemCreate};

fn get_database_path() -> PathBuf {
    std::env::var("NUTRISWAP_DATABASE_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let mut path = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|p| p.to_path_buf()))
                .unwrap_or_else(|| PathBuf::from("."));

            // Go up from target/release or target/debug to project root
            if path.ends_with("release") || path.ends_with("debug") {
                if let Some(parent) = path.parent() {
                    if let Some(grandparent) = parent.parent() {
                        path = grandparent.to_path_buf();
                    }
                }
            }

            path.push("data");
            std::fs::create_dir_all(&path).ok();
            path.push("nutriswap.db");
            path
        })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let catalog_path = std::env::args()
        .nth(1)
        .ok_or("usage: seed_foods <catalog.json>")?;

    let raw = std::fs::read_to_string(&catalog_path)?;
    let foods: Vec<FoodItemCreate> = serde_json::from_str(&raw)?;
    println!("Read {} food items from {}", foods.len(), catalog_path);

    let db_path = get_database_path();
    println!("Database path: {}", db_path.display());

    let database = nutriswap::db::Database::new(&db_path)?;

    database.with_conn(|conn| {
        nutriswap::db::migrations::run_migrations(conn)?;
        Ok(())
    })?;

    let mut skipped = 0usize;
    database.with_conn(|conn| {
        for food in &foods {
            if let Err(e) = food.validate() {
                eprintln!("  skipped '{}': {}", food.name, e);
                skipped += 1;
                continue;
            }
            let item = FoodItem::create(conn, food)?;
            println!(
                "  {:>5}  {:<32} {}",
                item.id.unwrap_or_default(),
                item.name,
                item.food_group.as_deref().unwrap_or("-")
            );
        }
        Ok(())
    })?;

    println!("Loaded {} food items ({} skipped)", foods.len() - skipped, skipped);

    Ok(())
}
