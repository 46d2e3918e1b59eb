//! NutriSwap Status Tool
//!
//! Provides runtime status information about the NutriSwap service, and the
//! usage guide handed to assistants.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;
use crate::nutrition::{DEFAULT_MAX_REPLACEMENTS, DEFAULT_TOLERANCE};

/// Usage guide for AI assistants
pub const SWAP_INSTRUCTIONS: &str = r#"
# NutriSwap Instructions

NutriSwap tracks meals, checks them against nutrient goals, and suggests food
swaps that move a meal toward a goal.

## Nutrient Names

Nutrient names are case-insensitive: "Protein", "protein" and "PROTEIN" are the
same nutrient. Amounts are plain numbers in whatever unit the catalog uses for
that nutrient (for example grams of protein, milligrams of sodium). A nutrient a
food does not list counts as 0.

## 1. Build the Catalog

**Tool:** `add_food_item`
- `name` (required)
- `food_group` (optional but needed for swaps; swaps only look inside the
  original food's group, e.g. "Meat", "Vegetables", "Grains")
- `nutrients`: object of nutrient name to amount, e.g.
  `{"calories": 165, "protein": 31, "fat": 3.6}`

Use `list_food_groups`, `list_food_group` and `search_food_items` to browse.
Catalog order inside a group matters: when rewriting a meal the first
acceptable candidate in the group wins.

## 2. Set Goals

**Tool:** `set_goal` with `nutrient`, optional `min`, optional `max`.

| min given | max given | Goal kind | Satisfied when |
|-----------|-----------|-----------|----------------|
| yes (> 0) | no | MIN | amount >= min |
| no | yes | MAX | amount <= max |
| yes | yes | RANGE | min <= amount <= max |
| no | no | NONE | always |

Setting a goal for a nutrient that already has one replaces it.
Use `list_goals`, `remove_goal` and `clear_goals` to manage them.

## 3. Log Meals

**Tool:** `log_meal` with `date` (YYYY-MM-DD), `meal_type` (breakfast, lunch,
dinner or snack) and `food_item_ids` in the order eaten. The same id may appear
more than once.

Read back with `get_meal` and `list_meals`; remove with `delete_meal`.

## 4. Check Goals

- `evaluate_meal` checks one logged meal against every goal.
- `unmet_goals_for_meal` checks the first meal of a type on a date. A date
  with no such meal is checked as an empty meal.

## 5. Swaps

- `suggest_alternatives`: candidates the goal prefers over a food. MIN goals
  prefer less of the nutrient, MAX goals prefer more, RANGE goals prefer an
  amount closer to the middle of the range. Pass `candidate_ids` to rank an
  explicit list, otherwise the food's own group is used.
- `tolerant_alternatives`: same-group candidates that clear the goal's target
  and keep every other nutrient of the food within the tolerance band.
- `apply_swap_to_meal`: replaces items that miss the goal with the first
  tolerant candidate from their group. Items already meeting the goal are
  kept. Set `save: true` to store the result; otherwise it is a preview.

## 6. Analysis

- `analyze_range`: average nutrients per meal between two dates, inclusive.
- `daily_totals`: per-day totals between two dates.
- `compare_to_reference`: a day's intake against Canada's Food Guide
  (protein 50, fiber 30, vitaminC 75). Positive differences are shortfalls,
  negative ones surpluses.
"#;

/// Runtime status of the NutriSwap service
#[derive(Debug, Clone, Serialize)]
pub struct NutriSwapStatus {
    /// Build information
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub version: &'static str,

    /// Database information
    pub database_path: String,
    pub database_size_bytes: Option<u64>,

    /// Swap limits
    pub swap_tolerance: f64,
    pub max_replacements_per_meal: usize,

    /// Process information
    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

/// Status tracker for collecting runtime information
pub struct StatusTracker {
    start_time: Instant,
    database_path: PathBuf,
}

impl StatusTracker {
    /// Create a new status tracker
    pub fn new(database_path: PathBuf) -> Self {
        Self {
            start_time: Instant::now(),
            database_path,
        }
    }

    /// Get the current status
    pub fn get_status(&self) -> NutriSwapStatus {
        let build_info = BuildInfo::current();

        let database_size_bytes = std::fs::metadata(&self.database_path)
            .ok()
            .map(|m| m.len());

        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        NutriSwapStatus {
            build_number: build_info.build_number,
            build_timestamp: build_info.build_timestamp,
            version: build_info.version,
            database_path: self.database_path.display().to_string(),
            database_size_bytes,
            swap_tolerance: DEFAULT_TOLERANCE,
            max_replacements_per_meal: DEFAULT_MAX_REPLACEMENTS,
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_for_missing_database() {
        let tracker = StatusTracker::new(PathBuf::from("/nonexistent/nutriswap.db"));
        let status = tracker.get_status();
        assert_eq!(status.database_size_bytes, None);
        assert_eq!(status.process_id, std::process::id());
        assert_eq!(status.max_replacements_per_meal, 2);
    }

    #[test]
    fn test_instructions_name_every_swap_tool() {
        for tool in ["suggest_alternatives", "tolerant_alternatives", "apply_swap_to_meal"] {
            assert!(SWAP_INSTRUCTIONS.contains(tool), "missing {}", tool);
        }
    }
}
