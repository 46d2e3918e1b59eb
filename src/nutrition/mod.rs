//! Nutrition engine
//!
//! Goal evaluation, goal-directed substitution and range analysis over the
//! models, reading data through a [`NutritionSource`].

pub mod analyzer;
pub mod evaluate;
pub mod reference;
pub mod source;
pub mod swap;

pub use analyzer::{
    average_per_meal, daily_totals, range_average, total_nutrition, RangeAnalyzer, RangeAverage,
};
pub use evaluate::{evaluate_meal_against_goals, unmet_goals};
pub use reference::{ReferenceStandard, DIFFERENCE_EPSILON};
pub use source::{MealLog, NutritionSource};
pub use swap::{
    clears_target, find_swap_in, suggest_alternatives, within_tolerance, Replacement,
    SwapEngine, SwapOutcome, SwapPolicy, DEFAULT_MAX_REPLACEMENTS, DEFAULT_TOLERANCE,
};
