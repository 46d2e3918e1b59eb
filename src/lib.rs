//! NutriSwap Library
//!
//! Meal logging, nutrient goals, goal-directed food substitution and
//! date-range nutrition analysis.

pub mod build_info;
pub mod db;
pub mod mcp;
pub mod models;
pub mod nutrition;
pub mod tools;
