//! Analysis Tools
//!
//! Range averages, day-by-day totals and reference comparisons over logged
//! meals.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::db::Database;
use crate::models::{NutrientKey, NutritionSummary};
use crate::nutrition::{RangeAnalyzer, ReferenceStandard};
use super::parse_date_param;

/// Response for analyze_range
#[derive(Debug, Serialize)]
pub struct AnalyzeRangeResponse {
    pub start: String,
    pub end: String,
    pub meal_count: usize,
    pub average_per_meal: NutritionSummary,
}

/// One day's totals
#[derive(Debug, Serialize)]
pub struct DayTotal {
    pub date: String,
    pub totals: NutritionSummary,
}

/// Response for daily_totals
#[derive(Debug, Serialize)]
pub struct DailyTotalsResponse {
    pub days: Vec<DayTotal>,
    pub range_total: NutritionSummary,
}

/// Response for compare_to_reference
#[derive(Debug, Serialize)]
pub struct CompareResponse {
    pub date: String,
    pub intake: NutritionSummary,
    pub reference: ReferenceStandard,
    /// standard minus actual; positive is a shortfall
    pub differences: BTreeMap<NutrientKey, f64>,
}

/// Average nutrients per meal between two dates, inclusive
pub fn analyze_range(db: &Database, start: &str, end: &str) -> Result<AnalyzeRangeResponse, String> {
    let start_date = parse_date_param("start", start)?;
    let end_date = parse_date_param("end", end)?;

    let result = RangeAnalyzer::new(db)
        .average_range(start_date, end_date)
        .map_err(|e| format!("Failed to analyze range: {}", e))?;

    Ok(AnalyzeRangeResponse {
        start: start_date.to_string(),
        end: end_date.to_string(),
        meal_count: result.meal_count,
        average_per_meal: result.average,
    })
}

/// Per-day totals between two dates, inclusive. Days without meals are
/// omitted.
pub fn daily_totals(db: &Database, start: &str, end: &str) -> Result<DailyTotalsResponse, String> {
    let start_date = parse_date_param("start", start)?;
    let end_date = parse_date_param("end", end)?;

    let days = RangeAnalyzer::new(db)
        .daily_totals(start_date, end_date)
        .map_err(|e| format!("Failed to total days: {}", e))?;

    let range_total: NutritionSummary = days.values().cloned().sum();

    Ok(DailyTotalsResponse {
        days: days
            .into_iter()
            .map(|(date, totals)| DayTotal {
                date: date.to_string(),
                totals,
            })
            .collect(),
        range_total,
    })
}

/// A day's intake against Canada's Food Guide
pub fn compare_to_reference(db: &Database, date: &str) -> Result<CompareResponse, String> {
    let parsed = parse_date_param("date", date)?;
    let analyzer = RangeAnalyzer::new(db);

    let intake = analyzer
        .intake_on(parsed)
        .map_err(|e| format!("Failed to read intake: {}", e))?;
    let differences = analyzer.reference().differences(&intake);

    Ok(CompareResponse {
        date: parsed.to_string(),
        intake,
        reference: analyzer.reference().clone(),
        differences,
    })
}
