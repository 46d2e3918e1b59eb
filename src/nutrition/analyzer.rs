//! Aggregation over logged meals
//!
//! Per-meal averages across a date range, per-day totals, and comparison of a
//! day's intake against a reference standard.

use std::collections::BTreeMap;
use std::num::NonZeroUsize;

use chrono::NaiveDate;
use serde::Serialize;

use crate::db::DbResult;
use crate::models::{Meal, NutrientKey, NutritionSummary};
use super::{NutritionSource, ReferenceStandard};

/// Sum of every meal's nutrients
pub fn total_nutrition<'a>(meals: impl IntoIterator<Item = &'a Meal>) -> NutritionSummary {
    meals.into_iter().map(Meal::total_nutrition).sum()
}

/// A per-meal average and the number of meals it was taken over
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RangeAverage {
    pub meal_count: usize,
    pub average: NutritionSummary,
}

/// Per-meal average of the meals dated within `[start, end]`, with the count
/// it divided by.
///
/// With no meals in range the zero summary comes back and no division happens.
pub fn range_average<'a>(
    meals: impl IntoIterator<Item = &'a Meal>,
    start: NaiveDate,
    end: NaiveDate,
) -> RangeAverage {
    let mut total = NutritionSummary::zero();
    let mut meal_count = 0usize;

    for meal in meals {
        if meal.date >= start && meal.date <= end {
            total.merge(&meal.total_nutrition());
            meal_count += 1;
        }
    }

    let average = match NonZeroUsize::new(meal_count) {
        Some(count) => total.divided_by(count),
        None => total,
    };
    RangeAverage { meal_count, average }
}

/// Per-meal average of the meals dated within `[start, end]`
pub fn average_per_meal<'a>(
    meals: impl IntoIterator<Item = &'a Meal>,
    start: NaiveDate,
    end: NaiveDate,
) -> NutritionSummary {
    range_average(meals, start, end).average
}

/// Totals grouped by meal date
pub fn daily_totals<'a>(meals: impl IntoIterator<Item = &'a Meal>) -> BTreeMap<NaiveDate, NutritionSummary> {
    let mut days: BTreeMap<NaiveDate, NutritionSummary> = BTreeMap::new();
    for meal in meals {
        days.entry(meal.date).or_default().merge(&meal.total_nutrition());
    }
    days
}

/// Date-range analysis bound to a data source
pub struct RangeAnalyzer<'a, S: NutritionSource + ?Sized> {
    source: &'a S,
    reference: ReferenceStandard,
}

impl<'a, S: NutritionSource + ?Sized> RangeAnalyzer<'a, S> {
    /// Analyzer comparing against Canada's Food Guide
    pub fn new(source: &'a S) -> Self {
        Self::with_reference(source, ReferenceStandard::canada_food_guide())
    }

    pub fn with_reference(source: &'a S, reference: ReferenceStandard) -> Self {
        Self { source, reference }
    }

    pub fn reference(&self) -> &ReferenceStandard {
        &self.reference
    }

    /// Average nutrients per meal over `[start, end]`, inclusive
    pub fn analyze_range(&self, start: NaiveDate, end: NaiveDate) -> DbResult<NutritionSummary> {
        Ok(self.average_range(start, end)?.average)
    }

    /// Like [`Self::analyze_range`], also reporting how many meals were averaged
    pub fn average_range(&self, start: NaiveDate, end: NaiveDate) -> DbResult<RangeAverage> {
        if start > end {
            tracing::warn!(%start, %end, "range start is after end; nothing to average");
            return Ok(RangeAverage::default());
        }
        let meals = self.source.meals_in_range(start, end)?;
        tracing::debug!(%start, %end, meals = meals.len(), "averaging range");
        Ok(range_average(&meals, start, end))
    }

    /// Per-day totals over `[start, end]`, inclusive
    pub fn daily_totals(&self, start: NaiveDate, end: NaiveDate) -> DbResult<BTreeMap<NaiveDate, NutritionSummary>> {
        if start > end {
            return Ok(BTreeMap::new());
        }
        let meals = self.source.meals_in_range(start, end)?;
        Ok(daily_totals(&meals))
    }

    /// Everything eaten on one date, summed
    pub fn intake_on(&self, date: NaiveDate) -> DbResult<NutritionSummary> {
        let meals = self.source.meals_on(date)?;
        Ok(total_nutrition(&meals))
    }

    /// `standard - actual` per reference nutrient for one date, omitting
    /// differences within the comparison epsilon
    pub fn compare_to_reference(&self, date: NaiveDate) -> DbResult<BTreeMap<NutrientKey, f64>> {
        let actual = self.intake_on(date)?;
        Ok(self.reference.differences(&actual))
    }
}
