//! NutriSwap MCP Server Implementation
//!
//! Implements the MCP server with all NutriSwap tools.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::db::Database;
use crate::models::FoodItemCreate;
use crate::tools::analysis;
use crate::tools::food_items;
use crate::tools::goals;
use crate::tools::meals;
use crate::tools::status::StatusTracker;
use crate::tools::swaps;

/// NutriSwap MCP Service
#[derive(Clone)]
pub struct NutriSwapService {
    status_tracker: Arc<Mutex<StatusTracker>>,
    database: Database,
    tool_router: ToolRouter<NutriSwapService>,
}

impl NutriSwapService {
    pub fn new(database_path: PathBuf, database: Database) -> Self {
        Self {
            status_tracker: Arc::new(Mutex::new(StatusTracker::new(database_path))),
            database,
            tool_router: Self::tool_router(),
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

// ============================================================================
// Food Item Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddFoodItemParams {
    pub name: String,
    /// Candidate pool used by swaps, e.g. "Meat" or "Vegetables"
    pub food_group: Option<String>,
    /// Nutrient name to amount, e.g. {"protein": 31, "fat": 3.6}
    #[serde(default)]
    pub nutrients: BTreeMap<String, f64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetFoodItemParams {
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchFoodItemsParams {
    pub query: String,
    #[serde(default = "default_search_limit")]
    pub limit: i64,
}

fn default_search_limit() -> i64 { 20 }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListFoodGroupParams {
    pub food_group: String,
}

// ============================================================================
// Meal Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LogMealParams {
    /// Date (YYYY-MM-DD)
    pub date: String,
    /// breakfast, lunch, dinner or snack
    pub meal_type: String,
    /// Catalog food item ids in the order eaten
    pub food_item_ids: Vec<i64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct MealIdParams {
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DateParams {
    /// Date (YYYY-MM-DD)
    pub date: String,
}

// ============================================================================
// Goal Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetGoalParams {
    pub nutrient: String,
    /// Lower bound; omit for no minimum
    pub min: Option<f64>,
    /// Upper bound; omit for no maximum
    pub max: Option<f64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct NutrientParams {
    pub nutrient: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UnmetGoalsParams {
    /// Date (YYYY-MM-DD)
    pub date: String,
    /// breakfast, lunch, dinner or snack
    #[serde(default = "default_unmet_meal_type")]
    pub meal_type: String,
}

fn default_unmet_meal_type() -> String { "lunch".to_string() }

// ============================================================================
// Swap Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SuggestAlternativesParams {
    pub food_item_id: i64,
    pub nutrient: String,
    /// Explicit candidates to rank; defaults to the food's own group
    pub candidate_ids: Option<Vec<i64>>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct TolerantAlternativesParams {
    pub food_item_id: i64,
    pub nutrient: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ApplySwapParams {
    pub meal_id: i64,
    pub nutrient: String,
    /// Store the rewritten meal instead of only previewing it
    #[serde(default)]
    pub save: bool,
}

// ============================================================================
// Analysis Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DateRangeParams {
    /// Start date (YYYY-MM-DD), inclusive
    pub start: String,
    /// End date (YYYY-MM-DD), inclusive
    pub end: String,
}

// ============================================================================
// Tool Router
// ============================================================================

#[tool_router]
impl NutriSwapService {
    // --- Status ---

    #[tool(description = "Get the current status of the NutriSwap service including build info, database status, swap limits and process information")]
    async fn nutriswap_status(&self) -> Result<CallToolResult, McpError> {
        let tracker = self.status_tracker.lock().await;
        to_json(&tracker.get_status())
    }

    #[tool(description = "Get instructions for building the food catalog, setting goals, logging meals and requesting swaps. Call this when starting a session or when unsure how to use the tools.")]
    fn swap_instructions(&self) -> Result<CallToolResult, McpError> {
        use crate::tools::status::SWAP_INSTRUCTIONS;
        Ok(CallToolResult::success(vec![Content::text(SWAP_INSTRUCTIONS)]))
    }

    // --- Food Items ---

    #[tool(description = "Add a food item to the catalog with its food group and nutrient amounts")]
    fn add_food_item(&self, Parameters(p): Parameters<AddFoodItemParams>) -> Result<CallToolResult, McpError> {
        let data = FoodItemCreate {
            name: p.name,
            food_group: p.food_group,
            nutrients: p.nutrients,
        };
        let result = food_items::add_food_item(&self.database, data).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Get a food item with all of its nutrients")]
    fn get_food_item(&self, Parameters(p): Parameters<GetFoodItemParams>) -> Result<CallToolResult, McpError> {
        let result = food_items::get_food_item(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        match result {
            Some(item) => to_json(&item),
            None => Ok(CallToolResult::success(vec![Content::text(
                serde_json::json!({"error": "Food item not found", "id": p.id}).to_string(),
            )])),
        }
    }

    #[tool(description = "Search food items by name")]
    fn search_food_items(&self, Parameters(p): Parameters<SearchFoodItemsParams>) -> Result<CallToolResult, McpError> {
        let result = food_items::search_food_items(&self.database, &p.query, p.limit).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "List the foods in a food group, in the order swaps consider them")]
    fn list_food_group(&self, Parameters(p): Parameters<ListFoodGroupParams>) -> Result<CallToolResult, McpError> {
        let result = food_items::list_food_group(&self.database, &p.food_group).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "List every food group in the catalog")]
    fn list_food_groups(&self) -> Result<CallToolResult, McpError> {
        let result = food_items::list_food_groups(&self.database).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    // --- Meals ---

    #[tool(description = "Log a meal made of catalog food items on a date")]
    fn log_meal(&self, Parameters(p): Parameters<LogMealParams>) -> Result<CallToolResult, McpError> {
        let result = meals::log_meal(&self.database, &p.date, &p.meal_type, p.food_item_ids)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Get a logged meal with its items and nutrient totals")]
    fn get_meal(&self, Parameters(p): Parameters<MealIdParams>) -> Result<CallToolResult, McpError> {
        let result = meals::get_meal(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        match result {
            Some(meal) => to_json(&meal),
            None => Ok(CallToolResult::success(vec![Content::text(
                serde_json::json!({"error": "Meal not found", "id": p.id}).to_string(),
            )])),
        }
    }

    #[tool(description = "List the meals logged on a date with the day's totals")]
    fn list_meals(&self, Parameters(p): Parameters<DateParams>) -> Result<CallToolResult, McpError> {
        let result = meals::list_meals(&self.database, &p.date).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Delete a logged meal")]
    fn delete_meal(&self, Parameters(p): Parameters<MealIdParams>) -> Result<CallToolResult, McpError> {
        let deleted = meals::delete_meal(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::json!({"success": deleted, "id": p.id}).to_string();
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    // --- Goals ---

    #[tool(description = "Set the goal for a nutrient. Give min, max or both; a new goal replaces the old one for that nutrient.")]
    fn set_goal(&self, Parameters(p): Parameters<SetGoalParams>) -> Result<CallToolResult, McpError> {
        let goal = goals::goal_from_params(&p.nutrient, p.min, p.max)
            .map_err(|e| McpError::invalid_params(e.to_string(), None))?;
        let result = goals::save_goal(&self.database, goal).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "List every nutrient goal")]
    fn list_goals(&self) -> Result<CallToolResult, McpError> {
        let result = goals::list_goals(&self.database).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Remove the goal for a nutrient")]
    fn remove_goal(&self, Parameters(p): Parameters<NutrientParams>) -> Result<CallToolResult, McpError> {
        let removed = goals::remove_goal(&self.database, &p.nutrient).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::json!({"success": removed, "nutrient": p.nutrient}).to_string();
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Remove every nutrient goal")]
    fn clear_goals(&self) -> Result<CallToolResult, McpError> {
        let removed = goals::clear_goals(&self.database).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::json!({"success": true, "removed": removed}).to_string();
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Check a logged meal against every nutrient goal and list the goals it misses")]
    fn evaluate_meal(&self, Parameters(p): Parameters<MealIdParams>) -> Result<CallToolResult, McpError> {
        let result = goals::evaluate_meal(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Check the first meal of a type (default lunch) on a date against every nutrient goal")]
    fn unmet_goals_for_meal(&self, Parameters(p): Parameters<UnmetGoalsParams>) -> Result<CallToolResult, McpError> {
        let result = goals::unmet_goals_for_meal(&self.database, &p.date, &p.meal_type)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    // --- Swaps ---

    #[tool(description = "Suggest foods the nutrient's goal prefers over a given food. Uses candidate_ids if given, otherwise the food's own group.")]
    fn suggest_alternatives(&self, Parameters(p): Parameters<SuggestAlternativesParams>) -> Result<CallToolResult, McpError> {
        let result = swaps::suggest_alternatives(&self.database, p.food_item_id, &p.nutrient, p.candidate_ids)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "List same-group foods that meet the nutrient's goal target while keeping the food's other nutrients within 10%")]
    fn tolerant_alternatives(&self, Parameters(p): Parameters<TolerantAlternativesParams>) -> Result<CallToolResult, McpError> {
        let result = swaps::tolerant_alternatives(&self.database, p.food_item_id, &p.nutrient)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Swap up to two items of a logged meal that miss the nutrient's goal. Preview by default; set save=true to store the result.")]
    fn apply_swap_to_meal(&self, Parameters(p): Parameters<ApplySwapParams>) -> Result<CallToolResult, McpError> {
        let result = swaps::apply_swap_to_meal(&self.database, p.meal_id, &p.nutrient, p.save)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    // --- Analysis ---

    #[tool(description = "Average nutrients per meal between two dates, inclusive")]
    fn analyze_range(&self, Parameters(p): Parameters<DateRangeParams>) -> Result<CallToolResult, McpError> {
        let result = analysis::analyze_range(&self.database, &p.start, &p.end).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Nutrient totals for each day with meals between two dates, inclusive")]
    fn daily_totals(&self, Parameters(p): Parameters<DateRangeParams>) -> Result<CallToolResult, McpError> {
        let result = analysis::daily_totals(&self.database, &p.start, &p.end).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Compare a day's intake with Canada's Food Guide. Positive differences are shortfalls.")]
    fn compare_to_reference(&self, Parameters(p): Parameters<DateParams>) -> Result<CallToolResult, McpError> {
        let result = analysis::compare_to_reference(&self.database, &p.date).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }
}

// ============================================================================
// Server Handler
// ============================================================================

#[tool_handler]
impl ServerHandler for NutriSwapService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "nutriswap".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("NutriSwap".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "NutriSwap - meal logging, nutrient goals and food swaps. \
                 IMPORTANT: Call swap_instructions first. \
                 Catalog: add_food_item, get_food_item, search_food_items, list_food_group, list_food_groups. \
                 Meals: log_meal, get_meal, list_meals, delete_meal. \
                 Goals: set_goal, list_goals, remove_goal, clear_goals, evaluate_meal, unmet_goals_for_meal. \
                 Swaps: suggest_alternatives, tolerant_alternatives, apply_swap_to_meal. \
                 Analysis: analyze_range, daily_totals, compare_to_reference."
                    .into(),
            ),
        }
    }
}
