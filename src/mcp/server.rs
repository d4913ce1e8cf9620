//! NutriClin MCP Server Implementation
//!
//! Implements the MCP server with all NutriClin tools.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
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
use crate::models::numeric::{lenient_f64, lenient_map, lenient_opt_f64, lenient_opt_map};
use crate::models::{FoodCreate, FoodUpdate, HouseholdMeasure, Nutrition};
use crate::tools::calculations::{self, LineInput, MealInput};
use crate::tools::foods;
use crate::tools::status::StatusTracker;

/// NutriClin MCP Service
#[derive(Clone)]
pub struct NutriclinService {
    status_tracker: Arc<Mutex<StatusTracker>>,
    database: Database,
    tool_router: ToolRouter<NutriclinService>,
}

impl NutriclinService {
    pub fn new(database_path: PathBuf, database: Database) -> Self {
        Self {
            status_tracker: Arc::new(Mutex::new(StatusTracker::new(database_path))),
            database,
            tool_router: Self::tool_router(),
        }
    }
}

fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

fn not_found(kind: &str, id: i64) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::success(vec![Content::text(format!(
        r#"{{"error": "{} not found", "id": {}}}"#,
        kind, id
    ))]))
}

// ============================================================================
// Shared Parameter Structs
// ============================================================================

// Numeric fields accept numbers or numeric strings ("15", "1,5"); missing or
// unparseable values count as zero.

fn default_servings() -> f64 { 1.0 }
fn default_edible_part() -> f64 { 100.0 }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct MeasureParams {
    /// Singular name, e.g. "colher de sopa"
    pub singular: String,
    /// Plural name, e.g. "colheres de sopa"
    pub plural: Option<String>,
    /// Number of units the gram weight refers to
    #[serde(default, deserialize_with = "lenient_f64")]
    pub quantity: f64,
    /// Gram weight of `quantity` units
    #[serde(default, alias = "totalGrams", deserialize_with = "lenient_f64")]
    pub total_grams: f64,
    /// Edible part percentage (default 100)
    #[serde(default = "default_edible_part", alias = "ediblePart", deserialize_with = "lenient_f64")]
    pub edible_part: f64,
}

impl From<MeasureParams> for HouseholdMeasure {
    fn from(p: MeasureParams) -> Self {
        HouseholdMeasure {
            id: 0,
            singular: p.singular,
            plural: p.plural,
            quantity: p.quantity,
            total_grams: p.total_grams,
            edible_part: p.edible_part,
        }
    }
}

/// Food values, all per 100 g
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct FoodParams {
    pub name: String,
    /// Food group, e.g. "Cereais"
    pub group: Option<String>,
    /// Composition table, e.g. "TACO"
    pub source: Option<String>,
    /// kcal per 100 g
    #[serde(default, deserialize_with = "lenient_f64")]
    pub energy: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub fat: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub carbohydrate: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub protein: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub fiber: f64,
    /// mg per 100 g
    #[serde(default, deserialize_with = "lenient_f64")]
    pub sodium: f64,
    /// Vitamins, minerals, amino acids per 100 g, by name
    #[serde(default, deserialize_with = "lenient_map")]
    pub micronutrients: BTreeMap<String, f64>,
    #[serde(default)]
    pub measures: Vec<MeasureParams>,
}

impl From<FoodParams> for FoodCreate {
    fn from(p: FoodParams) -> Self {
        FoodCreate {
            name: p.name,
            group: p.group,
            source: p.source,
            nutrients: Nutrition {
                energy: p.energy,
                fat: p.fat,
                carbohydrate: p.carbohydrate,
                protein: p.protein,
                fiber: p.fiber,
                sodium: p.sodium,
            },
            micronutrients: p.micronutrients,
            measures: p.measures.into_iter().map(HouseholdMeasure::from).collect(),
        }
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LineParams {
    /// Library food ID (takes precedence over `food`)
    pub food_id: Option<i64>,
    /// Inline food for something not in the library
    pub food: Option<FoodParams>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub quantity: f64,
    /// g, Kg, mg, ml, L, or a household measure name of the food
    pub unit: String,
}

impl From<LineParams> for LineInput {
    fn from(p: LineParams) -> Self {
        LineInput {
            food_id: p.food_id,
            food: p.food.map(FoodCreate::from),
            quantity: p.quantity,
            unit: p.unit,
        }
    }
}

// ============================================================================
// Food Library Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetFoodParams {
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchFoodsParams {
    /// Matches food name or group
    pub query: String,
    #[serde(default = "default_search_limit")]
    pub limit: i64,
}

fn default_search_limit() -> i64 { 20 }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListFoodsParams {
    /// Only foods in this group
    pub group: Option<String>,
    /// Sort by: name, energy, or created_at (default name)
    #[serde(default = "default_sort_by")]
    pub sort_by: String,
    /// asc or desc (default asc)
    #[serde(default = "default_sort_order")]
    pub sort_order: String,
    /// Maximum results (default 50, max 200)
    #[serde(default = "default_list_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_sort_by() -> String { "name".to_string() }
fn default_sort_order() -> String { "asc".to_string() }
fn default_list_limit() -> i64 { 50 }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateFoodParams {
    pub id: i64,
    pub name: Option<String>,
    pub group: Option<String>,
    pub source: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub energy: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub fat: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub carbohydrate: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub protein: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub fiber: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub sodium: Option<f64>,
    /// Replaces all micronutrients when given
    #[serde(default, deserialize_with = "lenient_opt_map")]
    pub micronutrients: Option<BTreeMap<String, f64>>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DeleteFoodParams {
    /// Food ID to delete (its measures go with it)
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddMeasureParams {
    pub food_id: i64,
    pub measure: MeasureParams,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RemoveMeasureParams {
    /// Household measure ID
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ImportFoodsParams {
    /// Path to a JSON array of foods
    pub file_path: String,
}

// ============================================================================
// Calculation Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ResolveGramsParams {
    /// Library food whose household measures to use
    pub food_id: Option<i64>,
    /// Measures to use when no food_id is given
    #[serde(default)]
    pub measures: Vec<MeasureParams>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub quantity: f64,
    pub unit: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RecipeNutritionParams {
    pub lines: Vec<LineParams>,
    /// Servings the recipe yields (default 1)
    #[serde(default = "default_servings", deserialize_with = "lenient_f64")]
    pub servings: f64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct MealParams {
    /// e.g. "Café da manhã"
    pub name: String,
    /// e.g. "07:30"
    pub time: Option<String>,
    #[serde(default)]
    pub lines: Vec<LineParams>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct MealPlanNutritionParams {
    pub name: String,
    /// Daily energy target in kcal
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub energy_target: Option<f64>,
    pub meals: Vec<MealParams>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ScalePortionParams {
    pub food_id: i64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub quantity: f64,
    pub unit: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct MacroSharesParams {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub fat: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub carbohydrate: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub protein: f64,
}

// ============================================================================
// Tool Implementations
// ============================================================================

#[tool_router]
impl NutriclinService {
    // --- Status ---

    #[tool(description = "Get the current status of the NutriClin service including build info, food library size, and process information")]
    async fn nutriclin_status(&self) -> Result<CallToolResult, McpError> {
        let tracker = self.status_tracker.lock().await;
        json_result(&tracker.get_status(&self.database))
    }

    #[tool(description = "Get instructions for the nutrition calculation tools: units, household measures, and the recommended workflow")]
    fn calculation_instructions(&self) -> Result<CallToolResult, McpError> {
        use crate::tools::status::CALCULATION_INSTRUCTIONS;
        Ok(CallToolResult::success(vec![Content::text(CALCULATION_INSTRUCTIONS)]))
    }

    // --- Food Library ---

    #[tool(description = "Add a food to the library. Nutrient values are per 100 g; household measures are optional.")]
    fn add_food(&self, Parameters(p): Parameters<FoodParams>) -> Result<CallToolResult, McpError> {
        let result = foods::add_food(&self.database, p.into()).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Get a food with its per-100g values, micronutrients, and household measures")]
    fn get_food(&self, Parameters(p): Parameters<GetFoodParams>) -> Result<CallToolResult, McpError> {
        match foods::get_food(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))? {
            Some(food) => json_result(&food),
            None => not_found("Food", p.id),
        }
    }

    #[tool(description = "Search foods by name or group")]
    fn search_foods(&self, Parameters(p): Parameters<SearchFoodsParams>) -> Result<CallToolResult, McpError> {
        let result = foods::search_foods(&self.database, &p.query, p.limit).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "List foods with optional group filter, sorting, and pagination")]
    fn list_foods(&self, Parameters(p): Parameters<ListFoodsParams>) -> Result<CallToolResult, McpError> {
        let result = foods::list_foods(&self.database, p.group.as_deref(), &p.sort_by, &p.sort_order, p.limit, p.offset)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Update a food's name, group, source, per-100g values, or micronutrients")]
    fn update_food(&self, Parameters(p): Parameters<UpdateFoodParams>) -> Result<CallToolResult, McpError> {
        let data = FoodUpdate {
            name: p.name, group: p.group, source: p.source,
            energy: p.energy, fat: p.fat, carbohydrate: p.carbohydrate, protein: p.protein,
            fiber: p.fiber, sodium: p.sodium, micronutrients: p.micronutrients,
        };
        let result = foods::update_food(&self.database, p.id, data).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Delete a food and its household measures")]
    fn delete_food(&self, Parameters(p): Parameters<DeleteFoodParams>) -> Result<CallToolResult, McpError> {
        let result = foods::delete_food(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Add a household measure (e.g. 1 colher de sopa = 25 g) to a food")]
    fn add_household_measure(&self, Parameters(p): Parameters<AddMeasureParams>) -> Result<CallToolResult, McpError> {
        let result = foods::add_household_measure(&self.database, p.food_id, p.measure.into())
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Remove a household measure by ID")]
    fn remove_household_measure(&self, Parameters(p): Parameters<RemoveMeasureParams>) -> Result<CallToolResult, McpError> {
        let result = foods::remove_household_measure(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Import foods from a JSON array file. Invalid entries and names already in the library are skipped and reported.")]
    fn import_foods(&self, Parameters(p): Parameters<ImportFoodsParams>) -> Result<CallToolResult, McpError> {
        let result = foods::import_foods(&self.database, Path::new(&p.file_path))
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    // --- Calculations ---

    #[tool(description = "Convert a quantity and unit to grams using fixed units (g, Kg, mg, ml, L) or a food's household measures. Unknown units are taken as grams.")]
    fn resolve_grams(&self, Parameters(p): Parameters<ResolveGramsParams>) -> Result<CallToolResult, McpError> {
        let measures = p.measures.into_iter().map(HouseholdMeasure::from).collect();
        let result = calculations::resolve_grams(&self.database, p.food_id, measures, p.quantity, &p.unit)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Calculate recipe nutrition: totals, per serving, per 100 g, micronutrients, macro shares, and per-line breakdown. Nothing is stored.")]
    fn calculate_recipe_nutrition(&self, Parameters(p): Parameters<RecipeNutritionParams>) -> Result<CallToolResult, McpError> {
        let lines = p.lines.into_iter().map(LineInput::from).collect();
        let result = calculations::calculate_recipe_nutrition(&self.database, lines, p.servings)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Calculate meal plan nutrition: per-meal totals, daily totals, macro shares, energy distribution, and adequacy against an energy target")]
    fn calculate_meal_plan_nutrition(&self, Parameters(p): Parameters<MealPlanNutritionParams>) -> Result<CallToolResult, McpError> {
        let meals = p.meals.into_iter().map(|m| MealInput {
            name: m.name,
            time: m.time,
            lines: m.lines.into_iter().map(LineInput::from).collect(),
        }).collect();
        let result = calculations::calculate_meal_plan_nutrition(&self.database, &p.name, p.energy_target, meals)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Nutrients of one library food at a chosen portion (quantity and unit)")]
    fn scale_food_portion(&self, Parameters(p): Parameters<ScalePortionParams>) -> Result<CallToolResult, McpError> {
        let result = calculations::scale_food_portion(&self.database, p.food_id, p.quantity, &p.unit)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Percent share of fat, carbohydrate and protein by grams and by energy, clamped to 0-100")]
    fn macro_shares(&self, Parameters(p): Parameters<MacroSharesParams>) -> Result<CallToolResult, McpError> {
        let totals = Nutrition { fat: p.fat, carbohydrate: p.carbohydrate, protein: p.protein, ..Default::default() };
        json_result(&calculations::calculate_macro_shares(&totals))
    }
}

// ============================================================================
// Server Handler
// ============================================================================

#[tool_handler]
impl ServerHandler for NutriclinService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "nutriclin".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("NutriClin Nutrition Engine".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "NutriClin - clinical nutrition calculations over a food library. \
                 Call calculation_instructions first. \
                 Foods: add/get/search/list/update/delete_food, add/remove_household_measure, import_foods. \
                 Calculations: resolve_grams, calculate_recipe_nutrition, calculate_meal_plan_nutrition, \
                 scale_food_portion, macro_shares. Totals are derived on every call and never stored."
                    .into(),
            ),
        }
    }
}
