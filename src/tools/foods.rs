//! Food library tools
//!
//! Tools for managing the food library and its household measures.

use std::path::Path;

use serde::Serialize;

use crate::db::Database;
use crate::models::{Food, FoodCreate, FoodUpdate, HouseholdMeasure, Nutrition};

/// Response for add_food
#[derive(Debug, Serialize)]
pub struct AddFoodResponse {
    pub id: i64,
    pub name: String,
    pub measures: usize,
    pub created_at: String,
}

/// Summary of a food for list/search results
#[derive(Debug, Serialize)]
pub struct FoodSummary {
    pub id: i64,
    pub name: String,
    pub group: Option<String>,
    pub energy: f64,
    pub measures: Vec<String>,
}

impl From<&Food> for FoodSummary {
    fn from(food: &Food) -> Self {
        Self {
            id: food.id,
            name: food.name.clone(),
            group: food.group.clone(),
            energy: food.per_100g.energy,
            measures: food.measures.iter().map(|m| m.singular.clone()).collect(),
        }
    }
}

/// Response for search_foods
#[derive(Debug, Serialize)]
pub struct SearchFoodsResponse {
    pub items: Vec<FoodSummary>,
    pub total: usize,
}

/// Response for list_foods
#[derive(Debug, Serialize)]
pub struct ListFoodsResponse {
    pub items: Vec<FoodSummary>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
    pub groups: Vec<String>,
}

/// Response for update_food
#[derive(Debug, Serialize)]
pub struct UpdateFoodResponse {
    pub success: bool,
    pub per_100g: Nutrition,
    pub updated_at: String,
}

/// Response for delete_food and remove_household_measure
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub deleted_id: i64,
}

/// Response for add_household_measure
#[derive(Debug, Serialize)]
pub struct AddMeasureResponse {
    pub food_id: i64,
    pub measure: HouseholdMeasure,
    pub grams_per_unit: Option<f64>,
}

/// One rejected import entry
#[derive(Debug, Serialize)]
pub struct ImportError {
    pub index: usize,
    pub name: String,
    pub error: String,
}

/// Response for import_foods
#[derive(Debug, Default, Serialize)]
pub struct ImportFoodsResponse {
    pub success: bool,
    pub total: usize,
    pub imported: usize,
    pub skipped_duplicates: usize,
    pub errors: Vec<ImportError>,
}

/// Add a new food
pub fn add_food(db: &Database, data: FoodCreate) -> Result<AddFoodResponse, String> {
    data.validate()?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let food = Food::create(&conn, &data).map_err(|e| format!("Failed to create food: {}", e))?;

    Ok(AddFoodResponse {
        id: food.id,
        name: food.name,
        measures: food.measures.len(),
        created_at: food.created_at,
    })
}

/// Get a food by ID with its measures
pub fn get_food(db: &Database, id: i64) -> Result<Option<Food>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    Food::get_by_id(&conn, id).map_err(|e| format!("Failed to get food: {}", e))
}

/// Search foods by name or group
pub fn search_foods(db: &Database, query: &str, limit: i64) -> Result<SearchFoodsResponse, String> {
    let limit = limit.clamp(1, 100);
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let foods = Food::search(&conn, query, limit).map_err(|e| format!("Search failed: {}", e))?;

    let items: Vec<FoodSummary> = foods.iter().map(FoodSummary::from).collect();
    let total = items.len();

    Ok(SearchFoodsResponse { items, total })
}

/// List foods with filtering and pagination
pub fn list_foods(
    db: &Database,
    group: Option<&str>,
    sort_by: &str,
    sort_order: &str,
    limit: i64,
    offset: i64,
) -> Result<ListFoodsResponse, String> {
    let limit = limit.clamp(1, 200);
    let offset = offset.max(0);

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let foods = Food::list(&conn, group, sort_by, sort_order, limit, offset)
        .map_err(|e| format!("Failed to list foods: {}", e))?;
    let total = Food::count(&conn, group).map_err(|e| format!("Failed to count foods: {}", e))?;
    let groups = Food::groups(&conn).map_err(|e| format!("Failed to list groups: {}", e))?;

    Ok(ListFoodsResponse {
        items: foods.iter().map(FoodSummary::from).collect(),
        total,
        limit,
        offset,
        groups,
    })
}

/// Update a food's descriptive fields or per-100g values
pub fn update_food(db: &Database, id: i64, data: FoodUpdate) -> Result<UpdateFoodResponse, String> {
    if let Some(ref name) = data.name {
        if name.trim().is_empty() {
            return Err("Food name cannot be empty".to_string());
        }
    }
    let numeric = [
        ("energy", data.energy),
        ("fat", data.fat),
        ("carbohydrate", data.carbohydrate),
        ("protein", data.protein),
        ("fiber", data.fiber),
        ("sodium", data.sodium),
    ];
    if let Some((field, _)) = numeric.iter().find(|(_, v)| v.is_some_and(|v| v < 0.0)) {
        return Err(format!("{} cannot be negative", field));
    }
    if let Some(ref micros) = data.micronutrients {
        if let Some((key, _)) = micros.iter().find(|(_, v)| **v < 0.0) {
            return Err(format!("micronutrient '{}' cannot be negative", key));
        }
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    match Food::update(&conn, id, &data).map_err(|e| format!("Failed to update food: {}", e))? {
        Some(food) => Ok(UpdateFoodResponse {
            success: true,
            per_100g: food.per_100g,
            updated_at: food.updated_at,
        }),
        None => Err(format!("Food not found with id: {}", id)),
    }
}

/// Delete a food and its measures
pub fn delete_food(db: &Database, id: i64) -> Result<DeleteResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let deleted = Food::delete(&conn, id).map_err(|e| format!("Failed to delete food: {}", e))?;
    if !deleted {
        return Err(format!("Food not found with id: {}", id));
    }

    Ok(DeleteResponse {
        success: true,
        deleted_id: id,
    })
}

/// Attach a household measure to an existing food
pub fn add_household_measure(
    db: &Database,
    food_id: i64,
    measure: HouseholdMeasure,
) -> Result<AddMeasureResponse, String> {
    measure.validate()?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let food = Food::get_by_id(&conn, food_id).map_err(|e| format!("Database error: {}", e))?;
    let food = food.ok_or_else(|| format!("Food not found with id: {}", food_id))?;

    if food.measures.iter().any(|m| m.matches(&measure.singular)) {
        return Err(format!(
            "Food '{}' already has a measure named '{}'",
            food.name, measure.singular
        ));
    }

    let created = HouseholdMeasure::create(&conn, food_id, &measure)
        .map_err(|e| format!("Failed to add measure: {}", e))?;

    Ok(AddMeasureResponse {
        food_id,
        grams_per_unit: created.grams_per_unit(),
        measure: created,
    })
}

/// Remove a household measure
pub fn remove_household_measure(db: &Database, id: i64) -> Result<DeleteResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let deleted = HouseholdMeasure::delete(&conn, id)
        .map_err(|e| format!("Failed to remove measure: {}", e))?;
    if !deleted {
        return Err(format!("Household measure not found with id: {}", id));
    }

    Ok(DeleteResponse {
        success: true,
        deleted_id: id,
    })
}

/// Import a batch of food records in one transaction
///
/// Invalid entries are reported and skipped; names already in the library
/// are skipped as duplicates.
pub fn import_food_records(db: &Database, records: Vec<FoodCreate>) -> Result<ImportFoodsResponse, String> {
    let mut response = ImportFoodsResponse {
        total: records.len(),
        ..Default::default()
    };

    db.with_conn_mut(|conn| {
        let tx = conn.transaction()?;
        for (index, record) in records.iter().enumerate() {
            if let Err(error) = record.validate() {
                response.errors.push(ImportError {
                    index,
                    name: record.name.clone(),
                    error,
                });
                continue;
            }
            if Food::get_by_name(&tx, &record.name)?.is_some() {
                response.skipped_duplicates += 1;
                continue;
            }
            Food::create(&tx, record)?;
            response.imported += 1;
        }
        tx.commit()?;
        Ok(())
    })
    .map_err(|e| format!("Import failed: {}", e))?;

    response.success = true;
    tracing::info!(
        "Imported {} of {} foods ({} duplicates, {} invalid)",
        response.imported,
        response.total,
        response.skipped_duplicates,
        response.errors.len()
    );

    Ok(response)
}

/// Import foods from a JSON array file
pub fn import_foods(db: &Database, path: &Path) -> Result<ImportFoodsResponse, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    let records: Vec<FoodCreate> = serde_json::from_str(&text)
        .map_err(|e| format!("Invalid food file {}: {}", path.display(), e))?;

    import_food_records(db, records)
}

/// Import the seed file only when the library is empty
pub fn seed_if_empty(db: &Database, path: &Path) -> Result<Option<ImportFoodsResponse>, String> {
    let count = db
        .with_conn(|conn| Food::count(conn, None))
        .map_err(|e| format!("Database error: {}", e))?;

    if count > 0 {
        tracing::info!("Food library already has {} foods, skipping seed", count);
        return Ok(None);
    }

    import_foods(db, path).map(Some)
}
