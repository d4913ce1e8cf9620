//! Nutrition calculation tools
//!
//! Recipe, meal plan and portion totals. Lines may reference a library food
//! by id or carry an inline food; nothing computed here is stored.

use std::collections::HashMap;

use rusqlite::Connection;
use serde::Serialize;

use crate::db::Database;
use crate::models::{Food, FoodCreate, HouseholdMeasure, IngredientLine, Meal, MealPlan, Nutrition};
use crate::nutrition::{
    aggregate_detailed, energy_distribution, macro_shares, resolve_weight, scale_portion,
    summarize_meal_plan, LineContribution, MacroShares, MealPlanSummary, UnitBasis,
};

/// An ingredient line as received from a caller
#[derive(Debug, Clone)]
pub struct LineInput {
    pub food_id: Option<i64>,
    pub food: Option<FoodCreate>,
    pub quantity: f64,
    pub unit: String,
}

/// A meal as received from a caller
#[derive(Debug, Clone)]
pub struct MealInput {
    pub name: String,
    pub time: Option<String>,
    pub lines: Vec<LineInput>,
}

/// Response for resolve_grams
#[derive(Debug, Serialize)]
pub struct ResolveGramsResponse {
    pub food_name: Option<String>,
    pub quantity: f64,
    pub unit: String,
    pub grams: f64,
    pub basis: UnitBasis,
}

/// Response for calculate_recipe_nutrition
#[derive(Debug, Serialize)]
pub struct RecipeNutritionResponse {
    pub servings: f64,
    pub totals: Nutrition,
    pub per_serving: Nutrition,
    pub per_100g: Nutrition,
    pub total_grams: f64,
    pub micronutrients: std::collections::BTreeMap<String, f64>,
    pub macro_shares: MacroShares,
    pub energy_distribution: MacroShares,
    pub lines: Vec<LineContribution>,
    /// Units that matched nothing and were taken as grams
    pub unresolved_units: Vec<String>,
}

/// Response for scale_food_portion
#[derive(Debug, Serialize)]
pub struct PortionResponse {
    pub food_id: i64,
    pub food_name: String,
    pub quantity: f64,
    pub unit: String,
    pub grams: f64,
    pub basis: UnitBasis,
    pub nutrition: Nutrition,
    pub micronutrients: std::collections::BTreeMap<String, f64>,
    pub macro_shares: MacroShares,
}

/// Response for macro_shares
#[derive(Debug, Serialize)]
pub struct MacroSharesResponse {
    pub macro_shares: MacroShares,
    pub energy_distribution: MacroShares,
}

fn load_food(conn: &Connection, cache: &mut HashMap<i64, Food>, id: i64) -> Result<Food, String> {
    if let Some(food) = cache.get(&id) {
        return Ok(food.clone());
    }
    let food = Food::get_by_id(conn, id)
        .map_err(|e| format!("Database error: {}", e))?
        .ok_or_else(|| format!("Food not found with id: {}", id))?;
    cache.insert(id, food.clone());
    Ok(food)
}

fn build_lines(
    conn: &Connection,
    cache: &mut HashMap<i64, Food>,
    inputs: Vec<LineInput>,
) -> Result<Vec<IngredientLine>, String> {
    inputs
        .into_iter()
        .enumerate()
        .map(|(index, input)| {
            let food = match (input.food_id, input.food) {
                (Some(id), _) => load_food(conn, cache, id)?,
                (None, Some(inline)) => Food::transient(inline),
                (None, None) => {
                    return Err(format!("Line {}: provide either food_id or food", index + 1))
                }
            };
            Ok(IngredientLine {
                food,
                quantity: input.quantity,
                unit: input.unit,
            })
        })
        .collect()
}

/// Resolve a quantity and unit to grams for a library food or a bare measure list
pub fn resolve_grams(
    db: &Database,
    food_id: Option<i64>,
    measures: Vec<HouseholdMeasure>,
    quantity: f64,
    unit: &str,
) -> Result<ResolveGramsResponse, String> {
    let (food_name, measures) = match food_id {
        Some(id) => {
            let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
            let food = Food::get_by_id(&conn, id)
                .map_err(|e| format!("Database error: {}", e))?
                .ok_or_else(|| format!("Food not found with id: {}", id))?;
            (Some(food.name), food.measures)
        }
        None => (None, measures),
    };

    let resolved = resolve_weight(quantity, unit, &measures);

    Ok(ResolveGramsResponse {
        food_name,
        quantity,
        unit: unit.to_string(),
        grams: resolved.grams,
        basis: resolved.basis,
    })
}

/// Totals and breakdown for a recipe's ingredient lines
pub fn calculate_recipe_nutrition(
    db: &Database,
    lines: Vec<LineInput>,
    servings: f64,
) -> Result<RecipeNutritionResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let mut cache = HashMap::new();
    let lines = build_lines(&conn, &mut cache, lines)?;

    let detail = aggregate_detailed(&lines);
    let unresolved_units = detail.fallback_lines().map(|l| l.unit.clone()).collect();

    Ok(RecipeNutritionResponse {
        servings,
        per_serving: detail.per_serving(servings),
        per_100g: detail.per_100g(),
        macro_shares: macro_shares(&detail.totals),
        energy_distribution: energy_distribution(&detail.totals),
        totals: detail.totals,
        total_grams: detail.total_grams,
        micronutrients: detail.micronutrients,
        lines: detail.lines,
        unresolved_units,
    })
}

/// Per-meal and daily totals for a meal plan
pub fn calculate_meal_plan_nutrition(
    db: &Database,
    name: &str,
    energy_target: Option<f64>,
    meals: Vec<MealInput>,
) -> Result<MealPlanSummary, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let mut cache = HashMap::new();

    let meals = meals
        .into_iter()
        .map(|meal| {
            let lines = build_lines(&conn, &mut cache, meal.lines)
                .map_err(|e| format!("Meal '{}': {}", meal.name, e))?;
            Ok(Meal {
                name: meal.name,
                time: meal.time,
                lines,
            })
        })
        .collect::<Result<Vec<_>, String>>()?;

    let plan = MealPlan {
        name: name.to_string(),
        energy_target,
        meals,
    };

    Ok(summarize_meal_plan(&plan))
}

/// Nutrients of one library food at a chosen portion
pub fn scale_food_portion(
    db: &Database,
    food_id: i64,
    quantity: f64,
    unit: &str,
) -> Result<PortionResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let food = Food::get_by_id(&conn, food_id)
        .map_err(|e| format!("Database error: {}", e))?
        .ok_or_else(|| format!("Food not found with id: {}", food_id))?;

    let mut portion = scale_portion(&food, quantity, unit);
    let line = portion
        .lines
        .pop()
        .ok_or_else(|| "Portion calculation produced no line".to_string())?;

    Ok(PortionResponse {
        food_id: food.id,
        food_name: food.name,
        quantity,
        unit: unit.to_string(),
        grams: line.grams,
        basis: line.basis,
        macro_shares: macro_shares(&portion.totals),
        nutrition: portion.totals,
        micronutrients: portion.micronutrients,
    })
}

/// Chart shares for arbitrary totals
pub fn calculate_macro_shares(totals: &Nutrition) -> MacroSharesResponse {
    MacroSharesResponse {
        macro_shares: macro_shares(totals),
        energy_distribution: energy_distribution(totals),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::tools::foods::add_food;

    fn setup() -> (Database, i64, i64) {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(run_migrations).unwrap();

        let records: Vec<FoodCreate> = serde_json::from_str(
            r#"[
                {"name": "Rice", "energy": 124, "carbohydrate": 28.1, "protein": 2.5, "fat": 0.3,
                 "micronutrients": {"iron": 0.1}},
                {"name": "Egg", "energy": 155, "protein": 13.3, "fat": 9.5,
                 "measures": [{"singular": "unit", "plural": "units", "quantity": "1", "totalGrams": "50"}]}
            ]"#,
        )
        .unwrap();
        let ids: Vec<i64> = records
            .into_iter()
            .map(|r| add_food(&db, r).unwrap().id)
            .collect();
        (db, ids[0], ids[1])
    }

    fn line(food_id: i64, quantity: f64, unit: &str) -> LineInput {
        LineInput {
            food_id: Some(food_id),
            food: None,
            quantity,
            unit: unit.to_string(),
        }
    }

    #[test]
    fn test_recipe_rice_and_egg() {
        let (db, rice, egg) = setup();
        let response =
            calculate_recipe_nutrition(&db, vec![line(rice, 200.0, "g"), line(egg, 1.0, "unit")], 2.0)
                .unwrap();

        assert!((response.totals.energy - 325.5).abs() < 1e-9);
        assert!((response.per_serving.energy - 162.75).abs() < 1e-9);
        assert!((response.total_grams - 250.0).abs() < 1e-9);
        assert!((response.per_100g.energy - 130.2).abs() < 1e-9);
        assert!((response.micronutrients["iron"] - 0.2).abs() < 1e-9);
        assert!(response.unresolved_units.is_empty());
        assert_eq!(response.lines.len(), 2);
    }

    #[test]
    fn test_recipe_with_inline_food_and_fallback() {
        let (db, rice, _) = setup();
        let inline: FoodCreate =
            serde_json::from_str(r#"{"name": "Azeite", "energy": "884", "fat": "100"}"#).unwrap();
        let lines = vec![
            line(rice, 100.0, "g"),
            LineInput {
                food_id: None,
                food: Some(inline),
                quantity: 10.0,
                unit: "fio".to_string(),
            },
        ];
        let response = calculate_recipe_nutrition(&db, lines, 1.0).unwrap();
        assert!((response.totals.energy - (124.0 + 88.4)).abs() < 1e-9);
        assert_eq!(response.unresolved_units, vec!["fio"]);
    }

    #[test]
    fn test_recipe_errors() {
        let (db, _, _) = setup();
        let missing = calculate_recipe_nutrition(&db, vec![line(999, 1.0, "g")], 1.0);
        assert_eq!(missing.unwrap_err(), "Food not found with id: 999");

        let empty_line = LineInput {
            food_id: None,
            food: None,
            quantity: 1.0,
            unit: "g".to_string(),
        };
        let err = calculate_recipe_nutrition(&db, vec![empty_line], 1.0).unwrap_err();
        assert!(err.contains("provide either food_id or food"));
    }

    #[test]
    fn test_resolve_grams_for_library_food_and_bare_measures() {
        let (db, _, egg) = setup();
        let response = resolve_grams(&db, Some(egg), vec![], 3.0, "units").unwrap();
        assert_eq!(response.grams, 150.0);
        assert_eq!(response.food_name.as_deref(), Some("Egg"));

        let spoon = vec![HouseholdMeasure::new("spoon", 1.0, 15.0)];
        assert_eq!(resolve_grams(&db, None, spoon, 3.0, "spoon").unwrap().grams, 45.0);
        assert_eq!(resolve_grams(&db, None, vec![], 50.0, "xyz").unwrap().grams, 50.0);
    }

    #[test]
    fn test_meal_plan() {
        let (db, rice, egg) = setup();
        let meals = vec![
            MealInput {
                name: "Breakfast".to_string(),
                time: Some("07:00".to_string()),
                lines: vec![line(egg, 2.0, "units")],
            },
            MealInput {
                name: "Lunch".to_string(),
                time: None,
                lines: vec![line(rice, 150.0, "g")],
            },
        ];
        let summary = calculate_meal_plan_nutrition(&db, "Plan", Some(1000.0), meals).unwrap();
        assert!((summary.totals.energy - (155.0 + 186.0)).abs() < 1e-9);
        assert!((summary.energy_adequacy.unwrap() - 34.1).abs() < 1e-9);

        let bad = vec![MealInput {
            name: "Dinner".to_string(),
            time: None,
            lines: vec![line(42, 1.0, "g")],
        }];
        let err = calculate_meal_plan_nutrition(&db, "Plan", None, bad).unwrap_err();
        assert!(err.starts_with("Meal 'Dinner'"));
    }

    #[test]
    fn test_scale_food_portion() {
        let (db, _, egg) = setup();
        let portion = scale_food_portion(&db, egg, 2.0, "unit").unwrap();
        assert_eq!(portion.grams, 100.0);
        assert!((portion.nutrition.energy - 155.0).abs() < 1e-9);
        assert!(scale_food_portion(&db, 999, 1.0, "g").is_err());
    }

    #[test]
    fn test_calculate_macro_shares() {
        let totals = Nutrition {
            fat: 10.0,
            carbohydrate: 40.0,
            protein: 50.0,
            ..Default::default()
        };
        let response = calculate_macro_shares(&totals);
        assert!((response.macro_shares.protein - 50.0).abs() < 1e-9);
    }
}
