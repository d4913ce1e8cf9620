//! Meal plan model
//!
//! A day of meals authored for a patient. Only the in-memory shape is
//! modelled here; totals are derived on demand and never stored.

use serde::Serialize;

use super::IngredientLine;

#[derive(Debug, Clone, Serialize)]
pub struct Meal {
    pub name: String,
    /// Free-form time label ("07:30")
    pub time: Option<String>,
    pub lines: Vec<IngredientLine>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MealPlan {
    pub name: String,
    /// Daily energy target in kcal
    pub energy_target: Option<f64>,
    pub meals: Vec<Meal>,
}
