//! Ingredient line model
//!
//! A food plus the quantity and unit a user typed into a recipe or meal.

use serde::Serialize;

use super::Food;

#[derive(Debug, Clone, Serialize)]
pub struct IngredientLine {
    pub food: Food,
    pub quantity: f64,
    /// g, Kg, mg, ml, L, or one of the food's household measure names
    pub unit: String,
}

impl IngredientLine {
    pub fn new(food: Food, quantity: f64, unit: &str) -> Self {
        Self {
            food,
            quantity,
            unit: unit.to_string(),
        }
    }

    /// Same line with the quantity multiplied
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            food: self.food.clone(),
            quantity: self.quantity * factor,
            unit: self.unit.clone(),
        }
    }
}
