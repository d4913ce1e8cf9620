//! Data models
//!
//! Foods, measures and the in-memory shapes the nutrition calculations
//! consume.

mod food;
mod ingredient;
mod meal_plan;
pub mod numeric;
mod nutrition;

pub use food::{Food, FoodCreate, FoodUpdate, HouseholdMeasure};
pub use ingredient::IngredientLine;
pub use meal_plan::{Meal, MealPlan};
pub use nutrition::Nutrition;
