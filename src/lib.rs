//! NutriClin Library
//!
//! Nutrition calculations for clinical dietetics: unit resolution,
//! recipe and meal plan aggregation, and macronutrient shares.

pub mod build_info;
pub mod config;
pub mod db;
pub mod mcp;
pub mod models;
pub mod nutrition;
pub mod tools;
