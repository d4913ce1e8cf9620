//! NutriClin Tools module
//!
//! MCP tool implementations.

pub mod calculations;
pub mod foods;
pub mod status;
