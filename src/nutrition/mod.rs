//! Nutrition calculation module
//!
//! Unit resolution, aggregation over ingredient lines, and the percentage
//! transforms used for charts.

pub mod aggregate;
pub mod plan;
pub mod shares;
pub mod units;

pub use aggregate::{
    aggregate, aggregate_detailed, line_contribution, scale_portion, Aggregation, LineContribution,
};
pub use plan::{summarize_meal_plan, MealPlanSummary, MealSummary, UnresolvedLine};
pub use shares::{adequacy, energy_distribution, macro_shares, percent_of, MacroShares};
pub use units::{fixed_unit_factor, resolve_grams, resolve_weight, ResolvedWeight, UnitBasis};
