//! Meal plan summaries
//!
//! Per-meal and whole-day totals for an authored meal plan.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{MealPlan, Nutrition};
use super::aggregate::aggregate_detailed;
use super::shares::{adequacy, energy_distribution, macro_shares, percent_of, MacroShares};

#[derive(Debug, Clone, Serialize)]
pub struct MealSummary {
    pub name: String,
    pub time: Option<String>,
    pub totals: Nutrition,
    pub total_grams: f64,
    /// Percent of the day's energy this meal provides
    pub energy_share: f64,
}

/// A line whose unit fell back to grams
#[derive(Debug, Clone, Serialize)]
pub struct UnresolvedLine {
    pub meal: String,
    pub food_name: String,
    pub quantity: f64,
    pub unit: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MealPlanSummary {
    pub name: String,
    pub meals: Vec<MealSummary>,
    pub totals: Nutrition,
    pub micronutrients: BTreeMap<String, f64>,
    pub macro_shares: MacroShares,
    pub energy_distribution: MacroShares,
    pub energy_target: Option<f64>,
    pub energy_adequacy: Option<f64>,
    pub unresolved_lines: Vec<UnresolvedLine>,
}

pub fn summarize_meal_plan(plan: &MealPlan) -> MealPlanSummary {
    let mut totals = Nutrition::zero();
    let mut micronutrients: BTreeMap<String, f64> = BTreeMap::new();
    let mut meals = Vec::with_capacity(plan.meals.len());
    let mut unresolved_lines = Vec::new();

    for meal in &plan.meals {
        let detail = aggregate_detailed(&meal.lines);

        totals = totals + detail.totals;
        for (name, amount) in &detail.micronutrients {
            *micronutrients.entry(name.clone()).or_insert(0.0) += amount;
        }
        unresolved_lines.extend(detail.fallback_lines().map(|l| UnresolvedLine {
            meal: meal.name.clone(),
            food_name: l.food_name.clone(),
            quantity: l.quantity,
            unit: l.unit.clone(),
        }));

        meals.push(MealSummary {
            name: meal.name.clone(),
            time: meal.time.clone(),
            totals: detail.totals,
            total_grams: detail.total_grams,
            energy_share: 0.0,
        });
    }

    for meal in &mut meals {
        meal.energy_share = percent_of(meal.totals.energy, totals.energy);
    }

    MealPlanSummary {
        name: plan.name.clone(),
        meals,
        totals,
        micronutrients,
        macro_shares: macro_shares(&totals),
        energy_distribution: energy_distribution(&totals),
        energy_target: plan.energy_target,
        energy_adequacy: plan.energy_target.and_then(|t| adequacy(totals.energy, t)),
        unresolved_lines,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Food, FoodCreate, HouseholdMeasure, IngredientLine, Meal};

    fn food(name: &str, energy: f64, protein: f64) -> Food {
        Food::transient(FoodCreate {
            name: name.to_string(),
            group: None,
            source: None,
            nutrients: Nutrition {
                energy,
                protein,
                ..Default::default()
            },
            micronutrients: BTreeMap::from([("calcium".to_string(), 10.0)]),
            measures: vec![HouseholdMeasure::new("fatia", 1.0, 25.0)],
        })
    }

    fn plan() -> MealPlan {
        MealPlan {
            name: "Plano A".to_string(),
            energy_target: Some(1000.0),
            meals: vec![
                Meal {
                    name: "Café da manhã".to_string(),
                    time: Some("07:00".to_string()),
                    lines: vec![IngredientLine::new(food("Pão", 300.0, 8.0), 2.0, "fatia")],
                },
                Meal {
                    name: "Almoço".to_string(),
                    time: None,
                    lines: vec![
                        IngredientLine::new(food("Arroz", 124.0, 2.5), 200.0, "g"),
                        IngredientLine::new(food("Feijão", 76.0, 4.8), 1.0, "concha"),
                    ],
                },
            ],
        }
    }

    #[test]
    fn test_day_totals_and_meal_shares() {
        let summary = summarize_meal_plan(&plan());
        // breakfast 50 g bread = 150 kcal; lunch 248 + 0.76 (fallback 1 g)
        assert!((summary.meals[0].totals.energy - 150.0).abs() < 1e-9);
        assert!((summary.meals[1].totals.energy - 248.76).abs() < 1e-9);
        assert!((summary.totals.energy - 398.76).abs() < 1e-9);

        let share_sum: f64 = summary.meals.iter().map(|m| m.energy_share).sum();
        assert!((share_sum - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_adequacy_and_unresolved_lines() {
        let summary = summarize_meal_plan(&plan());
        let adequacy = summary.energy_adequacy.unwrap();
        assert!((adequacy - 39.876).abs() < 1e-9);

        assert_eq!(summary.unresolved_lines.len(), 1);
        assert_eq!(summary.unresolved_lines[0].meal, "Almoço");
        assert_eq!(summary.unresolved_lines[0].unit, "concha");
    }

    #[test]
    fn test_micronutrients_across_meals() {
        let summary = summarize_meal_plan(&plan());
        // 50 g + 200 g + 1 g at 10 per 100 g
        assert!((summary.micronutrients["calcium"] - 25.1).abs() < 1e-9);
    }

    #[test]
    fn test_empty_plan() {
        let summary = summarize_meal_plan(&MealPlan {
            name: "Vazio".to_string(),
            energy_target: None,
            meals: vec![],
        });
        assert_eq!(summary.totals, Nutrition::zero());
        assert!(summary.energy_adequacy.is_none());
    }
}
