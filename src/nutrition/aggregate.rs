//! Nutrition aggregation
//!
//! Sums per-100g nutrient values over ingredient lines, each scaled by the
//! line's resolved gram weight. Pure: the same lines always give the same
//! totals, in any order.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{Food, IngredientLine, Nutrition};
use super::units::{resolve_weight, UnitBasis};

/// What a single ingredient line adds to the total
#[derive(Debug, Clone, Serialize)]
pub struct LineContribution {
    pub food_id: i64,
    pub food_name: String,
    pub quantity: f64,
    pub unit: String,
    pub grams: f64,
    pub basis: UnitBasis,
    pub nutrition: Nutrition,
}

/// Totals plus the per-line breakdown behind them
#[derive(Debug, Clone, Default, Serialize)]
pub struct Aggregation {
    pub totals: Nutrition,
    pub micronutrients: BTreeMap<String, f64>,
    pub total_grams: f64,
    pub lines: Vec<LineContribution>,
}

impl Aggregation {
    /// Totals divided by servings; unchanged when servings is not positive
    pub fn per_serving(&self, servings: f64) -> Nutrition {
        if servings > 0.0 {
            self.totals.scale(1.0 / servings)
        } else {
            self.totals
        }
    }

    /// Totals normalised to 100 g of the whole preparation
    pub fn per_100g(&self) -> Nutrition {
        if self.total_grams > 0.0 {
            self.totals.scale(100.0 / self.total_grams)
        } else {
            Nutrition::zero()
        }
    }

    /// Lines whose unit could not be resolved
    pub fn fallback_lines(&self) -> impl Iterator<Item = &LineContribution> {
        self.lines.iter().filter(|l| l.basis == UnitBasis::Fallback)
    }
}

/// Resolve one line and scale its food's per-100g values
pub fn line_contribution(line: &IngredientLine) -> LineContribution {
    let resolved = resolve_weight(line.quantity, &line.unit, &line.food.measures);
    LineContribution {
        food_id: line.food.id,
        food_name: line.food.name.clone(),
        quantity: line.quantity,
        unit: line.unit.clone(),
        grams: resolved.grams,
        nutrition: line.food.per_100g.for_grams(resolved.grams),
        basis: resolved.basis,
    }
}

/// The six totals for a list of ingredient lines
pub fn aggregate(lines: &[IngredientLine]) -> Nutrition {
    lines.iter().map(|l| line_contribution(l).nutrition).sum()
}

/// Totals, micronutrients, weight and per-line detail
pub fn aggregate_detailed(lines: &[IngredientLine]) -> Aggregation {
    let mut result = Aggregation::default();

    for line in lines {
        let contribution = line_contribution(line);

        for (name, per_100g) in &line.food.micronutrients {
            *result.micronutrients.entry(name.clone()).or_insert(0.0) +=
                per_100g * contribution.grams / 100.0;
        }

        result.totals = result.totals + contribution.nutrition;
        result.total_grams += contribution.grams;
        result.lines.push(contribution);
    }

    result
}

/// Nutrients of one food at a chosen portion
pub fn scale_portion(food: &Food, quantity: f64, unit: &str) -> Aggregation {
    aggregate_detailed(&[IngredientLine::new(food.clone(), quantity, unit)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FoodCreate, HouseholdMeasure};

    fn food(name: &str, energy: f64, measures: Vec<HouseholdMeasure>) -> Food {
        Food::transient(FoodCreate {
            name: name.to_string(),
            group: None,
            source: None,
            nutrients: Nutrition {
                energy,
                fat: 1.0,
                carbohydrate: 20.0,
                protein: 5.0,
                fiber: 2.0,
                sodium: 10.0,
            },
            micronutrients: BTreeMap::new(),
            measures,
        })
    }

    fn rice() -> Food {
        food("Rice", 124.0, vec![])
    }

    fn egg() -> Food {
        food("Egg", 155.0, vec![HouseholdMeasure::new("unit", 1.0, 50.0).with_plural("units")])
    }

    #[test]
    fn test_empty_list_is_zero() {
        assert_eq!(aggregate(&[]), Nutrition::zero());
        let detail = aggregate_detailed(&[]);
        assert_eq!(detail.total_grams, 0.0);
        assert_eq!(detail.per_100g(), Nutrition::zero());
    }

    #[test]
    fn test_rice_and_egg_energy() {
        let lines = vec![
            IngredientLine::new(rice(), 200.0, "g"),
            IngredientLine::new(egg(), 1.0, "unit"),
        ];
        let totals = aggregate(&lines);
        assert!((totals.energy - 325.5).abs() < 1e-9);
    }

    #[test]
    fn test_total_is_sum_of_lines() {
        let lines = vec![
            IngredientLine::new(rice(), 150.0, "g"),
            IngredientLine::new(egg(), 2.0, "units"),
            IngredientLine::new(rice(), 0.1, "Kg"),
        ];
        let detail = aggregate_detailed(&lines);
        let expected: f64 = detail.lines.iter().map(|l| l.nutrition.protein).sum();
        assert!((detail.totals.protein - expected).abs() < 1e-9);
        assert!((detail.total_grams - 350.0).abs() < 1e-9);
        // energy = 124*1.5 + 155*1.0 + 124*1.0
        assert!((detail.totals.energy - 465.0).abs() < 1e-9);
    }

    #[test]
    fn test_doubling_quantity_doubles_contribution() {
        let base = vec![IngredientLine::new(egg(), 1.5, "unit")];
        let doubled: Vec<_> = base.iter().map(|l| l.scaled(2.0)).collect();
        let a = aggregate(&base);
        let b = aggregate(&doubled);
        assert!((b.energy - 2.0 * a.energy).abs() < 1e-9);
        assert!((b.fat - 2.0 * a.fat).abs() < 1e-9);
        assert!((b.sodium - 2.0 * a.sodium).abs() < 1e-9);
    }

    #[test]
    fn test_order_does_not_matter_and_is_idempotent() {
        let lines = vec![
            IngredientLine::new(rice(), 80.0, "g"),
            IngredientLine::new(egg(), 1.0, "unit"),
        ];
        let reversed: Vec<_> = lines.iter().rev().cloned().collect();
        let first = aggregate(&lines);
        assert_eq!(first, aggregate(&lines));
        assert!((first.energy - aggregate(&reversed).energy).abs() < 1e-9);
    }

    #[test]
    fn test_fallback_line_is_reported() {
        let lines = vec![IngredientLine::new(rice(), 50.0, "xyz")];
        let detail = aggregate_detailed(&lines);
        assert_eq!(detail.lines[0].grams, 50.0);
        assert_eq!(detail.fallback_lines().count(), 1);
        assert!((detail.totals.energy - 62.0).abs() < 1e-9);
    }

    #[test]
    fn test_micronutrients_union_of_keys() {
        let mut with_iron = rice();
        with_iron.micronutrients.insert("iron".to_string(), 2.0);
        let mut with_zinc = egg();
        with_zinc.micronutrients.insert("zinc".to_string(), 1.0);

        let detail = aggregate_detailed(&[
            IngredientLine::new(with_iron, 50.0, "g"),
            IngredientLine::new(with_zinc, 2.0, "unit"),
        ]);
        assert!((detail.micronutrients["iron"] - 1.0).abs() < 1e-9);
        assert!((detail.micronutrients["zinc"] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_per_serving_and_per_100g() {
        let detail = aggregate_detailed(&[IngredientLine::new(rice(), 400.0, "g")]);
        assert!((detail.per_serving(4.0).energy - 124.0).abs() < 1e-9);
        assert_eq!(detail.per_serving(0.0), detail.totals);
        assert!((detail.per_100g().energy - 124.0).abs() < 1e-9);
    }

    #[test]
    fn test_scale_portion() {
        let portion = scale_portion(&egg(), 3.0, "units");
        assert!((portion.total_grams - 150.0).abs() < 1e-9);
        assert!((portion.totals.energy - 232.5).abs() < 1e-9);
    }
}
