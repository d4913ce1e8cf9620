//! Unit resolution
//!
//! Turns an ingredient quantity into grams, either through a fixed mass or
//! volume factor or through one of the food's household measures.

use serde::{Deserialize, Serialize};

use crate::models::HouseholdMeasure;

/// Grams per milligram
pub const G_PER_MG: f64 = 0.001;
/// Grams per kilogram
pub const G_PER_KG: f64 = 1000.0;
/// Milliliters per liter (volume is taken at 1 g/ml)
pub const ML_PER_LITER: f64 = 1000.0;

/// How a line's grams were obtained
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum UnitBasis {
    /// g, Kg, mg, ml or L
    Fixed,
    /// One of the food's household measures
    HouseholdMeasure { name: String, grams_per_unit: f64 },
    /// Unit not recognised; quantity taken as grams
    Fallback,
}

/// Result of resolving a quantity and unit to grams
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedWeight {
    pub grams: f64,
    pub basis: UnitBasis,
}

impl ResolvedWeight {
    pub fn is_fallback(&self) -> bool {
        self.basis == UnitBasis::Fallback
    }
}

/// Multiplier to grams for the fixed mass/volume units
///
/// Only these exact spellings are fixed; "kg" or "G" go through the
/// household measures and then the gram fallback like any other name.
pub fn fixed_unit_factor(unit: &str) -> Option<f64> {
    match unit {
        "g" | "ml" => Some(1.0),
        "Kg" => Some(G_PER_KG),
        "L" => Some(ML_PER_LITER),
        "mg" => Some(G_PER_MG),
        _ => None,
    }
}

/// First usable household measure named by `unit`
///
/// Measures with a non-positive quantity cannot give a ratio and are passed over.
pub fn find_measure<'a>(unit: &str, measures: &'a [HouseholdMeasure]) -> Option<&'a HouseholdMeasure> {
    measures
        .iter()
        .find(|m| m.matches(unit) && m.grams_per_unit().is_some())
}

/// Resolve a quantity in `unit` to grams, reporting how it was done
pub fn resolve_weight(quantity: f64, unit: &str, measures: &[HouseholdMeasure]) -> ResolvedWeight {
    if let Some(factor) = fixed_unit_factor(unit) {
        return ResolvedWeight {
            grams: quantity * factor,
            basis: UnitBasis::Fixed,
        };
    }

    if let Some((measure, ratio)) =
        find_measure(unit, measures).and_then(|m| m.grams_per_unit().map(|r| (m, r)))
    {
        return ResolvedWeight {
            grams: quantity * ratio,
            basis: UnitBasis::HouseholdMeasure {
                name: measure.singular.clone(),
                grams_per_unit: ratio,
            },
        };
    }

    // Intent is ambiguous here; the raw quantity is kept as grams
    tracing::warn!(
        "Unit '{}' matches no fixed unit or household measure. Treating {} as grams.",
        unit,
        quantity
    );
    ResolvedWeight {
        grams: quantity,
        basis: UnitBasis::Fallback,
    }
}

/// Equivalent weight in grams
pub fn resolve_grams(quantity: f64, unit: &str, measures: &[HouseholdMeasure]) -> f64 {
    resolve_weight(quantity, unit, measures).grams
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spoon() -> Vec<HouseholdMeasure> {
        vec![HouseholdMeasure::new("spoon", 1.0, 15.0).with_plural("spoons")]
    }

    #[test]
    fn test_fixed_units() {
        assert_eq!(resolve_grams(250.0, "g", &[]), 250.0);
        assert_eq!(resolve_grams(250.0, "ml", &[]), 250.0);
        assert_eq!(resolve_grams(1.5, "Kg", &[]), 1500.0);
        assert_eq!(resolve_grams(2.0, "L", &[]), 2000.0);
        assert!((resolve_grams(500.0, "mg", &[]) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_fixed_units_are_exact_spellings() {
        assert_eq!(fixed_unit_factor("Kg"), Some(G_PER_KG));
        assert_eq!(fixed_unit_factor("L"), Some(ML_PER_LITER));
        assert_eq!(fixed_unit_factor("kg"), None);
        assert_eq!(fixed_unit_factor(" g "), None);
        assert_eq!(fixed_unit_factor("cup"), None);

        let resolved = resolve_weight(1.0, "kg", &[]);
        assert_eq!(resolved.grams, 1.0);
        assert!(resolved.is_fallback());
        assert!(resolve_weight(2.0, "KG", &[]).is_fallback());
    }

    #[test]
    fn test_measure_named_like_a_fixed_unit_in_other_case() {
        let measures = vec![HouseholdMeasure::new("G", 1.0, 5.0)];
        let resolved = resolve_weight(2.0, "G", &measures);
        assert_eq!(resolved.grams, 10.0);
        assert!(!resolved.is_fallback());
        assert_eq!(resolve_grams(2.0, "g", &measures), 2.0);
    }

    #[test]
    fn test_measure_names_are_case_sensitive() {
        assert!(resolve_weight(3.0, "Spoon", &spoon()).is_fallback());
        assert_eq!(resolve_grams(3.0, "Spoon", &spoon()), 3.0);
    }

    #[test]
    fn test_household_measure_resolution() {
        let resolved = resolve_weight(3.0, "spoon", &spoon());
        assert_eq!(resolved.grams, 45.0);
        assert_eq!(
            resolved.basis,
            UnitBasis::HouseholdMeasure {
                name: "spoon".to_string(),
                grams_per_unit: 15.0
            }
        );
    }

    #[test]
    fn test_plural_measure_name() {
        assert_eq!(resolve_grams(2.0, "spoons", &spoon()), 30.0);
    }

    #[test]
    fn test_measure_ratio_uses_measure_quantity() {
        let measures = vec![HouseholdMeasure::new("slice", 2.0, 50.0)];
        assert_eq!(resolve_grams(3.0, "slice", &measures), 75.0);
    }

    #[test]
    fn test_unknown_unit_falls_back_to_grams() {
        let resolved = resolve_weight(50.0, "xyz", &spoon());
        assert_eq!(resolved.grams, 50.0);
        assert!(resolved.is_fallback());
    }

    #[test]
    fn test_zero_quantity_measure_is_skipped() {
        let measures = vec![
            HouseholdMeasure::new("cup", 0.0, 200.0),
            HouseholdMeasure::new("cup", 1.0, 160.0),
        ];
        assert_eq!(resolve_grams(1.0, "cup", &measures), 160.0);

        let only_broken = vec![HouseholdMeasure::new("cup", 0.0, 200.0)];
        assert!(resolve_weight(1.0, "cup", &only_broken).is_fallback());
    }

    #[test]
    fn test_fixed_unit_wins_over_measure_name() {
        let measures = vec![HouseholdMeasure::new("g", 1.0, 999.0)];
        assert_eq!(resolve_grams(10.0, "g", &measures), 10.0);
    }

    #[test]
    fn test_resolution_is_linear() {
        for unit in ["g", "Kg", "spoon", "xyz"] {
            let single = resolve_grams(4.0, unit, &spoon());
            let double = resolve_grams(8.0, unit, &spoon());
            assert!((double - 2.0 * single).abs() < 1e-9, "unit {}", unit);
        }
    }
}
