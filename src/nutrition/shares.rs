//! Percentage displays
//!
//! Bar-chart shares for macronutrients, energy distribution and adequacy
//! against a target. Presentation transforms only.

use serde::Serialize;

use crate::models::Nutrition;

/// Energy yield of fat (kcal per gram)
pub const KCAL_PER_G_FAT: f64 = 9.0;
/// Energy yield of carbohydrate (kcal per gram)
pub const KCAL_PER_G_CARBOHYDRATE: f64 = 4.0;
/// Energy yield of protein (kcal per gram)
pub const KCAL_PER_G_PROTEIN: f64 = 4.0;

/// Percentage of each energy-yielding macronutrient
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MacroShares {
    pub fat: f64,
    pub carbohydrate: f64,
    pub protein: f64,
}

/// Clamp a percentage to the 0-100 display range; non-finite values become 0
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// `value / total * 100`, clamped; 0 when the total is not positive
pub fn percent_of(value: f64, total: f64) -> f64 {
    if total > 0.0 {
        clamp_percent(value / total * 100.0)
    } else {
        0.0
    }
}

fn shares_of(fat: f64, carbohydrate: f64, protein: f64) -> MacroShares {
    let sum = fat + carbohydrate + protein;
    MacroShares {
        fat: percent_of(fat, sum),
        carbohydrate: percent_of(carbohydrate, sum),
        protein: percent_of(protein, sum),
    }
}

/// Each macro's share of the summed macro grams
pub fn macro_shares(nutrition: &Nutrition) -> MacroShares {
    shares_of(nutrition.fat, nutrition.carbohydrate, nutrition.protein)
}

/// Each macro's share of the energy it yields (9/4/4 kcal per gram)
pub fn energy_distribution(nutrition: &Nutrition) -> MacroShares {
    shares_of(
        nutrition.fat * KCAL_PER_G_FAT,
        nutrition.carbohydrate * KCAL_PER_G_CARBOHYDRATE,
        nutrition.protein * KCAL_PER_G_PROTEIN,
    )
}

/// How much of a target is met, in percent (not clamped)
pub fn adequacy(value: f64, target: f64) -> Option<f64> {
    if target > 0.0 {
        Some(value / target * 100.0)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn totals(fat: f64, carbohydrate: f64, protein: f64) -> Nutrition {
        Nutrition {
            fat,
            carbohydrate,
            protein,
            ..Default::default()
        }
    }

    #[test]
    fn test_macro_shares_sum_to_100() {
        let s = macro_shares(&totals(10.0, 60.0, 30.0));
        assert!((s.fat - 10.0).abs() < 1e-9);
        assert!((s.carbohydrate - 60.0).abs() < 1e-9);
        assert!((s.protein - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_sum_gives_zero_shares() {
        assert_eq!(macro_shares(&Nutrition::zero()), MacroShares::default());
        assert_eq!(energy_distribution(&Nutrition::zero()), MacroShares::default());
    }

    #[test]
    fn test_shares_clamped() {
        // A negative neighbour would push the share past 100
        let s = macro_shares(&totals(-5.0, 10.0, 0.0));
        assert_eq!(s.carbohydrate, 100.0);
        assert_eq!(s.fat, 0.0);
        assert_eq!(clamp_percent(f64::NAN), 0.0);
        assert_eq!(clamp_percent(140.0), 100.0);
    }

    #[test]
    fn test_energy_distribution() {
        // 10 g fat = 90 kcal, 40 g carbs = 160 kcal, 25 g protein = 100 kcal
        let d = energy_distribution(&totals(10.0, 40.0, 25.0));
        assert!((d.fat - 90.0 / 350.0 * 100.0).abs() < 1e-9);
        assert!((d.carbohydrate - 160.0 / 350.0 * 100.0).abs() < 1e-9);
        assert!((d.protein - 100.0 / 350.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_adequacy() {
        assert_eq!(adequacy(2200.0, 2000.0), Some(110.0));
        assert_eq!(adequacy(100.0, 0.0), None);
    }
}
