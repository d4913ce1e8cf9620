//! Shared nutrition data structure
//!
//! Used for per-100g food values, ingredient contributions, and derived
//! recipe and meal plan totals.

use serde::{Deserialize, Serialize};

use super::numeric::lenient_f64;

/// Macronutrient values (per 100 g when stored on a food)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrition {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub energy: f64,       // kcal
    #[serde(default, deserialize_with = "lenient_f64")]
    pub fat: f64,          // grams
    #[serde(default, deserialize_with = "lenient_f64")]
    pub carbohydrate: f64, // grams
    #[serde(default, deserialize_with = "lenient_f64")]
    pub protein: f64,      // grams
    #[serde(default, deserialize_with = "lenient_f64")]
    pub fiber: f64,        // grams
    #[serde(default, deserialize_with = "lenient_f64")]
    pub sodium: f64,       // milligrams
}

impl Nutrition {
    /// Create a new Nutrition with all zeros
    pub fn zero() -> Self {
        Self::default()
    }

    /// Scale nutrition values by a multiplier
    pub fn scale(&self, multiplier: f64) -> Self {
        Self {
            energy: self.energy * multiplier,
            fat: self.fat * multiplier,
            carbohydrate: self.carbohydrate * multiplier,
            protein: self.protein * multiplier,
            fiber: self.fiber * multiplier,
            sodium: self.sodium * multiplier,
        }
    }

    /// Add another nutrition to this one
    pub fn add(&self, other: &Nutrition) -> Self {
        Self {
            energy: self.energy + other.energy,
            fat: self.fat + other.fat,
            carbohydrate: self.carbohydrate + other.carbohydrate,
            protein: self.protein + other.protein,
            fiber: self.fiber + other.fiber,
            sodium: self.sodium + other.sodium,
        }
    }

    /// Contribution of `grams` of a food whose values are per 100 g
    pub fn for_grams(&self, grams: f64) -> Self {
        self.scale(grams / 100.0)
    }

    /// First negative field name, if any
    pub fn first_negative(&self) -> Option<&'static str> {
        [
            ("energy", self.energy),
            ("fat", self.fat),
            ("carbohydrate", self.carbohydrate),
            ("protein", self.protein),
            ("fiber", self.fiber),
            ("sodium", self.sodium),
        ]
        .into_iter()
        .find(|(_, v)| *v < 0.0)
        .map(|(name, _)| name)
    }
}

impl std::ops::Add for Nutrition {
    type Output = Nutrition;

    fn add(self, other: Nutrition) -> Nutrition {
        Nutrition::add(&self, &other)
    }
}

impl std::ops::Mul<f64> for Nutrition {
    type Output = Nutrition;

    fn mul(self, multiplier: f64) -> Nutrition {
        self.scale(multiplier)
    }
}

impl std::iter::Sum for Nutrition {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Nutrition::zero(), |acc, n| acc + n)
    }
}
