//! Food model
//!
//! A food from the content library: per-100g nutrient values, optional
//! micronutrients, and the household measures it can be portioned in.

use std::collections::BTreeMap;

use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};
use super::numeric::{lenient_f64, lenient_map};
use super::Nutrition;

fn default_edible_part() -> f64 {
    100.0
}

/// A named everyday unit ("colher", "unidade") mapped to a gram weight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseholdMeasure {
    #[serde(default)]
    pub id: i64,
    pub singular: String,
    #[serde(default)]
    pub plural: Option<String>,
    /// How many units `total_grams` refers to
    #[serde(default, deserialize_with = "lenient_f64")]
    pub quantity: f64,
    #[serde(default, alias = "totalGrams", deserialize_with = "lenient_f64")]
    pub total_grams: f64,
    /// Edible part percentage (0-100)
    #[serde(default = "default_edible_part", alias = "ediblePart", deserialize_with = "lenient_f64")]
    pub edible_part: f64,
}

impl HouseholdMeasure {
    pub fn new(singular: &str, quantity: f64, total_grams: f64) -> Self {
        Self {
            id: 0,
            singular: singular.to_string(),
            plural: None,
            quantity,
            total_grams,
            edible_part: default_edible_part(),
        }
    }

    pub fn with_plural(mut self, plural: &str) -> Self {
        self.plural = Some(plural.to_string());
        self
    }

    /// Whether `unit` is exactly this measure's singular or plural name
    pub fn matches(&self, unit: &str) -> bool {
        !unit.is_empty() && (self.singular == unit || self.plural.as_deref() == Some(unit))
    }

    /// Grams per single unit; `None` when the measure quantity is not positive
    pub fn grams_per_unit(&self) -> Option<f64> {
        if self.quantity > 0.0 {
            Some(self.total_grams / self.quantity)
        } else {
            None
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.singular.trim().is_empty() {
            return Err("Household measure name cannot be empty".to_string());
        }
        if self.quantity < 0.0 {
            return Err(format!("Measure '{}': quantity cannot be negative", self.singular));
        }
        if self.total_grams < 0.0 {
            return Err(format!("Measure '{}': total_grams cannot be negative", self.singular));
        }
        if !(0.0..=100.0).contains(&self.edible_part) {
            return Err(format!(
                "Measure '{}': edible_part must be between 0 and 100",
                self.singular
            ));
        }
        Ok(())
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            singular: row.get("singular")?,
            plural: row.get("plural")?,
            quantity: row.get("quantity")?,
            total_grams: row.get("total_grams")?,
            edible_part: row.get("edible_part")?,
        })
    }

    /// Attach a measure to a food
    pub fn create(conn: &Connection, food_id: i64, data: &HouseholdMeasure) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO household_measures (food_id, singular, plural, quantity, total_grams, edible_part)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                food_id,
                data.singular.trim(),
                data.plural.as_deref().map(str::trim),
                data.quantity,
                data.total_grams,
                data.edible_part,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM household_measures WHERE id = ?1")?;

        match stmt.query_row([id], Self::from_row) {
            Ok(measure) => Ok(Some(measure)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn list_for_food(conn: &Connection, food_id: i64) -> DbResult<Vec<Self>> {
        let mut stmt =
            conn.prepare("SELECT * FROM household_measures WHERE food_id = ?1 ORDER BY id")?;

        let measures = stmt
            .query_map([food_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(measures)
    }

    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM household_measures WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

/// A food with per-100g nutrient values
#[derive(Debug, Clone, Serialize)]
pub struct Food {
    pub id: i64,
    pub name: String,
    pub group: Option<String>,
    pub source: Option<String>,
    pub per_100g: Nutrition,
    /// Vitamins, minerals and amino acids, per 100 g
    pub micronutrients: BTreeMap<String, f64>,
    pub measures: Vec<HouseholdMeasure>,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a new food; also the food import record format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodCreate {
    pub name: String,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(flatten)]
    pub nutrients: Nutrition,
    #[serde(default, deserialize_with = "lenient_map")]
    pub micronutrients: BTreeMap<String, f64>,
    #[serde(default)]
    pub measures: Vec<HouseholdMeasure>,
}

/// Data for updating a food
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FoodUpdate {
    pub name: Option<String>,
    pub group: Option<String>,
    pub source: Option<String>,
    pub energy: Option<f64>,
    pub fat: Option<f64>,
    pub carbohydrate: Option<f64>,
    pub protein: Option<f64>,
    pub fiber: Option<f64>,
    pub sodium: Option<f64>,
    /// Replaces the whole micronutrient map
    pub micronutrients: Option<BTreeMap<String, f64>>,
}

impl FoodCreate {
    /// Check the record before it reaches the library
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Food name cannot be empty".to_string());
        }
        if let Some(field) = self.nutrients.first_negative() {
            return Err(format!("{} cannot be negative", field));
        }
        if let Some((key, _)) = self.micronutrients.iter().find(|(_, v)| **v < 0.0) {
            return Err(format!("micronutrient '{}' cannot be negative", key));
        }
        for measure in &self.measures {
            measure.validate()?;
        }
        Ok(())
    }
}

impl FoodUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.group.is_none()
            && self.source.is_none()
            && self.energy.is_none()
            && self.fat.is_none()
            && self.carbohydrate.is_none()
            && self.protein.is_none()
            && self.fiber.is_none()
            && self.sodium.is_none()
            && self.micronutrients.is_none()
    }
}

impl Food {
    /// A food that lives only for one calculation (never stored)
    pub fn transient(data: FoodCreate) -> Self {
        let now = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();
        Self {
            id: 0,
            name: data.name,
            group: data.group,
            source: data.source,
            per_100g: data.nutrients,
            micronutrients: data.micronutrients,
            measures: data.measures,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let micronutrients_json: String = row.get("micronutrients")?;
        let micronutrients = serde_json::from_str(&micronutrients_json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e))
        })?;

        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            group: row.get("food_group")?,
            source: row.get("source")?,
            per_100g: Nutrition {
                energy: row.get("energy")?,
                fat: row.get("fat")?,
                carbohydrate: row.get("carbohydrate")?,
                protein: row.get("protein")?,
                fiber: row.get("fiber")?,
                sodium: row.get("sodium")?,
            },
            micronutrients,
            measures: Vec::new(),
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    fn load_measures(conn: &Connection, mut food: Self) -> DbResult<Self> {
        food.measures = HouseholdMeasure::list_for_food(conn, food.id)?;
        Ok(food)
    }

    /// Insert a new food and its measures
    pub fn create(conn: &Connection, data: &FoodCreate) -> DbResult<Self> {
        let micronutrients = serde_json::to_string(&data.micronutrients)?;
        conn.execute(
            r#"
            INSERT INTO foods (
                name, food_group, source,
                energy, fat, carbohydrate, protein, fiber, sodium,
                micronutrients
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                data.name.trim(),
                data.group,
                data.source,
                data.nutrients.energy,
                data.nutrients.fat,
                data.nutrients.carbohydrate,
                data.nutrients.protein,
                data.nutrients.fiber,
                data.nutrients.sodium,
                micronutrients,
            ],
        )?;

        let id = conn.last_insert_rowid();
        for measure in &data.measures {
            HouseholdMeasure::create(conn, id, measure)?;
        }

        Self::get_by_id(conn, id)?.ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    /// Get a food by ID, with its measures
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM foods WHERE id = ?1")?;

        match stmt.query_row([id], Self::from_row) {
            Ok(food) => Ok(Some(Self::load_measures(conn, food)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Exact name lookup (case-insensitive)
    pub fn get_by_name(conn: &Connection, name: &str) -> DbResult<Option<Self>> {
        let mut stmt =
            conn.prepare("SELECT * FROM foods WHERE name = ?1 COLLATE NOCASE ORDER BY id LIMIT 1")?;

        match stmt.query_row([name.trim()], Self::from_row) {
            Ok(food) => Ok(Some(Self::load_measures(conn, food)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Search foods by name or group
    pub fn search(conn: &Connection, query: &str, limit: i64) -> DbResult<Vec<Self>> {
        let search_pattern = format!("%{}%", query.trim());
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM foods
            WHERE name LIKE ?1 OR food_group LIKE ?1
            ORDER BY name ASC
            LIMIT ?2
            "#,
        )?;

        let foods = stmt
            .query_map(params![search_pattern, limit], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        foods.into_iter().map(|f| Self::load_measures(conn, f)).collect()
    }

    /// List foods with optional group filter, sorting and pagination
    pub fn list(
        conn: &Connection,
        group: Option<&str>,
        sort_by: &str,
        sort_order: &str,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<Self>> {
        let order = if sort_order.to_lowercase() == "desc" { "DESC" } else { "ASC" };
        let sort_col = match sort_by.to_lowercase().as_str() {
            "created_at" => "created_at",
            "energy" => "energy",
            _ => "name",
        };

        let sql = if group.is_some() {
            format!(
                "SELECT * FROM foods WHERE food_group = ?1 ORDER BY {} {}, id LIMIT ?2 OFFSET ?3",
                sort_col, order
            )
        } else {
            format!(
                "SELECT * FROM foods ORDER BY {} {}, id LIMIT ?1 OFFSET ?2",
                sort_col, order
            )
        };

        let mut stmt = conn.prepare(&sql)?;

        let foods = if let Some(g) = group {
            stmt.query_map(params![g, limit, offset], Self::from_row)?
                .collect::<Result<Vec<_>, _>>()?
        } else {
            stmt.query_map(params![limit, offset], Self::from_row)?
                .collect::<Result<Vec<_>, _>>()?
        };

        foods.into_iter().map(|f| Self::load_measures(conn, f)).collect()
    }

    /// Count foods (optionally within a group)
    pub fn count(conn: &Connection, group: Option<&str>) -> DbResult<i64> {
        let count: i64 = if let Some(g) = group {
            conn.query_row(
                "SELECT COUNT(*) FROM foods WHERE food_group = ?1",
                [g],
                |row| row.get(0),
            )?
        } else {
            conn.query_row("SELECT COUNT(*) FROM foods", [], |row| row.get(0))?
        };
        Ok(count)
    }

    /// Partial update; measures are managed separately
    pub fn update(conn: &Connection, id: i64, data: &FoodUpdate) -> DbResult<Option<Self>> {
        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        macro_rules! add_update {
            ($field:ident, $col:expr) => {
                if let Some(ref val) = data.$field {
                    updates.push(format!("{} = ?{}", $col, params_vec.len() + 1));
                    params_vec.push(Box::new(val.clone()));
                }
            };
        }

        add_update!(name, "name");
        add_update!(group, "food_group");
        add_update!(source, "source");
        add_update!(energy, "energy");
        add_update!(fat, "fat");
        add_update!(carbohydrate, "carbohydrate");
        add_update!(protein, "protein");
        add_update!(fiber, "fiber");
        add_update!(sodium, "sodium");

        if let Some(ref micros) = data.micronutrients {
            updates.push(format!("micronutrients = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(serde_json::to_string(micros)?));
        }

        if updates.is_empty() {
            return Self::get_by_id(conn, id);
        }

        updates.push("updated_at = datetime('now')".to_string());

        let sql = format!(
            "UPDATE foods SET {} WHERE id = ?{}",
            updates.join(", "),
            params_vec.len() + 1
        );

        params_vec.push(Box::new(id));

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Self::get_by_id(conn, id)
    }

    /// Delete a food; its measures cascade
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM foods WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }

    /// Distinct food groups in the library
    pub fn groups(conn: &Connection) -> DbResult<Vec<String>> {
        let mut stmt = conn.prepare(
            "SELECT DISTINCT food_group FROM foods WHERE food_group IS NOT NULL ORDER BY food_group",
        )?;

        let groups = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn rice() -> FoodCreate {
        FoodCreate {
            name: "Arroz branco cozido".to_string(),
            group: Some("Cereais".to_string()),
            source: Some("TACO".to_string()),
            nutrients: Nutrition {
                energy: 124.0,
                fat: 0.3,
                carbohydrate: 28.1,
                protein: 2.5,
                fiber: 1.6,
                sodium: 1.0,
            },
            micronutrients: BTreeMap::from([("iron".to_string(), 0.1)]),
            measures: vec![HouseholdMeasure::new("colher de sopa", 1.0, 25.0)
                .with_plural("colheres de sopa")],
        }
    }

    #[test]
    fn test_measure_matches_singular_and_plural() {
        let m = HouseholdMeasure::new("spoon", 1.0, 15.0).with_plural("spoons");
        assert!(m.matches("spoon"));
        assert!(m.matches("spoons"));
        assert!(!m.matches("Spoon"));
        assert!(!m.matches(" spoons "));
        assert!(!m.matches("cup"));
        assert!(!m.matches(""));
    }

    #[test]
    fn test_measure_grams_per_unit() {
        assert_eq!(HouseholdMeasure::new("slice", 2.0, 50.0).grams_per_unit(), Some(25.0));
        assert_eq!(HouseholdMeasure::new("slice", 0.0, 50.0).grams_per_unit(), None);
    }

    #[test]
    fn test_measure_deserializes_original_field_names() {
        let m: HouseholdMeasure =
            serde_json::from_str(r#"{"singular": "spoon", "quantity": "1", "totalGrams": "15"}"#)
                .unwrap();
        assert_eq!(m.quantity, 1.0);
        assert_eq!(m.total_grams, 15.0);
        assert_eq!(m.edible_part, 100.0);
    }

    #[test]
    fn test_validate_rejects_bad_records() {
        let mut data = rice();
        data.name = "  ".to_string();
        assert!(data.validate().is_err());

        let mut data = rice();
        data.nutrients.fat = -0.1;
        assert_eq!(data.validate().unwrap_err(), "fat cannot be negative");

        let mut data = rice();
        data.measures[0].edible_part = 120.0;
        assert!(data.validate().is_err());

        assert!(rice().validate().is_ok());
    }

    #[test]
    fn test_create_and_get_with_measures() {
        let conn = setup();
        let food = Food::create(&conn, &rice()).unwrap();
        assert!(food.id > 0);
        assert_eq!(food.measures.len(), 1);
        assert_eq!(food.measures[0].plural.as_deref(), Some("colheres de sopa"));
        assert_eq!(food.micronutrients.get("iron"), Some(&0.1));

        let fetched = Food::get_by_id(&conn, food.id).unwrap().unwrap();
        assert_eq!(fetched.per_100g, food.per_100g);
        assert_eq!(fetched.group.as_deref(), Some("Cereais"));
    }

    #[test]
    fn test_search_list_and_count() {
        let conn = setup();
        Food::create(&conn, &rice()).unwrap();
        let mut egg = rice();
        egg.name = "Ovo cozido".to_string();
        egg.group = Some("Ovos".to_string());
        egg.nutrients.energy = 155.0;
        Food::create(&conn, &egg).unwrap();

        assert_eq!(Food::search(&conn, "arroz", 10).unwrap().len(), 1);
        assert_eq!(Food::search(&conn, "Ovos", 10).unwrap().len(), 1);
        assert_eq!(Food::count(&conn, None).unwrap(), 2);
        assert_eq!(Food::count(&conn, Some("Ovos")).unwrap(), 1);

        let by_energy = Food::list(&conn, None, "energy", "desc", 10, 0).unwrap();
        assert_eq!(by_energy[0].name, "Ovo cozido");
        assert_eq!(Food::groups(&conn).unwrap(), vec!["Cereais", "Ovos"]);
    }

    #[test]
    fn test_update_and_delete_cascade() {
        let conn = setup();
        let food = Food::create(&conn, &rice()).unwrap();

        let update = FoodUpdate {
            energy: Some(130.0),
            micronutrients: Some(BTreeMap::from([("zinc".to_string(), 0.5)])),
            ..Default::default()
        };
        let updated = Food::update(&conn, food.id, &update).unwrap().unwrap();
        assert_eq!(updated.per_100g.energy, 130.0);
        assert_eq!(updated.per_100g.protein, 2.5);
        assert!(updated.micronutrients.get("iron").is_none());

        let measure_id = updated.measures[0].id;
        assert!(Food::delete(&conn, food.id).unwrap());
        assert!(HouseholdMeasure::get_by_id(&conn, measure_id).unwrap().is_none());
        assert!(!Food::delete(&conn, food.id).unwrap());
    }

    #[test]
    fn test_get_by_name_is_case_insensitive() {
        let conn = setup();
        Food::create(&conn, &rice()).unwrap();
        assert!(Food::get_by_name(&conn, "arroz BRANCO cozido").unwrap().is_some());
        assert!(Food::get_by_name(&conn, "feijão").unwrap().is_none());
    }
}
