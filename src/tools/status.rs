//! NutriClin Status Tool
//!
//! Runtime status of the service, plus usage instructions for clients.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;
use crate::db::Database;
use crate::models::Food;

/// How to use the calculation tools
pub const CALCULATION_INSTRUCTIONS: &str = r#"
# NutriClin Calculation Instructions

## Food values

Every food stores nutrients **per 100 g** (liquids per 100 ml, taken as
100 g). Foods may carry household measures: a named unit with the gram
weight of a given quantity, e.g. `{"singular": "colher de sopa",
"quantity": 1, "total_grams": 25}`.

## Units on ingredient lines

| Unit | Grams |
|------|-------|
| g, ml | quantity |
| Kg, L | quantity × 1000 |
| mg | quantity ÷ 1000 |
| household measure name (singular or plural) | quantity × total_grams ÷ measure quantity |
| anything else | quantity (reported in `unresolved_units`) |

Units are matched by exact spelling: `Kg` is a fixed unit, `kg` is not.

If a line shows up in `unresolved_units`, add the missing household measure
with `add_household_measure` and recalculate.

## Tools

1. `search_foods` / `list_foods` to find food ids
2. `calculate_recipe_nutrition` with lines `{food_id, quantity, unit}`
   (or an inline `food` for something not in the library) and `servings`
3. `calculate_meal_plan_nutrition` with meals, each holding lines, and an
   optional `energy_target` in kcal
4. `scale_food_portion` to see one food at a portion size
5. `resolve_grams` to check a unit before using it

Totals are computed on every call and never stored.
"#;

/// Service status
#[derive(Debug, Serialize)]
pub struct NutriclinStatus {
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub version: &'static str,
    pub database_path: String,
    pub database_size_bytes: Option<u64>,
    pub food_count: Option<i64>,
    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

/// Status tracker for the NutriClin service
pub struct StatusTracker {
    start_time: Instant,
    database_path: PathBuf,
}

impl StatusTracker {
    pub fn new(database_path: PathBuf) -> Self {
        Self {
            start_time: Instant::now(),
            database_path,
        }
    }

    /// Get the current status
    pub fn get_status(&self, db: &Database) -> NutriclinStatus {
        let build_info = BuildInfo::current();

        let database_size_bytes = std::fs::metadata(&self.database_path)
            .ok()
            .map(|m| m.len());

        let food_count = db.with_conn(|conn| Food::count(conn, None)).ok();

        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        NutriclinStatus {
            build_number: build_info.build_number,
            build_timestamp: build_info.build_timestamp,
            version: build_info.version,
            database_path: self.database_path.display().to_string(),
            database_size_bytes,
            food_count,
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;

    #[test]
    fn test_status_reports_food_count() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(run_migrations).unwrap();

        let tracker = StatusTracker::new(PathBuf::from("/nonexistent/nutriclin.db"));
        let status = tracker.get_status(&db);
        assert_eq!(status.food_count, Some(0));
        assert_eq!(status.database_size_bytes, None);
        assert_eq!(status.process_id, std::process::id());
    }
}
