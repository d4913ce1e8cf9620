//! Database migrations
//!
//! Schema creation and migration logic.

use rusqlite::Connection;

use super::connection::DbResult;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// Run all migrations to bring the database up to the current schema version
pub fn run_migrations(conn: &Connection) -> DbResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (1)", [])?;
    }

    Ok(())
}

/// Highest applied migration, 0 for a fresh database
pub fn get_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

/// Migration v1: food library
fn migrate_v1(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        -- ============================================
        -- FOODS
        -- Composition values, all per 100 g
        -- ============================================
        CREATE TABLE foods (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            food_group TEXT,                     -- e.g., "Cereais"
            source TEXT,                         -- composition table, e.g., "TACO"

            energy REAL NOT NULL DEFAULT 0,      -- kcal
            fat REAL NOT NULL DEFAULT 0,         -- grams
            carbohydrate REAL NOT NULL DEFAULT 0, -- grams
            protein REAL NOT NULL DEFAULT 0,     -- grams
            fiber REAL NOT NULL DEFAULT 0,       -- grams
            sodium REAL NOT NULL DEFAULT 0,      -- milligrams

            -- JSON object of name -> amount (vitamins, minerals, amino acids)
            micronutrients TEXT NOT NULL DEFAULT '{}',

            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_foods_name ON foods(name);
        CREATE INDEX idx_foods_group ON foods(food_group);

        -- ============================================
        -- HOUSEHOLD MEASURES
        -- Everyday units a food can be portioned in
        -- ============================================
        CREATE TABLE household_measures (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            food_id INTEGER NOT NULL REFERENCES foods(id) ON DELETE CASCADE,
            singular TEXT NOT NULL,              -- e.g., "colher de sopa"
            plural TEXT,                         -- e.g., "colheres de sopa"
            quantity REAL NOT NULL DEFAULT 1,    -- units that total_grams covers
            total_grams REAL NOT NULL DEFAULT 0,
            edible_part REAL NOT NULL DEFAULT 100, -- percentage
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_household_measures_food ON household_measures(food_id);
        "#,
    )?;

    Ok(())
}
