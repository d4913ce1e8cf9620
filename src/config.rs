//! Runtime configuration
//!
//! Everything is read from environment variables.

use std::path::PathBuf;

/// Overrides the SQLite food library location
pub const DATABASE_PATH_VAR: &str = "NUTRICLIN_DATABASE_PATH";

/// Optional JSON food table imported at startup into an empty library
pub const SEED_FOODS_VAR: &str = "NUTRICLIN_SEED_FOODS";

/// Get the database path from environment or use default
pub fn database_path() -> PathBuf {
    std::env::var(DATABASE_PATH_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| default_database_path())
}

/// Get the seed food file, if configured
pub fn seed_foods_path() -> Option<PathBuf> {
    std::env::var(SEED_FOODS_VAR)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from)
}

fn default_database_path() -> PathBuf {
    let mut path = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));

    // Go up from target/release or target/debug to project root
    if path.ends_with("release") || path.ends_with("debug") {
        if let Some(parent) = path.parent() {
            if let Some(grandparent) = parent.parent() {
                path = grandparent.to_path_buf();
            }
        }
    }

    path.push("data");
    path.push("nutriclin.db");
    path
}
