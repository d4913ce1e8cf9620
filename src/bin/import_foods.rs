//! Utility to import a JSON food table into the food library
//!
//! Usage: import_foods <file.json>

use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let Some(file) = std::env::args().nth(1).map(PathBuf::from) else {
        eprintln!("Usage: import_foods <file.json>");
        std::process::exit(2);
    };

    let db_path = nutriclin::config::database_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    println!("Database path: {}", db_path.display());

    let database = nutriclin::db::Database::new(&db_path)?;

    // Run migrations
    database.with_conn(|conn| {
        nutriclin::db::migrations::run_migrations(conn)?;
        Ok(())
    })?;

    let result = nutriclin::tools::foods::import_foods(&database, &file)?;
    println!("Import from {}:", file.display());
    println!("  Total: {}", result.total);
    println!("  Imported: {}", result.imported);
    println!("  Skipped duplicates: {}", result.skipped_duplicates);
    for err in &result.errors {
        println!("  Error at #{} ({}): {}", err.index, err.name, err.error);
    }

    Ok(())
}
