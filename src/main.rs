//! NutriClin
//!
//! An MCP server for clinical nutrition calculations.

use rmcp::ServiceExt;
use tokio::io::{stdin, stdout};
use tracing_subscriber::EnvFilter;

use nutriclin::mcp::NutriclinService;
use nutriclin::{build_info, config, db, tools};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (output to stderr to not interfere with MCP stdio)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("nutriclin=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    // Print startup banner to stderr
    build_info::print_startup_banner();
    eprintln!("Starting MCP server on stdio...");

    let db_path = config::database_path();
    eprintln!("Database path: {}", db_path.display());

    // Ensure data directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    eprintln!("Initializing database...");
    let database = db::Database::new(&db_path)?;

    database.with_conn(|conn| {
        db::migrations::run_migrations(conn)?;
        let version = db::migrations::get_schema_version(conn)?;
        eprintln!("Database schema version: {}", version);
        Ok(())
    })?;

    // Seed an empty library from the configured food table
    if let Some(seed_path) = config::seed_foods_path() {
        match tools::foods::seed_if_empty(&database, &seed_path) {
            Ok(Some(result)) => eprintln!(
                "Seeded {} foods from {} ({} errors)",
                result.imported,
                seed_path.display(),
                result.errors.len()
            ),
            Ok(None) => {}
            Err(e) => tracing::warn!("Seeding from {} failed: {}", seed_path.display(), e),
        }
    }

    let service = NutriclinService::new(db_path, database);

    let transport = (stdin(), stdout());
    let server = service.serve(transport).await?;
    server.waiting().await?;

    Ok(())
}
