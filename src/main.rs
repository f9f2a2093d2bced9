use dotenvy::dotenv;
use std::path::Path;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use travelpin::{
    config::{
        catalog::{catalog_path, load_catalog},
        database::{create_connection, create_tables, get_database_url},
    },
    core::seed::seed_catalog,
    errors::Result,
};

/// Creates the directory holding a file-backed `SQLite` database.
fn ensure_database_dir(url: &str) -> Result<()> {
    let Some(rest) = url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let file = rest.split('?').next().unwrap_or(rest);
    if let Some(parent) = Path::new(file).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; variables may also be set externally
    dotenv().ok();

    // 3. Connect and create the schema
    ensure_database_dir(&get_database_url())?;
    let db = create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 4. Seed the catalog if a catalog file is present
    let path = catalog_path();
    if Path::new(&path).exists() {
        let catalog = load_catalog(&path)?;
        let summary = seed_catalog(&db, &catalog)
            .await
            .inspect_err(|e| error!("Failed to seed catalog: {}", e))?;
        info!(
            "Seeded {} destinations, {} agencies and {} packages from {}",
            summary.destinations, summary.agencies, summary.packages, path
        );
    } else {
        warn!("No catalog file at {}; skipping seed.", path);
    }

    Ok(())
}
