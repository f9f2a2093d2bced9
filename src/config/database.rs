//! Database configuration module for `TravelPin`.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema (including the `ON DELETE` policies declared on each relation) always
//! matches the Rust structs without hand-written SQL.

use crate::entities::{
    Agency, Destination, Expense, ExpenseShare, Favorite, KvEntry, Package, PackageDestination,
    Participant, Payment, Reservation, Trip, TripDestination, User,
};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use tracing::{debug, info, instrument};

/// Fallback used when `DATABASE_URL` is not set.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/travelpin.sqlite?mode=rwc";

/// Gets the database URL from environment variable or returns default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by `DATABASE_URL`.
///
/// Falls back to [`DEFAULT_DATABASE_URL`] if no environment variable is set.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    debug!("Connecting to database at {}", database_url);
    Database::connect(&database_url).await.map_err(Into::into)
}

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// Creates all tables that do not exist yet.
///
/// Parents are created before children so the foreign keys read naturally in the
/// generated schema; running this twice is a no-op.
#[instrument(skip(db))]
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, User).await?;
    create_table(db, &schema, Destination).await?;
    create_table(db, &schema, Favorite).await?;
    create_table(db, &schema, Agency).await?;
    create_table(db, &schema, Package).await?;
    create_table(db, &schema, PackageDestination).await?;
    create_table(db, &schema, Trip).await?;
    create_table(db, &schema, TripDestination).await?;
    create_table(db, &schema, Participant).await?;
    create_table(db, &schema, Expense).await?;
    create_table(db, &schema, ExpenseShare).await?;
    create_table(db, &schema, Payment).await?;
    create_table(db, &schema, Reservation).await?;
    create_table(db, &schema, KvEntry).await?;

    info!("Database tables ensured.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{TripModel, UserModel};
    use sea_orm::QuerySelect;

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _: Vec<UserModel> = User::find().limit(1).all(&db).await?;
        let _: Vec<TripModel> = Trip::find().limit(1).all(&db).await?;
        let _ = Reservation::find().limit(1).all(&db).await?;
        let _ = KvEntry::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        Ok(())
    }
}
