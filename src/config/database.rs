//! Database configuration module for the settlement core.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust structs. Unique columns declared on the entities
//! (`receipt_number`, `receipt_sales.sale_id`, `system_settings.key`) become unique
//! constraints here, and the receipt flow relies on them.

use crate::entities::{PaymentReceipt, ReceiptCounter, ReceiptSale, SaleRecord, SystemSetting};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use tracing::{debug, info, instrument};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/agronond.sqlite?mode=rwc";

/// Gets the database URL from environment variable or returns default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the `SQLite` database using the `DATABASE_URL` environment variable.
///
/// Falls back to a default local `SQLite` file under `data/` if no environment
/// variable is set, creating the directory when needed.
#[instrument]
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    if database_url == DEFAULT_DATABASE_URL {
        std::fs::create_dir_all("data")?;
    }
    debug!("Connecting to database at: {}", database_url);
    Database::connect(&database_url).await.map_err(Into::into)
}

async fn create_table_for<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// Creates all necessary database tables using `SeaORM`'s schema generation from entity definitions.
///
/// Safe to call on every start; existing tables are left alone.
#[instrument(skip(db))]
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let schema = Schema::new(db.get_database_backend());

    create_table_for(db, &schema, SaleRecord).await?;
    create_table_for(db, &schema, PaymentReceipt).await?;
    create_table_for(db, &schema, ReceiptSale).await?;
    create_table_for(db, &schema, ReceiptCounter).await?;
    create_table_for(db, &schema, SystemSetting).await?;

    info!("Database tables ensured.");
    Ok(())
}
