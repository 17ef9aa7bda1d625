//! Database configuration module for the land registry.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the unique constraint on field keys and the cascading certificate foreign key live
//! in the database itself rather than only in application checks.

use crate::entities::{Certificate, FieldDefinition, Land};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};
use tracing::{debug, info};

const DEFAULT_DATABASE_URL: &str = "sqlite://land_registry.sqlite?mode=rwc";

/// Gets the database URL from the `DATABASE_URL` environment variable or returns the
/// default local `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by `DATABASE_URL`.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    debug!("Connecting to database at {}", database_url);
    Database::connect(&database_url).await.map_err(Into::into)
}

/// Creates all tables from the entity definitions, skipping tables that already exist.
///
/// Land records are created before certificates because certificates reference them.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut field_table = schema.create_table_from_entity(FieldDefinition);
    let mut land_table = schema.create_table_from_entity(Land);
    let mut certificate_table = schema.create_table_from_entity(Certificate);

    field_table.if_not_exists();
    land_table.if_not_exists();
    certificate_table.if_not_exists();

    db.execute(builder.build(&field_table)).await?;
    db.execute(builder.build(&land_table)).await?;
    db.execute(builder.build(&certificate_table)).await?;

    info!("Database tables ensured");
    Ok(())
}
