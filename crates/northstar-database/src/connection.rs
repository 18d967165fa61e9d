//! Database connection management

use northstar_core::{ServiceError, ServiceResult};
use northstar_migrations::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::sync::Arc;

pub type DbConnection = DatabaseConnection;

/// URL of the default throwaway backend. Each connection to `sqlite::memory:`
/// sees its own database, so the pool for this URL must stay at one
/// connection.
pub const MEMORY_DATABASE_URL: &str = "sqlite::memory:";

pub async fn establish_connection(database_url: &str) -> ServiceResult<Arc<DbConnection>> {
    let mut opt = ConnectOptions::new(database_url);
    // Single connection: the analysis is a sequential pass, and in-memory
    // SQLite would give every pooled connection a separate empty database.
    opt.max_connections(1).sqlx_logging(false);

    let db = Database::connect(opt)
        .await
        .map_err(|e| ServiceError::Database(e.to_string()))?;

    // Run migrations
    Migrator::up(&db, None)
        .await
        .map_err(|e| ServiceError::Database(e.to_string()))?;

    tracing::debug!(database_url, "database connection established");

    Ok(Arc::new(db))
}
