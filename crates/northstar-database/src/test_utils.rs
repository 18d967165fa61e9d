//! Test utilities for database integration tests
//!
//! Provides a migrated in-memory SQLite database for service tests across
//! all Northstar crates. Every [`TestDatabase`] is fully isolated: each test
//! gets its own `sqlite::memory:` connection and schema.

use crate::{establish_connection, DbConnection, MEMORY_DATABASE_URL};
use northstar_entities::events;
use sea_orm::{ActiveModelTrait, ActiveValue::Set};
use std::sync::Arc;

/// Test database backed by in-memory SQLite
pub struct TestDatabase {
    pub db: Arc<DbConnection>,
}

impl TestDatabase {
    /// Create a fresh database with all migrations applied
    pub async fn with_migrations() -> anyhow::Result<Self> {
        let db = establish_connection(MEMORY_DATABASE_URL).await?;
        Ok(Self { db })
    }

    /// Insert a single event; `platform` of `None` is stored as NULL.
    pub async fn insert_event(
        &self,
        user_id: i64,
        event_name: &str,
        event_timestamp: northstar_core::UtcDateTime,
        platform: Option<&str>,
    ) -> anyhow::Result<()> {
        events::ActiveModel {
            user_id: Set(user_id),
            event_name: Set(event_name.to_string()),
            event_timestamp: Set(event_timestamp),
            platform: Set(platform.map(|p| p.to_string())),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await?;
        Ok(())
    }
}
