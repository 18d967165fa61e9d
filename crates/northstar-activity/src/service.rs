use chrono::Duration;
use northstar_core::UtcDateTime;
use sea_orm::{DatabaseBackend, DatabaseConnection, FromQueryResult, Statement};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ActivityError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

/// Active-user counts for the three fixed lookback windows ending at `at`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActiveUsersSummary {
    pub at: UtcDateTime,
    pub dau: u64,
    pub wau: u64,
    pub mau: u64,
    /// DAU / MAU as a percentage; `None` when MAU is zero
    pub stickiness: Option<f64>,
}

pub struct ActivityService {
    db: Arc<DatabaseConnection>,
}

impl ActivityService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Count distinct users active in the 1/7/30-day windows
    /// `at - window <= event_timestamp < at`.
    pub async fn active_users(&self, at: UtcDateTime) -> Result<ActiveUsersSummary, ActivityError> {
        let dau = self.distinct_users_between(at - Duration::days(1), at).await?;
        let wau = self.distinct_users_between(at - Duration::days(7), at).await?;
        let mau = self.distinct_users_between(at - Duration::days(30), at).await?;

        let stickiness = northstar_core::stats::rate(dau, mau);

        tracing::debug!(%at, dau, wau, mau, "active user counts");

        Ok(ActiveUsersSummary {
            at,
            dau,
            wau,
            mau,
            stickiness,
        })
    }

    /// Half-open window: events at exactly `at` belong to the next window.
    async fn distinct_users_between(
        &self,
        start: UtcDateTime,
        end: UtcDateTime,
    ) -> Result<u64, ActivityError> {
        #[derive(FromQueryResult)]
        struct CountResult {
            count: i64,
        }

        let sql = r#"
            SELECT COUNT(DISTINCT user_id) as count
            FROM events
            WHERE event_timestamp >= ? AND event_timestamp < ?
        "#;

        let result = CountResult::find_by_statement(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            sql,
            vec![start.into(), end.into()],
        ))
        .one(self.db.as_ref())
        .await?;

        Ok(result.map(|r| r.count as u64).unwrap_or(0))
    }
}
