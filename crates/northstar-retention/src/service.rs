use chrono::NaiveDate;
use northstar_core::week;
use northstar_entities::events;
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RetentionError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Retention matrix, one row per cohort week with any qualifying users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionReport {
    pub cohort_event: String,
    pub max_offset: u32,
    pub cohorts: Vec<CohortRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CohortRow {
    /// Monday of the cohort week
    pub week_start: NaiveDate,
    pub cohort_size: u64,
    /// Index `o` holds the percentage of the cohort with at least one event
    /// in cohort week + `o`; index 0 is 100 by construction
    pub retention: Vec<f64>,
}

pub struct RetentionService {
    db: Arc<DatabaseConnection>,
}

impl RetentionService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Compute weekly retention for users whose earliest `cohort_event`
    /// event falls in each week. Users without that event are excluded.
    pub async fn analyze(
        &self,
        cohort_event: &str,
        max_offset: u32,
    ) -> Result<RetentionReport, RetentionError> {
        if cohort_event.trim().is_empty() {
            return Err(RetentionError::InvalidInput(
                "cohort event must not be empty".to_string(),
            ));
        }

        let rows = events::Entity::find()
            .order_by_asc(events::Column::UserId)
            .order_by_asc(events::Column::EventTimestamp)
            .order_by_asc(events::Column::Id)
            .all(self.db.as_ref())
            .await?;

        // Per user: cohort week (week of earliest qualifying event) and the
        // set of weeks with any activity at all
        let mut cohort_week: HashMap<i64, i64> = HashMap::new();
        let mut active_weeks: HashMap<i64, BTreeSet<i64>> = HashMap::new();
        for row in &rows {
            let week_index = week::index_of(row.event_timestamp);
            active_weeks.entry(row.user_id).or_default().insert(week_index);
            if row.event_name == cohort_event {
                // Rows arrive time-ordered per user, so the first hit wins
                cohort_week.entry(row.user_id).or_insert(week_index);
            }
        }

        let mut cohorts: BTreeMap<i64, Vec<i64>> = BTreeMap::new();
        for (user_id, week_index) in &cohort_week {
            cohorts.entry(*week_index).or_default().push(*user_id);
        }

        tracing::debug!(
            cohort_event,
            cohorts = cohorts.len(),
            users = cohort_week.len(),
            "retention scan"
        );

        let mut report_rows = Vec::with_capacity(cohorts.len());
        for (week_index, users) in cohorts {
            let cohort_size = users.len() as u64;
            let mut retention = Vec::with_capacity(max_offset as usize + 1);
            for offset in 0..=i64::from(max_offset) {
                let target_week = week_index + offset;
                let active = users
                    .iter()
                    .filter(|user_id| {
                        active_weeks
                            .get(user_id)
                            .is_some_and(|weeks| weeks.contains(&target_week))
                    })
                    .count() as u64;
                // cohort_size >= 1 by construction: the cohort exists only
                // because these users have a qualifying event
                retention.push(active as f64 / cohort_size as f64 * 100.0);
            }
            report_rows.push(CohortRow {
                week_start: week::week_start(week_index),
                cohort_size,
                retention,
            });
        }

        Ok(RetentionReport {
            cohort_event: cohort_event.to_string(),
            max_offset,
            cohorts: report_rows,
        })
    }
}
