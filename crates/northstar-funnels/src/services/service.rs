use crate::types::{FunnelError, FunnelFilter, FunnelReport, SegmentFunnel, StageMetrics};
use northstar_core::stats;
use northstar_entities::events;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

pub struct FunnelService {
    db: Arc<DatabaseConnection>,
}

/// Per-segment running aggregates, one slot per milestone / boundary
#[derive(Default)]
struct SegmentAcc {
    reached: Vec<u64>,
    transition_users: Vec<u64>,
    transition_seconds: Vec<Vec<f64>>,
}

impl SegmentAcc {
    fn with_stages(stage_count: usize) -> Self {
        Self {
            reached: vec![0; stage_count],
            transition_users: vec![0; stage_count.saturating_sub(1)],
            transition_seconds: vec![Vec::new(); stage_count.saturating_sub(1)],
        }
    }
}

/// Everything the funnel needs to know about one user's event sequence
struct UserFacts {
    segment: Option<String>,
    reached: Vec<bool>,
    /// Per boundary: elapsed seconds of the first observed strict
    /// (immediately-adjacent) transition
    transition_seconds: Vec<Option<f64>>,
    has_conflicting_platform: bool,
}

impl FunnelService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Run the funnel over the full event log.
    ///
    /// `milestones` is the ordered milestone list; segments are derived from
    /// the platform of each user's earliest first-milestone event.
    pub async fn analyze(
        &self,
        milestones: &[String],
        filter: FunnelFilter,
    ) -> Result<FunnelReport, FunnelError> {
        if milestones.is_empty() {
            return Err(FunnelError::InvalidInput(
                "milestone list must not be empty".to_string(),
            ));
        }

        // Ordered per-user scan; id breaks timestamp ties by insertion order
        let mut query = events::Entity::find();
        if let Some(start) = filter.start_date {
            query = query.filter(events::Column::EventTimestamp.gte(start));
        }
        if let Some(end) = filter.end_date {
            query = query.filter(events::Column::EventTimestamp.lte(end));
        }
        let rows = query
            .order_by_asc(events::Column::UserId)
            .order_by_asc(events::Column::EventTimestamp)
            .order_by_asc(events::Column::Id)
            .all(self.db.as_ref())
            .await?;

        tracing::debug!(events = rows.len(), stages = milestones.len(), "funnel scan");

        let mut observed_platforms: BTreeSet<String> = BTreeSet::new();
        for row in &rows {
            if let Some(platform) = &row.platform {
                observed_platforms.insert(platform.clone());
            }
        }

        let mut segments: HashMap<Option<String>, SegmentAcc> = HashMap::new();
        let mut conflicting_users = 0u64;

        for user_events in group_by_user(&rows) {
            let facts = analyze_user(user_events, milestones);
            if facts.has_conflicting_platform {
                conflicting_users += 1;
                tracing::warn!(
                    user_id = user_events[0].user_id,
                    "user observed under multiple platform values"
                );
            }

            let acc = segments
                .entry(facts.segment.clone())
                .or_insert_with(|| SegmentAcc::with_stages(milestones.len()));
            for (i, reached) in facts.reached.iter().enumerate() {
                if *reached {
                    acc.reached[i] += 1;
                }
            }
            for (i, seconds) in facts.transition_seconds.iter().enumerate() {
                if let Some(seconds) = seconds {
                    acc.transition_users[i] += 1;
                    acc.transition_seconds[i].push(*seconds);
                }
            }
        }

        // Every observed platform gets a row, zero milestone activity
        // included; the null segment only appears when users map to it.
        let mut segment_reports = Vec::new();
        for platform in &observed_platforms {
            let key = Some(platform.clone());
            let acc = segments
                .remove(&key)
                .unwrap_or_else(|| SegmentAcc::with_stages(milestones.len()));
            segment_reports.push(build_segment(key, milestones, acc));
        }
        if let Some(acc) = segments.remove(&None) {
            segment_reports.push(build_segment(None, milestones, acc));
        }

        Ok(FunnelReport {
            milestones: milestones.to_vec(),
            segments: segment_reports,
            users_with_conflicting_platform: conflicting_users,
        })
    }
}

/// Split a `(user_id, timestamp, id)`-ordered slice into per-user runs
fn group_by_user(rows: &[events::Model]) -> impl Iterator<Item = &[events::Model]> {
    rows.chunk_by(|a, b| a.user_id == b.user_id)
}

fn analyze_user(user_events: &[events::Model], milestones: &[String]) -> UserFacts {
    let stage_count = milestones.len();
    let mut reached = vec![false; stage_count];
    let mut transition_seconds: Vec<Option<f64>> = vec![None; stage_count.saturating_sub(1)];

    // Ever-reached counts ignore sequence position entirely
    for event in user_events {
        for (i, milestone) in milestones.iter().enumerate() {
            if event.event_name == *milestone {
                reached[i] = true;
            }
        }
    }

    // One-step look-ahead: each event paired with its immediate follower.
    // The last event of the sequence has no follower and feeds no boundary.
    for pair in user_events.windows(2) {
        let (current, next) = (&pair[0], &pair[1]);
        for i in 0..stage_count.saturating_sub(1) {
            if transition_seconds[i].is_none()
                && current.event_name == milestones[i]
                && next.event_name == milestones[i + 1]
            {
                let elapsed = next
                    .event_timestamp
                    .signed_duration_since(current.event_timestamp)
                    .num_milliseconds() as f64
                    / 1000.0;
                transition_seconds[i] = Some(elapsed);
            }
        }
    }

    // Segment: platform of the earliest first-milestone event, or null
    let segment = user_events
        .iter()
        .find(|e| e.event_name == milestones[0])
        .and_then(|e| e.platform.clone());

    let distinct_platforms: BTreeSet<&String> = user_events
        .iter()
        .filter_map(|e| e.platform.as_ref())
        .collect();

    UserFacts {
        segment,
        reached,
        transition_seconds,
        has_conflicting_platform: distinct_platforms.len() > 1,
    }
}

fn build_segment(
    platform: Option<String>,
    milestones: &[String],
    acc: SegmentAcc,
) -> SegmentFunnel {
    let mut stages = Vec::with_capacity(milestones.len());
    for (i, milestone) in milestones.iter().enumerate() {
        let is_last = i + 1 == milestones.len();
        let conversion_rate_to_next = if is_last {
            None
        } else {
            stats::rate(acc.reached[i + 1], acc.reached[i])
        };
        let (strict, avg, median) = if is_last {
            (0, None, None)
        } else {
            (
                acc.transition_users[i],
                stats::mean(&acc.transition_seconds[i]),
                stats::median(&acc.transition_seconds[i]),
            )
        };
        stages.push(StageMetrics {
            milestone: milestone.clone(),
            users_reached: acc.reached[i],
            conversion_rate_to_next,
            strict_transitions_to_next: strict,
            avg_seconds_to_next: avg,
            median_seconds_to_next: median,
        });
    }

    let overall_conversion_rate = stats::rate(
        *acc.reached.last().unwrap_or(&0),
        *acc.reached.first().unwrap_or(&0),
    );

    SegmentFunnel {
        platform,
        stages,
        overall_conversion_rate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use northstar_core::UtcDateTime;
    use northstar_database::test_utils::TestDatabase;

    fn milestones() -> Vec<String> {
        ["app_install", "view_item", "add_to_cart", "purchase"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn base_time() -> UtcDateTime {
        Utc.with_ymd_and_hms(2023, 1, 2, 9, 0, 0).unwrap()
    }

    /// Seed the illustrative dataset: 10 android and 10 ios installs;
    /// android 4 views / 2 carts / 1 purchase, ios 3 views / 2 carts /
    /// 2 purchases. Each user's milestones are a strict prefix spaced one
    /// minute apart.
    async fn seed_sample(db: &TestDatabase) -> anyhow::Result<()> {
        let t0 = base_time();
        let seed_user = |user_id: i64, platform: &'static str, depth: usize| {
            let names = ["app_install", "view_item", "add_to_cart", "purchase"];
            (0..depth)
                .map(move |i| (user_id, names[i], t0 + Duration::minutes(i as i64), platform))
                .collect::<Vec<_>>()
        };

        let mut rows = Vec::new();
        for user in 1..=10_i64 {
            let depth = match user {
                1 => 4,
                2 => 3,
                3 | 4 => 2,
                _ => 1,
            };
            rows.extend(seed_user(user, "android", depth));
        }
        for user in 11..=20_i64 {
            let depth = match user {
                11 | 12 => 4,
                13 => 2,
                _ => 1,
            };
            rows.extend(seed_user(user, "ios", depth));
        }

        for (user_id, name, ts, platform) in rows {
            db.insert_event(user_id, name, ts, Some(platform)).await?;
        }
        Ok(())
    }

    fn segment<'a>(report: &'a FunnelReport, platform: &str) -> &'a SegmentFunnel {
        report
            .segments
            .iter()
            .find(|s| s.platform.as_deref() == Some(platform))
            .expect("segment present")
    }

    fn assert_rate(actual: Option<f64>, expected: f64) {
        let actual = actual.expect("rate present");
        assert!(
            (actual - expected).abs() < 0.01,
            "expected {expected}, got {actual}"
        );
    }

    #[tokio::test]
    async fn sample_dataset_reproduces_reference_rates() -> anyhow::Result<()> {
        let test_db = TestDatabase::with_migrations().await?;
        seed_sample(&test_db).await?;
        let service = FunnelService::new(test_db.db.clone());

        let report = service
            .analyze(&milestones(), FunnelFilter::default())
            .await?;

        let android = segment(&report, "android");
        assert_eq!(android.stages[0].users_reached, 10);
        assert_rate(android.stages[0].conversion_rate_to_next, 40.00);
        assert_rate(android.stages[1].conversion_rate_to_next, 50.00);
        assert_rate(android.stages[2].conversion_rate_to_next, 50.00);
        assert_eq!(android.stages[3].users_reached, 1);

        let ios = segment(&report, "ios");
        assert_eq!(ios.stages[0].users_reached, 10);
        assert_rate(ios.stages[0].conversion_rate_to_next, 30.00);
        assert_rate(ios.stages[1].conversion_rate_to_next, 66.67);
        assert_rate(ios.stages[2].conversion_rate_to_next, 100.00);
        assert_eq!(ios.stages[3].users_reached, 2);

        assert_eq!(report.users_with_conflicting_platform, 0);
        Ok(())
    }

    #[tokio::test]
    async fn strict_transitions_and_timing() -> anyhow::Result<()> {
        let test_db = TestDatabase::with_migrations().await?;
        seed_sample(&test_db).await?;
        let service = FunnelService::new(test_db.db.clone());

        let report = service
            .analyze(&milestones(), FunnelFilter::default())
            .await?;

        // Each seeded sequence is a strict one-minute-spaced prefix
        let android = segment(&report, "android");
        assert_eq!(android.stages[0].strict_transitions_to_next, 4);
        assert_eq!(android.stages[1].strict_transitions_to_next, 2);
        assert_eq!(android.stages[2].strict_transitions_to_next, 1);
        assert_eq!(android.stages[0].avg_seconds_to_next, Some(60.0));
        assert_eq!(android.stages[0].median_seconds_to_next, Some(60.0));
        // Last stage never carries boundary metrics
        assert_eq!(android.stages[3].conversion_rate_to_next, None);
        assert_eq!(android.stages[3].avg_seconds_to_next, None);
        Ok(())
    }

    #[tokio::test]
    async fn intervening_event_breaks_strict_transition_not_reach() -> anyhow::Result<()> {
        let test_db = TestDatabase::with_migrations().await?;
        let t0 = base_time();
        // install -> (session_start) -> view: still "ever reached" view,
        // but the immediate follower of install is not view
        test_db.insert_event(1, "app_install", t0, Some("ios")).await?;
        test_db
            .insert_event(1, "session_start", t0 + Duration::seconds(10), Some("ios"))
            .await?;
        test_db
            .insert_event(1, "view_item", t0 + Duration::seconds(20), Some("ios"))
            .await?;
        let service = FunnelService::new(test_db.db.clone());

        let report = service
            .analyze(&milestones(), FunnelFilter::default())
            .await?;
        let ios = segment(&report, "ios");

        assert_eq!(ios.stages[0].users_reached, 1);
        assert_eq!(ios.stages[1].users_reached, 1);
        assert_rate(ios.stages[0].conversion_rate_to_next, 100.00);
        assert_eq!(ios.stages[0].strict_transitions_to_next, 0);
        assert_eq!(ios.stages[0].avg_seconds_to_next, None);
        Ok(())
    }

    #[tokio::test]
    async fn single_event_user_reaches_one_stage_and_no_transition() -> anyhow::Result<()> {
        let test_db = TestDatabase::with_migrations().await?;
        test_db
            .insert_event(5, "app_install", base_time(), Some("android"))
            .await?;
        let service = FunnelService::new(test_db.db.clone());

        let report = service
            .analyze(&milestones(), FunnelFilter::default())
            .await?;
        let android = segment(&report, "android");

        assert_eq!(android.stages[0].users_reached, 1);
        assert_eq!(android.stages[0].strict_transitions_to_next, 0);
        assert_eq!(android.stages[1].users_reached, 0);
        // view -> cart rate has a zero denominator: null, not zero
        assert_eq!(android.stages[1].conversion_rate_to_next, None);
        Ok(())
    }

    #[tokio::test]
    async fn skipped_milestone_still_counts_ever_reached() -> anyhow::Result<()> {
        let test_db = TestDatabase::with_migrations().await?;
        let t0 = base_time();
        // Purchases without any cart event: purchase ever-reached exceeds
        // cart ever-reached, which is why monotonicity is never assumed
        test_db.insert_event(1, "app_install", t0, Some("ios")).await?;
        test_db
            .insert_event(1, "purchase", t0 + Duration::minutes(1), Some("ios"))
            .await?;
        let service = FunnelService::new(test_db.db.clone());

        let report = service
            .analyze(&milestones(), FunnelFilter::default())
            .await?;
        let ios = segment(&report, "ios");

        assert_eq!(ios.stages[2].users_reached, 0);
        assert_eq!(ios.stages[3].users_reached, 1);
        assert_eq!(ios.stages[2].conversion_rate_to_next, None);
        assert_eq!(ios.stages[2].strict_transitions_to_next, 0);
        // Strict transitions can never exceed the source stage's reach
        for stage in &ios.stages {
            assert!(stage.strict_transitions_to_next <= stage.users_reached);
        }
        Ok(())
    }

    #[tokio::test]
    async fn observed_platform_without_milestones_gets_zero_row() -> anyhow::Result<()> {
        let test_db = TestDatabase::with_migrations().await?;
        let t0 = base_time();
        test_db.insert_event(1, "app_install", t0, Some("ios")).await?;
        test_db.insert_event(2, "session_start", t0, Some("web")).await?;
        let service = FunnelService::new(test_db.db.clone());

        let report = service
            .analyze(&milestones(), FunnelFilter::default())
            .await?;

        let web = segment(&report, "web");
        assert!(web.stages.iter().all(|s| s.users_reached == 0));
        assert_eq!(web.overall_conversion_rate, None);
        // User 2 never hit the first milestone: null segment, not "web"
        assert!(report
            .segments
            .iter()
            .any(|s| s.platform.is_none() && s.stages[0].users_reached == 0));
        Ok(())
    }

    #[tokio::test]
    async fn conflicting_platform_is_counted_not_resolved() -> anyhow::Result<()> {
        let test_db = TestDatabase::with_migrations().await?;
        let t0 = base_time();
        test_db.insert_event(1, "app_install", t0, Some("ios")).await?;
        test_db
            .insert_event(1, "view_item", t0 + Duration::minutes(1), Some("android"))
            .await?;
        let service = FunnelService::new(test_db.db.clone());

        let report = service
            .analyze(&milestones(), FunnelFilter::default())
            .await?;

        assert_eq!(report.users_with_conflicting_platform, 1);
        // Derived segment stays the install platform
        let ios = segment(&report, "ios");
        assert_eq!(ios.stages[0].users_reached, 1);
        assert_eq!(ios.stages[1].users_reached, 1);
        Ok(())
    }

    #[tokio::test]
    async fn analysis_is_idempotent() -> anyhow::Result<()> {
        let test_db = TestDatabase::with_migrations().await?;
        seed_sample(&test_db).await?;
        let service = FunnelService::new(test_db.db.clone());

        let first = service
            .analyze(&milestones(), FunnelFilter::default())
            .await?;
        let second = service
            .analyze(&milestones(), FunnelFilter::default())
            .await?;

        assert_eq!(
            serde_json::to_value(&first)?,
            serde_json::to_value(&second)?
        );
        Ok(())
    }

    #[tokio::test]
    async fn empty_milestone_list_is_rejected() -> anyhow::Result<()> {
        let test_db = TestDatabase::with_migrations().await?;
        let service = FunnelService::new(test_db.db.clone());

        let result = service.analyze(&[], FunnelFilter::default()).await;
        assert!(matches!(result, Err(FunnelError::InvalidInput(_))));
        Ok(())
    }
}
