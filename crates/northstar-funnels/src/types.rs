use northstar_core::UtcDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FunnelError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Optional time-range restriction for a funnel run
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FunnelFilter {
    pub start_date: Option<UtcDateTime>,
    pub end_date: Option<UtcDateTime>,
}

/// Funnel analysis result, one entry per observed segment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunnelReport {
    pub milestones: Vec<String>,
    pub segments: Vec<SegmentFunnel>,
    /// Users observed under more than one non-null platform value. The
    /// conflict is surfaced, not resolved: the derived segment stays the
    /// platform of the user's earliest first-milestone event.
    pub users_with_conflicting_platform: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentFunnel {
    /// Segment value; `None` groups users with no first-milestone event
    pub platform: Option<String>,
    pub stages: Vec<StageMetrics>,
    /// Last-stage over first-stage ever-reached percentage
    pub overall_conversion_rate: Option<f64>,
}

/// Metrics for one milestone and its boundary to the following milestone.
/// The boundary fields of the last stage are always empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageMetrics {
    pub milestone: String,
    /// Distinct users with any event of this milestone, regardless of
    /// sequence position
    pub users_reached: u64,
    /// `users_reached[next] / users_reached[this] × 100`; `None` for the
    /// last stage or a zero denominator
    pub conversion_rate_to_next: Option<f64>,
    /// Distinct users for whom the immediately next event after this
    /// milestone was the next milestone
    pub strict_transitions_to_next: u64,
    pub avg_seconds_to_next: Option<f64>,
    pub median_seconds_to_next: Option<f64>,
}
