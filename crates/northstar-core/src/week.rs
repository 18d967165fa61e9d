//! Unified week indexing
//!
//! Cohort weeks and activity weeks MUST be computed with the same numbering
//! scheme, otherwise retention lands on the wrong offsets. Every crate that
//! buckets by week goes through [`index_of`]; labels are derived back from
//! the index via [`week_start`] so the two can never disagree.

use crate::types::UtcDateTime;
use chrono::{Duration, NaiveDate};

/// Monday, 1970-01-05: origin of week index 0. Weeks run Monday..Sunday.
fn epoch_monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 5).expect("valid fixed date")
}

/// Week index of a timestamp: whole weeks elapsed since the epoch Monday.
/// Negative for dates before 1970-01-05 (euclidean division keeps the
/// Monday..Sunday grouping intact across the origin).
pub fn index_of(ts: UtcDateTime) -> i64 {
    let days = ts
        .date_naive()
        .signed_duration_since(epoch_monday())
        .num_days();
    days.div_euclid(7)
}

/// First day (Monday) of the week with the given index.
pub fn week_start(index: i64) -> NaiveDate {
    epoch_monday() + Duration::weeks(index)
}
