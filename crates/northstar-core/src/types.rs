//! Canonical datetime types used across all Northstar crates

use chrono::{DateTime as ChronoDateTime, Utc};

/// Database DateTime type used across all Northstar crates
///
/// This is the canonical datetime type for the `event_timestamp` column and
/// any other timestamp persisted to the event store.
pub type DBDateTime = ChronoDateTime<Utc>;

/// Standard UTC DateTime type used across all Northstar crates
///
/// Canonical datetime type for report fields and service parameters.
/// Serializes as ISO 8601 with a 'Z' suffix.
pub type UtcDateTime = ChronoDateTime<Utc>;
