//! Active-user and stickiness counters
//!
//! DAU/WAU/MAU are distinct-user counts over fixed lookback windows ending
//! at an explicit instant, never an ambient clock, so results are
//! reproducible.

mod service;

pub use service::{ActiveUsersSummary, ActivityError, ActivityService};
