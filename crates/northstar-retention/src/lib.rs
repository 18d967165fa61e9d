//! Weekly cohort retention
//!
//! Buckets users into weekly cohorts by their earliest qualifying milestone
//! event and reports, per week offset, the fraction of the cohort active in
//! that week. Cohort weeks and activity weeks share the single week-index
//! function in `northstar_core::week`.

mod service;

pub use service::{CohortRow, RetentionError, RetentionReport, RetentionService};
