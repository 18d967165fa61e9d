//! Funnel sequencer
//!
//! Computes, per segment, how many distinct users ever reached each
//! milestone of an ordered milestone list, the stage-to-stage conversion
//! rates, and timing statistics for users whose immediately next event after
//! one milestone was the next milestone.

pub mod services;
pub mod types;

pub use services::FunnelService;
pub use types::{FunnelError, FunnelFilter, FunnelReport, SegmentFunnel, StageMetrics};
