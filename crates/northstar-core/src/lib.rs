//! Core utilities and types shared across all Northstar crates

pub mod error;
pub mod stats;
pub mod types;
pub mod week;

// Re-export commonly used types
pub use error::*;
pub use types::*;

// Re-export external dependencies
pub use anyhow;
pub use chrono;
pub use serde;
pub use serde_json;
pub use thiserror;
pub use tracing;
