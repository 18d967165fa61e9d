//! Event log ingestion
//!
//! Loads a flat tabular event file (CSV or JSON lines) into the events
//! table. Malformed rows are skipped and counted, never fatal; only an
//! unreadable file or a missing/incompatible header fails the run.

mod parser;
mod service;

pub use parser::{parse_timestamp, ParseRowError, ParsedEvent};
pub use service::{ImportSummary, IngestError, IngestService};
