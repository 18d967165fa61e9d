use crate::parser::{parse_json_row, CsvHeader, ParsedEvent};
use northstar_entities::events;
use sea_orm::{ActiveValue::Set, DatabaseConnection, EntityTrait};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Rows inserted per batch. Keeps statements well under SQLite's bound
/// variable limit (five columns per row).
const INSERT_BATCH_SIZE: usize = 500;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
    #[error("Cannot read input file '{path}': {source}")]
    UnreadableInput {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Incompatible input schema: {0}")]
    IncompatibleSchema(String),
}

/// Result of loading one input file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// Rows inserted into the event table
    pub loaded: u64,
    /// Malformed rows excluded from all aggregates
    pub skipped: u64,
}

pub struct IngestService {
    db: Arc<DatabaseConnection>,
}

impl IngestService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Load a CSV or JSON-lines event file. The extension selects the
    /// format: `.jsonl` / `.ndjson` / `.json` are JSON lines, everything
    /// else is CSV with a header row.
    pub async fn load_file(&self, path: &Path) -> Result<ImportSummary, IngestError> {
        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| IngestError::UnreadableInput {
                    path: path.display().to_string(),
                    source,
                })?;

        let json_lines = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("jsonl") | Some("ndjson") | Some("json")
        );

        let summary = if json_lines {
            self.load_json_lines(&content).await?
        } else {
            self.load_csv(&content).await?
        };

        tracing::info!(
            path = %path.display(),
            loaded = summary.loaded,
            skipped = summary.skipped,
            "event log loaded"
        );
        Ok(summary)
    }

    async fn load_csv(&self, content: &str) -> Result<ImportSummary, IngestError> {
        let mut lines = content.lines().enumerate();
        let header = match lines.next() {
            Some((_, line)) => CsvHeader::parse(line)
                .map_err(|e| IngestError::IncompatibleSchema(e.to_string()))?,
            None => {
                return Err(IngestError::IncompatibleSchema(
                    "input file is empty".to_string(),
                ))
            }
        };

        let mut parsed = Vec::new();
        let mut skipped = 0u64;
        for (line_number, line) in lines {
            if line.trim().is_empty() {
                continue;
            }
            match header.parse_row(line) {
                Ok(event) => parsed.push(event),
                Err(e) => {
                    skipped += 1;
                    tracing::warn!(line = line_number + 1, error = %e, "skipping malformed row");
                }
            }
        }

        let loaded = self.insert_batched(parsed).await?;
        Ok(ImportSummary { loaded, skipped })
    }

    async fn load_json_lines(&self, content: &str) -> Result<ImportSummary, IngestError> {
        let mut parsed = Vec::new();
        let mut skipped = 0u64;
        for (line_number, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match parse_json_row(line) {
                Ok(event) => parsed.push(event),
                Err(e) => {
                    skipped += 1;
                    tracing::warn!(line = line_number + 1, error = %e, "skipping malformed row");
                }
            }
        }

        let loaded = self.insert_batched(parsed).await?;
        Ok(ImportSummary { loaded, skipped })
    }

    /// Insert in file order so the auto-increment id preserves insertion
    /// order as the timestamp tiebreak.
    async fn insert_batched(&self, events: Vec<ParsedEvent>) -> Result<u64, IngestError> {
        let total = events.len() as u64;
        for batch in events.chunks(INSERT_BATCH_SIZE) {
            let models: Vec<events::ActiveModel> = batch
                .iter()
                .map(|e| events::ActiveModel {
                    user_id: Set(e.user_id),
                    event_name: Set(e.event_name.clone()),
                    event_timestamp: Set(e.event_timestamp),
                    platform: Set(e.platform.clone()),
                    ..Default::default()
                })
                .collect();
            events::Entity::insert_many(models)
                .exec(self.db.as_ref())
                .await?;
        }
        Ok(total)
    }
}
