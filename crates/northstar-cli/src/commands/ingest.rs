use anyhow::Context;
use clap::Args;
use northstar_database::DbConnection;
use northstar_ingest::IngestService;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args)]
pub struct IngestCommand {
    /// Event file to load (CSV with header, or .jsonl/.ndjson)
    #[arg(long, short)]
    input: PathBuf,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

impl IngestCommand {
    pub async fn execute(self, db: Arc<DbConnection>) -> anyhow::Result<()> {
        let summary = IngestService::new(db)
            .load_file(&self.input)
            .await
            .with_context(|| format!("failed to load '{}'", self.input.display()))?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            println!("loaded {} event(s), skipped {}", summary.loaded, summary.skipped);
        }
        Ok(())
    }
}
