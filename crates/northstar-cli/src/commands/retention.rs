use crate::render;
use clap::Args;
use northstar_database::DbConnection;
use northstar_retention::RetentionService;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args)]
pub struct RetentionCommand {
    /// Event file to load before analyzing
    #[arg(long, short)]
    input: Option<PathBuf>,

    /// Milestone event that assigns a user to a cohort week
    #[arg(long, default_value = "app_install")]
    cohort_event: String,

    /// Highest week offset to report
    #[arg(long, default_value_t = 8)]
    weeks: u32,

    /// Print the report as JSON instead of a table
    #[arg(long)]
    json: bool,
}

impl RetentionCommand {
    pub async fn execute(self, db: Arc<DbConnection>) -> anyhow::Result<()> {
        super::ingest_if_given(&db, self.input.as_deref()).await?;

        let report = RetentionService::new(db)
            .analyze(&self.cohort_event, self.weeks)
            .await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            render::print_retention(&report);
        }
        Ok(())
    }
}
