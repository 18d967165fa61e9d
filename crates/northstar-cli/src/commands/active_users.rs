use crate::render;
use clap::Args;
use northstar_activity::ActivityService;
use northstar_database::DbConnection;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args)]
pub struct ActiveUsersCommand {
    /// Event file to load before analyzing
    #[arg(long, short)]
    input: Option<PathBuf>,

    /// Reference instant T for the lookback windows (RFC 3339).
    /// Explicit on purpose: no ambient clock, so runs are reproducible.
    #[arg(long, value_parser = super::funnel::parse_cli_timestamp)]
    at: northstar_core::UtcDateTime,

    /// Print the summary as JSON instead of a table
    #[arg(long)]
    json: bool,
}

impl ActiveUsersCommand {
    pub async fn execute(self, db: Arc<DbConnection>) -> anyhow::Result<()> {
        super::ingest_if_given(&db, self.input.as_deref()).await?;

        let summary = ActivityService::new(db).active_users(self.at).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            render::print_active_users(&summary);
        }
        Ok(())
    }
}
