use crate::render;
use clap::Args;
use northstar_database::DbConnection;
use northstar_funnels::{FunnelFilter, FunnelService};
use northstar_ingest::parse_timestamp;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args)]
pub struct FunnelCommand {
    /// Event file to load before analyzing
    #[arg(long, short)]
    input: Option<PathBuf>,

    /// Ordered milestone list, e.g. app_install,view_item,add_to_cart,purchase
    #[arg(long, short, value_delimiter = ',', required = true)]
    milestones: Vec<String>,

    /// Only consider events at or after this timestamp
    #[arg(long, value_parser = parse_cli_timestamp)]
    start_date: Option<northstar_core::UtcDateTime>,

    /// Only consider events at or before this timestamp
    #[arg(long, value_parser = parse_cli_timestamp)]
    end_date: Option<northstar_core::UtcDateTime>,

    /// Print the report as JSON instead of a table
    #[arg(long)]
    json: bool,
}

pub(crate) fn parse_cli_timestamp(raw: &str) -> Result<northstar_core::UtcDateTime, String> {
    parse_timestamp(raw).map_err(|e| e.to_string())
}

impl FunnelCommand {
    pub async fn execute(self, db: Arc<DbConnection>) -> anyhow::Result<()> {
        super::ingest_if_given(&db, self.input.as_deref()).await?;

        let filter = FunnelFilter {
            start_date: self.start_date,
            end_date: self.end_date,
        };
        let report = FunnelService::new(db).analyze(&self.milestones, filter).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            render::print_funnel(&report);
        }
        Ok(())
    }
}
