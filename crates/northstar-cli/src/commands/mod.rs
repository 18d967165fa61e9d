mod active_users;
mod funnel;
mod ingest;
mod retention;

pub use active_users::ActiveUsersCommand;
pub use funnel::FunnelCommand;
pub use ingest::IngestCommand;
pub use retention::RetentionCommand;

use anyhow::Context;
use northstar_database::DbConnection;
use northstar_ingest::IngestService;
use std::path::Path;
use std::sync::Arc;

/// Load the input file when a command was given one. Analysis commands can
/// also run against an already-populated database file without `--input`.
pub(crate) async fn ingest_if_given(
    db: &Arc<DbConnection>,
    input: Option<&Path>,
) -> anyhow::Result<()> {
    if let Some(path) = input {
        let summary = IngestService::new(db.clone())
            .load_file(path)
            .await
            .with_context(|| format!("failed to load '{}'", path.display()))?;
        if summary.skipped > 0 {
            eprintln!(
                "warning: skipped {} malformed row(s) out of {}",
                summary.skipped,
                summary.loaded + summary.skipped
            );
        }
    }
    Ok(())
}
