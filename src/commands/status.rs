use anyhow::{Context, Result};
use rusqlite::{Connection, OpenFlags};
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::commands::ingest::count_rows;
use crate::config::RunConfig;

pub fn run(_args: StatusArgs) -> Result<()> {
    let config = RunConfig::from_env()?;
    let db_path = &config.store.db_path;

    info!(db_path = %db_path.display(), log_dir = %config.log_dir.display(), "status requested");

    if !db_path.exists() {
        warn!(path = %db_path.display(), "database file missing");
        return Ok(());
    }

    let connection = Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    let companies = count_rows(&connection, "SELECT COUNT(*) FROM companies").unwrap_or(0);
    let metrics = count_rows(&connection, "SELECT COUNT(*) FROM financial_metrics").unwrap_or(0);
    let values = count_rows(&connection, "SELECT COUNT(*) FROM metric_values").unwrap_or(0);

    info!(
        path = %db_path.display(),
        companies,
        metrics,
        values,
        "database status"
    );

    Ok(())
}
