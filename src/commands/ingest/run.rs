use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::info;

use crate::cli::IngestArgs;
use crate::config::RunConfig;
use crate::model::{IngestCounts, IngestPaths, IngestRunManifest, RunMode};
use crate::util::{sha256_file, utc_compact_string, utc_string, write_json_pretty};

use super::pipeline::Ingestion;
use super::resolver::EntityResolver;
use super::run_log::RunLog;
use super::store::SqliteStore;
use super::workbook::Workbook;

pub fn run(args: IngestArgs) -> Result<()> {
    let config = RunConfig::from_env()?;
    let started_ts = Utc::now();
    let mode = RunMode::from_dry_run(args.dry_run);
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    info!(
        file = %args.file.display(),
        mode = mode.as_str(),
        run_id = %run_id,
        "starting ingest"
    );

    let mut log = RunLog::create_in(&config.log_dir, started_ts)?;
    let counts = ingest_file(&args.file, mode, &config, &mut log)?;
    log.flush()?;

    let manifest = IngestRunManifest {
        manifest_version: 1,
        run_id,
        mode,
        started_at: utc_string(started_ts),
        finished_at: utc_string(Utc::now()),
        source_sha256: sha256_file(&args.file)?,
        paths: IngestPaths {
            source_file: args.file.display().to_string(),
            run_log_path: log
                .path()
                .map(|path| path.display().to_string())
                .unwrap_or_default(),
            db_path: match mode {
                RunMode::Live => Some(config.store.db_path.display().to_string()),
                RunMode::DryRun => None,
            },
        },
        counts,
    };

    let manifest_path = config.log_dir.join(manifest_file_name(started_ts));
    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote ingest run manifest");

    Ok(())
}

/// Opens the workbook and, for live runs, the store, then walks every
/// sheet. Workbook and store failures here are fatal for the run.
pub fn ingest_file(
    path: &Path,
    mode: RunMode,
    config: &RunConfig,
    log: &mut RunLog,
) -> Result<IngestCounts> {
    let resolver = match mode {
        RunMode::Live => EntityResolver::Live(SqliteStore::open(&config.store)?),
        RunMode::DryRun => EntityResolver::DryRun,
    };
    let mut workbook = Workbook::open(path)?;

    let mut ingestion = Ingestion::new(resolver, log, path.display().to_string())?;
    ingestion.ingest_workbook(&mut workbook)?;
    Ok(ingestion.finish())
}

fn manifest_file_name(started: DateTime<Utc>) -> String {
    format!("etl_run_{}.json", utc_compact_string(started))
}
