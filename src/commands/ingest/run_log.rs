use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::model::IngestCounts;
use crate::util::{ensure_directory, now_utc_string};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Info,
    Debug,
    Warn,
}

impl Level {
    fn tag(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Debug => "DEBUG",
            Self::Warn => "WARN",
        }
    }
}

/// Per-run log. Every entry goes to `tracing` and is appended, with a
/// timestamp, to the run's own log file.
pub struct RunLog {
    writer: Box<dyn Write>,
    path: Option<PathBuf>,
}

impl RunLog {
    pub fn create_in(log_dir: &Path, started: DateTime<Utc>) -> Result<Self> {
        ensure_directory(log_dir)?;
        let path = log_dir.join(log_file_name(started));
        let file = File::create(&path)
            .with_context(|| format!("failed to create run log {}", path.display()))?;

        Ok(Self {
            writer: Box::new(BufWriter::new(file)),
            path: Some(path),
        })
    }

    pub fn from_writer(writer: Box<dyn Write>) -> Self {
        Self { writer, path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn info(&mut self, message: &str) {
        info!("{message}");
        self.append(Level::Info, message);
    }

    pub fn debug(&mut self, message: &str) {
        debug!("{message}");
        self.append(Level::Debug, message);
    }

    pub fn warn(&mut self, message: &str) {
        warn!("{message}");
        self.append(Level::Warn, message);
    }

    pub fn summary(&mut self, counts: &IngestCounts) {
        info!(
            sheets = counts.sheets,
            companies = counts.companies,
            metrics = counts.metrics,
            values = counts.values,
            skipped = counts.skipped,
            "ingest summary"
        );

        self.write_line("[SUMMARY]");
        for line in counts.summary_lines() {
            self.write_line(&line);
        }
        self.append(Level::Info, "ETL process completed");
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().context("failed to flush run log")
    }

    fn append(&mut self, level: Level, message: &str) {
        let line = format!("{} [{}] {}", now_utc_string(), level.tag(), message);
        self.write_line(&line);
    }

    fn write_line(&mut self, line: &str) {
        if let Err(err) = writeln!(self.writer, "{line}") {
            warn!(error = %err, "failed to append to run log");
        }
    }
}

pub fn log_file_name(started: DateTime<Utc>) -> String {
    started.format("etl_log_%Y%m%d_%H%M%S.txt").to_string()
}
