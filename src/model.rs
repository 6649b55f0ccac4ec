use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunMode {
    Live,
    DryRun,
}

impl RunMode {
    pub fn from_dry_run(dry_run: bool) -> Self {
        if dry_run { Self::DryRun } else { Self::Live }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::DryRun => "dry-run",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestCounts {
    pub sheets: u64,
    pub companies: u64,
    pub metrics: u64,
    pub values: u64,
    pub skipped: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestPaths {
    pub source_file: String,
    pub run_log_path: String,
    pub db_path: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub mode: RunMode,
    pub started_at: String,
    pub finished_at: String,
    pub source_sha256: String,
    pub paths: IngestPaths,
    pub counts: IngestCounts,
}
