use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

pub const DB_PATH_VAR: &str = "FINANCIALS_DB_PATH";
pub const LOG_DIR_VAR: &str = "FINANCIALS_LOG_DIR";
pub const BUSY_TIMEOUT_VAR: &str = "FINANCIALS_BUSY_TIMEOUT_MS";

const DEFAULT_DB_PATH: &str = "financials.sqlite";
const DEFAULT_LOG_DIR: &str = "logs";
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub db_path: PathBuf,
    pub busy_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub store: StoreConfig,
    pub log_dir: PathBuf,
}

impl RunConfig {
    /// Loads `.env` (if present) and reads the process environment.
    pub fn from_env() -> Result<Self> {
        // A missing .env file is the normal case.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let db_path = non_empty(DB_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));
        let log_dir = non_empty(LOG_DIR_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR));
        let busy_timeout_ms = match non_empty(BUSY_TIMEOUT_VAR) {
            Some(raw) => raw
                .parse::<u64>()
                .with_context(|| format!("invalid {BUSY_TIMEOUT_VAR}: {raw}"))?,
            None => DEFAULT_BUSY_TIMEOUT_MS,
        };

        Ok(Self {
            store: StoreConfig {
                db_path,
                busy_timeout: Duration::from_millis(busy_timeout_ms),
            },
            log_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_environment_is_empty() {
        let config = RunConfig::from_lookup(lookup_from(&[])).expect("defaults should load");
        assert_eq!(config.store.db_path, PathBuf::from("financials.sqlite"));
        assert_eq!(config.store.busy_timeout, Duration::from_millis(5000));
        assert_eq!(config.log_dir, PathBuf::from("logs"));
    }

    #[test]
    fn environment_values_override_defaults() {
        let config = RunConfig::from_lookup(lookup_from(&[
            (DB_PATH_VAR, "/tmp/metrics.db"),
            (LOG_DIR_VAR, " run-logs "),
            (BUSY_TIMEOUT_VAR, "250"),
        ]))
        .expect("overrides should load");
        assert_eq!(config.store.db_path, PathBuf::from("/tmp/metrics.db"));
        assert_eq!(config.store.busy_timeout, Duration::from_millis(250));
        assert_eq!(config.log_dir, PathBuf::from("run-logs"));
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = RunConfig::from_lookup(lookup_from(&[(DB_PATH_VAR, "   ")]))
            .expect("blank value should be ignored");
        assert_eq!(config.store.db_path, PathBuf::from("financials.sqlite"));
    }

    #[test]
    fn non_numeric_busy_timeout_is_rejected() {
        let err = RunConfig::from_lookup(lookup_from(&[(BUSY_TIMEOUT_VAR, "soon")]))
            .expect_err("non-numeric timeout should fail");
        assert!(err.to_string().contains(BUSY_TIMEOUT_VAR));
    }
}
