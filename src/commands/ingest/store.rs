use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};

use crate::config::StoreConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct MetricValueRow<'a> {
    pub company_id: i64,
    pub metric_id: i64,
    pub fiscal_year: i32,
    pub value: f64,
    pub source_file: &'a str,
}

/// Single synchronous SQLite session. Writes open a transaction lazily;
/// `commit` closes it.
pub struct SqliteStore {
    connection: Connection,
}

impl SqliteStore {
    pub fn open(config: &StoreConfig) -> Result<Self> {
        let connection = Connection::open(&config.db_path)
            .with_context(|| format!("failed to open {}", config.db_path.display()))?;
        connection
            .busy_timeout(config.busy_timeout)
            .context("failed to set busy timeout")?;
        configure_connection(&connection)?;
        Self::from_connection(connection)
    }

    pub fn from_connection(connection: Connection) -> Result<Self> {
        connection
            .pragma_update(None, "foreign_keys", "ON")
            .context("failed to enable foreign_keys")?;
        ensure_schema(&connection)?;
        Ok(Self { connection })
    }

    pub fn insert_company(&mut self, name: &str) -> rusqlite::Result<usize> {
        self.begin_if_needed()?;
        self.connection.execute(
            "INSERT INTO companies(name) VALUES(?1) ON CONFLICT(name) DO NOTHING",
            [name],
        )
    }

    pub fn find_company_id(&self, name: &str) -> rusqlite::Result<Option<i64>> {
        self.connection
            .query_row(
                "SELECT company_id FROM companies WHERE name = ?1",
                [name],
                |row| row.get(0),
            )
            .optional()
    }

    pub fn insert_metric(&mut self, name: &str, category: &str) -> rusqlite::Result<usize> {
        self.begin_if_needed()?;
        self.connection.execute(
            "
            INSERT INTO financial_metrics(name, category) VALUES(?1, ?2)
            ON CONFLICT(name, category) DO NOTHING
            ",
            params![name, category],
        )
    }

    pub fn find_metric_id(&self, name: &str, category: &str) -> rusqlite::Result<Option<i64>> {
        self.connection
            .query_row(
                "SELECT metric_id FROM financial_metrics WHERE name = ?1 AND category = ?2",
                params![name, category],
                |row| row.get(0),
            )
            .optional()
    }

    /// Returns `false` when an identical row already existed.
    pub fn insert_metric_value(&mut self, row: &MetricValueRow<'_>) -> Result<bool> {
        self.begin_if_needed()?;
        let inserted = self
            .connection
            .execute(
                "
                INSERT INTO metric_values(company_id, metric_id, fiscal_year, value, source_file)
                VALUES(?1, ?2, ?3, ?4, ?5)
                ON CONFLICT DO NOTHING
                ",
                params![
                    row.company_id,
                    row.metric_id,
                    row.fiscal_year,
                    row.value,
                    row.source_file
                ],
            )
            .with_context(|| {
                format!(
                    "failed to insert value for company {} metric {} year {}",
                    row.company_id, row.metric_id, row.fiscal_year
                )
            })?;
        Ok(inserted > 0)
    }

    pub fn commit(&mut self) -> rusqlite::Result<()> {
        if !self.connection.is_autocommit() {
            self.connection.execute_batch("COMMIT")?;
        }
        Ok(())
    }

    fn begin_if_needed(&self) -> rusqlite::Result<()> {
        if self.connection.is_autocommit() {
            self.connection.execute_batch("BEGIN")?;
        }
        Ok(())
    }
}

fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
            CREATE TABLE IF NOT EXISTS companies (
              company_id INTEGER PRIMARY KEY,
              name TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS financial_metrics (
              metric_id INTEGER PRIMARY KEY,
              name TEXT NOT NULL,
              category TEXT NOT NULL,
              UNIQUE(name, category)
            );

            CREATE TABLE IF NOT EXISTS metric_values (
              value_id INTEGER PRIMARY KEY,
              company_id INTEGER NOT NULL,
              metric_id INTEGER NOT NULL,
              fiscal_year INTEGER NOT NULL,
              value REAL NOT NULL,
              source_file TEXT NOT NULL,
              UNIQUE(company_id, metric_id, fiscal_year, source_file),
              FOREIGN KEY(company_id) REFERENCES companies(company_id),
              FOREIGN KEY(metric_id) REFERENCES financial_metrics(metric_id)
            );

            CREATE INDEX IF NOT EXISTS idx_metric_values_company_year
              ON metric_values(company_id, fiscal_year);
            ",
        )
        .context("failed to initialize schema")?;

    Ok(())
}

pub fn count_rows(connection: &Connection, sql: &str) -> Result<i64> {
    let count = connection.query_row(sql, [], |row| row.get(0))?;
    Ok(count)
}
