use anyhow::{Context, Result, bail};
use thiserror::Error;

use super::store::{MetricValueRow, SqliteStore};

/// Identifier handed out by a resolver. Dry runs only ever produce
/// `Sentinel`, which cannot be mistaken for a stored row id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityId {
    Stored(i64),
    Sentinel,
}

impl EntityId {
    pub fn stored(self) -> Option<i64> {
        match self {
            Self::Stored(id) => Some(id),
            Self::Sentinel => None,
        }
    }
}

/// Failures that end the current sheet but not the run. Store errors
/// raised while resolving are fatal and travel as `anyhow::Error` instead.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("sheet {sheet} has no company name in its first cell")]
    MissingCompanyName { sheet: String },
    #[error("could not retrieve company_id for {name}")]
    CompanyNotFound { name: String },
    #[error("metric {name} ({category}) not inserted/found")]
    MetricNotFound { name: String, category: String },
}

/// Outcome of a lookup-or-create that reached the store without error.
pub type Resolution = std::result::Result<EntityId, ResolutionError>;

pub struct MetricValue<'a> {
    pub company_id: EntityId,
    pub metric_id: EntityId,
    pub fiscal_year: i32,
    pub value: f64,
    pub source_file: &'a str,
}

/// Lookup-or-create against the store, or a dry run that never touches it.
pub enum EntityResolver {
    Live(SqliteStore),
    DryRun,
}

impl EntityResolver {
    pub fn is_dry_run(&self) -> bool {
        matches!(self, Self::DryRun)
    }

    pub fn resolve_company(&mut self, name: &str) -> Result<Resolution> {
        let Self::Live(store) = self else {
            return Ok(Ok(EntityId::Sentinel));
        };
        let context = || format!("store query failed while resolving company {name}");

        if let Some(id) = store.find_company_id(name).with_context(context)? {
            return Ok(Ok(EntityId::Stored(id)));
        }
        store.insert_company(name).with_context(context)?;
        store.commit().with_context(context)?;

        Ok(store
            .find_company_id(name)
            .with_context(context)?
            .map(EntityId::Stored)
            .ok_or_else(|| ResolutionError::CompanyNotFound {
                name: name.to_string(),
            }))
    }

    pub fn resolve_metric(&mut self, name: &str, category: &str) -> Result<Resolution> {
        let Self::Live(store) = self else {
            return Ok(Ok(EntityId::Sentinel));
        };
        let context =
            || format!("store query failed while resolving metric {name} ({category})");

        if let Some(id) = store.find_metric_id(name, category).with_context(context)? {
            return Ok(Ok(EntityId::Stored(id)));
        }
        store.insert_metric(name, category).with_context(context)?;
        store.commit().with_context(context)?;

        Ok(store
            .find_metric_id(name, category)
            .with_context(context)?
            .map(EntityId::Stored)
            .ok_or_else(|| ResolutionError::MetricNotFound {
                name: name.to_string(),
                category: category.to_string(),
            }))
    }

    /// Returns whether a new row was written. Always `false` in a dry run.
    pub fn write_value(&mut self, value: &MetricValue<'_>) -> Result<bool> {
        let Self::Live(store) = self else {
            return Ok(false);
        };

        let (Some(company_id), Some(metric_id)) =
            (value.company_id.stored(), value.metric_id.stored())
        else {
            bail!("live store cannot write values for sentinel ids");
        };

        store.insert_metric_value(&MetricValueRow {
            company_id,
            metric_id,
            fiscal_year: value.fiscal_year,
            value: value.value,
            source_file: value.source_file,
        })
    }

    pub fn commit(&mut self) -> Result<()> {
        match self {
            Self::Live(store) => store.commit().context("failed to commit sheet values"),
            Self::DryRun => Ok(()),
        }
    }
}
