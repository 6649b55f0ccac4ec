use anyhow::{Context, Result};
use calamine::Data;

use crate::model::IngestCounts;

use super::metric_names::MetricNameParser;
use super::resolver::{EntityId, EntityResolver, MetricValue, Resolution, ResolutionError};
use super::run_log::RunLog;
use super::summary::SummaryCounters;
use super::values::{CellValue, coerce_value};
use super::workbook::{
    CATEGORY_COLUMN, METRIC_COLUMN, SheetTable, Workbook, cell_is_empty, cell_to_string,
};
use super::year_columns::{YearColumn, detect_year_columns};

/// Spreadsheet row number (1-based) of the first data row: the company
/// anchor sits on row 1 and the header on row 2.
const FIRST_DATA_ROW_NUMBER: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetOutcome {
    Committed,
    /// A resolution failure ended the sheet early. Writes made before the
    /// failure are still committed.
    Abandoned,
}

enum RowOutcome {
    Done,
    AbandonSheet(ResolutionError),
}

/// Drives sheet -> row -> fiscal year traversal and owns the run counters.
pub struct Ingestion<'log> {
    resolver: EntityResolver,
    names: MetricNameParser,
    log: &'log mut RunLog,
    counters: SummaryCounters,
    source_file: String,
}

impl<'log> Ingestion<'log> {
    pub fn new(resolver: EntityResolver, log: &'log mut RunLog, source_file: String) -> Result<Self> {
        if resolver.is_dry_run() {
            log.info("Dry-run mode enabled; the database will not be opened");
        }

        Ok(Self {
            resolver,
            names: MetricNameParser::new()?,
            log,
            counters: SummaryCounters::default(),
            source_file,
        })
    }

    pub fn ingest_workbook(&mut self, workbook: &mut Workbook) -> Result<()> {
        for sheet_name in workbook.sheet_names() {
            let sheet = workbook.read_sheet(&sheet_name)?;
            self.ingest_sheet(&sheet)?;
        }
        Ok(())
    }

    pub fn ingest_sheet(&mut self, sheet: &SheetTable) -> Result<SheetOutcome> {
        self.counters.record_sheet();
        self.log.info(&format!("Processing sheet: {}", sheet.name));
        self.log.debug(&format!("Company: {}", sheet.company));

        let company_id = match self.resolve_company(sheet)? {
            Ok(id) => {
                self.counters.record_company();
                id
            }
            Err(err) => {
                self.log.warn(&err.to_string());
                self.counters.record_skip();
                return Ok(SheetOutcome::Abandoned);
            }
        };

        let years = detect_year_columns(sheet.header.as_slice());
        let year_labels: Vec<&str> = years.iter().map(|year| year.label.as_str()).collect();
        self.log.debug(&format!("Years detected: {year_labels:?}"));

        let mut outcome = SheetOutcome::Committed;
        for (offset, row) in sheet.rows.iter().enumerate() {
            let row_number = FIRST_DATA_ROW_NUMBER + offset;
            if let RowOutcome::AbandonSheet(err) =
                self.ingest_row(company_id, &years, row, row_number)?
            {
                self.log.warn(&format!(
                    "{err}; abandoning sheet {} at row {row_number}",
                    sheet.name
                ));
                self.counters.record_skip();
                outcome = SheetOutcome::Abandoned;
                break;
            }
        }

        self.resolver
            .commit()
            .with_context(|| format!("failed to commit sheet {}", sheet.name))?;
        if !self.resolver.is_dry_run() {
            self.log.info(&format!("Sheet {} processed", sheet.name));
        }

        Ok(outcome)
    }

    /// Logs the summary block and hands back the final counts.
    pub fn finish(self) -> IngestCounts {
        let Self { counters, log, .. } = self;
        let counts = counters.snapshot();
        log.summary(&counts);
        counts
    }

    fn resolve_company(&mut self, sheet: &SheetTable) -> Result<Resolution> {
        if sheet.company.is_empty() {
            return Ok(Err(ResolutionError::MissingCompanyName {
                sheet: sheet.name.clone(),
            }));
        }
        self.resolver.resolve_company(&sheet.company)
    }

    fn ingest_row(
        &mut self,
        company_id: EntityId,
        years: &[YearColumn],
        row: &[Data],
        row_number: usize,
    ) -> Result<RowOutcome> {
        let category_cell = SheetTable::cell(row, CATEGORY_COLUMN);
        let metric_cell = SheetTable::cell(row, METRIC_COLUMN);
        if cell_is_empty(category_cell) || cell_is_empty(metric_cell) {
            self.log
                .debug(&format!("Row {row_number} missing category or metric name"));
            self.counters.record_skip();
            return Ok(RowOutcome::Done);
        }

        let category = cell_to_string(category_cell);
        let label = self.names.parse(&cell_to_string(metric_cell));
        if label.name.is_empty() {
            self.log.warn(&format!(
                "Row {row_number} metric label has no name outside its unit annotation"
            ));
            self.counters.record_skip();
            return Ok(RowOutcome::Done);
        }

        let metric_id = match self.resolver.resolve_metric(&label.name, &category)? {
            Ok(id) => id,
            Err(err) => return Ok(RowOutcome::AbandonSheet(err)),
        };
        self.counters.record_metric();
        self.log.debug(&format!(
            "Metric: {} | Category: {category} | Unit: {}",
            label.name,
            label.unit.as_deref().unwrap_or("-")
        ));

        for year in years {
            let value = match coerce_value(SheetTable::cell(row, year.index)) {
                CellValue::Missing => continue,
                CellValue::Invalid(raw) => {
                    self.log.warn(&format!(
                        "Invalid value {raw} for year {} in metric {}",
                        year.label, label.name
                    ));
                    self.counters.record_skip();
                    continue;
                }
                CellValue::Number(value) => value,
            };

            self.counters.record_value();
            self.log.debug(&format!(
                "Value {value} for {} | Metric: {}",
                year.label, label.name
            ));

            let inserted = self.resolver.write_value(&MetricValue {
                company_id,
                metric_id,
                fiscal_year: year.fiscal_year,
                value,
                source_file: &self.source_file,
            })?;
            if !inserted && !self.resolver.is_dry_run() {
                self.log.debug(&format!(
                    "Value for {} | Metric: {} already loaded from this file",
                    year.label, label.name
                ));
            }
        }

        Ok(RowOutcome::Done)
    }
}
