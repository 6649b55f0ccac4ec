use crate::model::IngestCounts;

/// Run-wide counters. Increment-only; read once through `snapshot`.
#[derive(Debug, Default)]
pub struct SummaryCounters {
    counts: IngestCounts,
}

impl SummaryCounters {
    pub fn record_sheet(&mut self) {
        self.counts.sheets += 1;
    }

    pub fn record_company(&mut self) {
        self.counts.companies += 1;
    }

    pub fn record_metric(&mut self) {
        self.counts.metrics += 1;
    }

    pub fn record_value(&mut self) {
        self.counts.values += 1;
    }

    pub fn record_skip(&mut self) {
        self.counts.skipped += 1;
    }

    pub fn snapshot(&self) -> IngestCounts {
        self.counts
    }
}

impl IngestCounts {
    pub fn summary_lines(&self) -> [String; 5] {
        [
            format!("Sheets: {}", self.sheets),
            format!("Companies: {}", self.companies),
            format!("Metrics: {}", self.metrics),
            format!("Values: {}", self.values),
            format!("Skipped: {}", self.skipped),
        ]
    }
}
