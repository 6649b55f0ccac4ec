use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use calamine::{Data, Range, Reader, Sheets, open_workbook_auto};

const ANCHOR_CELL: (u32, u32) = (0, 0);
const HEADER_ROW: u32 = 1;

pub const CATEGORY_COLUMN: usize = 0;
pub const METRIC_COLUMN: usize = 1;

static EMPTY_CELL: Data = Data::Empty;

/// One worksheet read in a single pass: the company anchor from A1, the
/// header labels from row 2 and every row below it.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetTable {
    pub name: String,
    pub company: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<Data>>,
}

impl SheetTable {
    pub fn from_range(name: &str, range: &Range<Data>) -> Self {
        let company = range
            .get_value(ANCHOR_CELL)
            .map(cell_to_string)
            .unwrap_or_default();

        let Some((end_row, end_col)) = range.end() else {
            return Self {
                name: name.to_string(),
                company,
                header: Vec::new(),
                rows: Vec::new(),
            };
        };

        let width = end_col as usize + 1;
        let read_row = |row: u32| -> Vec<Data> {
            (0..=end_col)
                .map(|col| range.get_value((row, col)).cloned().unwrap_or(Data::Empty))
                .collect()
        };

        let mut header = Vec::with_capacity(width);
        if end_row >= HEADER_ROW {
            header.extend(read_row(HEADER_ROW).iter().map(header_label));
        }

        let rows = (HEADER_ROW + 1..=end_row).map(read_row).collect();

        Self {
            name: name.to_string(),
            company,
            header,
            rows,
        }
    }

    pub fn cell(row: &[Data], column: usize) -> &Data {
        row.get(column).unwrap_or(&EMPTY_CELL)
    }
}

pub struct Workbook {
    sheets: Sheets<BufReader<File>>,
}

impl Workbook {
    pub fn open(path: &Path) -> Result<Self> {
        let sheets = open_workbook_auto(path)
            .with_context(|| format!("failed to open workbook {}", path.display()))?;
        Ok(Self { sheets })
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.sheet_names()
    }

    pub fn read_sheet(&mut self, name: &str) -> Result<SheetTable> {
        let range = self
            .sheets
            .worksheet_range(name)
            .with_context(|| format!("failed to read sheet {name}"))?;
        Ok(SheetTable::from_range(name, &range))
    }
}

/// Renders a cell as trimmed text. Whole floats drop their fraction so a
/// numeric `2019` header reads as `"2019"`.
pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => {
            if f.is_finite() && *f == f.trunc() && f.abs() < 1e15 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.trim().to_string(),
        Data::Error(_) | Data::Empty => String::new(),
    }
}

/// Header text as written. Unlike `cell_to_string`, string labels keep
/// their surrounding whitespace so `"2019 "` is not read as a year.
fn header_label(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        other => cell_to_string(other),
    }
}

pub fn cell_is_empty(cell: &Data) -> bool {
    cell_to_string(cell).is_empty()
}
