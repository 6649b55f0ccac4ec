use calamine::Data;

use super::workbook::cell_to_string;

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Blank cell; skipped without being counted.
    Missing,
    /// Present but not a finite number. Carries the rendered cell text.
    Invalid(String),
    Number(f64),
}

pub fn coerce_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Missing,
        Data::Int(value) => CellValue::Number(*value as f64),
        Data::Float(value) => finite_or_invalid(*value, || value.to_string()),
        Data::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return CellValue::Missing;
            }
            match trimmed.parse::<f64>() {
                Ok(value) => finite_or_invalid(value, || trimmed.to_string()),
                Err(_) => CellValue::Invalid(trimmed.to_string()),
            }
        }
        Data::Bool(flag) => CellValue::Number(if *flag { 1.0 } else { 0.0 }),
        Data::Error(err) => CellValue::Invalid(err.to_string()),
        Data::DateTime(_) | Data::DateTimeIso(_) | Data::DurationIso(_) => {
            CellValue::Invalid(cell_to_string(cell))
        }
    }
}

fn finite_or_invalid<F>(value: f64, render: F) -> CellValue
where
    F: FnOnce() -> String,
{
    if value.is_finite() {
        CellValue::Number(value)
    } else {
        CellValue::Invalid(render())
    }
}
