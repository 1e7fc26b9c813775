use arrow::{
    array::{Array, ArrayRef, Date32Builder},
    datatypes::Date32Type,
};
use chrono::NaiveDate;
use std::sync::Arc;

use crate::{
    error::{ValidationError, ValidationResult},
    table::Table,
};

/// Parse `"YYYY-MM-DD"` (or `"YYYY/MM/DD"`), tolerating surrounding quotes,
/// whitespace and a trailing time part (`" 00:00"` or `"T00:00"`).
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim().trim_matches('"');
    let day = s.get(..10)?;
    let rest = &s[10..];
    if !(rest.is_empty() || rest.starts_with(' ') || rest.starts_with('T')) {
        return None;
    }
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(day, "%Y/%m/%d"))
        .ok()
}

/// Replace a text `column` with an Arrow `Date32` column. Nulls stay null;
/// any other unparseable value fails the whole table.
pub fn parse_date_column(table: &Table, column: &str) -> ValidationResult<Table> {
    let raw = table.strings(column)?;
    let mut b = Date32Builder::with_capacity(raw.len());
    for (row, value) in raw.iter().enumerate() {
        match value {
            None => b.append_null(),
            Some(s) => match parse_date(s) {
                Some(d) => b.append_value(Date32Type::from_naive_date(d)),
                None => {
                    return Err(ValidationError::parse(
                        table.name(),
                        format!("row {row}: cannot read {column} value {s:?} as a date"),
                    ))
                }
            },
        }
    }
    table.with_column(column, Arc::new(b.finish()) as ArrayRef)
}
