use arrow::{
    array::{Array, AsArray, StringArray},
    datatypes::Date32Type,
};
use chrono::NaiveDate;
use tracing::info;

use super::{dates::parse_date_column, REGION_KEY};
use crate::{
    error::{ValidationError, ValidationResult},
    table::{ColumnSpec, Table},
};

pub const DATE: &str = "date";
pub const COUNTY: &str = "county";
pub const STATE: &str = "state";
pub const CASES: &str = "cases";
pub const DEATHS: &str = "deaths";

/// Columns the case file must carry, with their load types.
pub fn case_columns() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec::utf8(REGION_KEY),
        ColumnSpec::int64(CASES),
        ColumnSpec::int64(DEATHS),
    ]
}

/// One county-day row of the case file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseRecord {
    pub date: NaiveDate,
    pub fips: String,
    pub county: String,
    pub state: String,
    pub cases: i64,
    pub deaths: i64,
}

/// Parse the date column and drop rows without a region key.
pub fn prepare_cases(table: &Table) -> ValidationResult<Table> {
    let dated = parse_date_column(table, DATE)?;
    let keyed = dated.without_missing(REGION_KEY)?;
    info!(
        rows = keyed.num_rows(),
        dropped = table.num_rows() - keyed.num_rows(),
        "case rows with a {}",
        REGION_KEY
    );
    Ok(keyed)
}

/// Typed rows of a prepared case table. Date, key and counts must be present
/// on every row; county and state may be empty.
pub fn case_records(table: &Table) -> ValidationResult<Vec<CaseRecord>> {
    let dates = table.column(DATE)?;
    let dates = dates.as_primitive_opt::<Date32Type>().ok_or_else(|| {
        ValidationError::parse(table.name(), format!("{DATE} column is not a date"))
    })?;
    let fips = table.strings(REGION_KEY)?;
    let county = table.strings(COUNTY)?;
    let state = table.strings(STATE)?;
    let cases = table.integers(CASES)?;
    let deaths = table.integers(DEATHS)?;

    let missing = |row: usize, column: &str| {
        ValidationError::parse(table.name(), format!("row {row}: missing {column}"))
    };

    let mut out = Vec::with_capacity(table.num_rows());
    for row in 0..table.num_rows() {
        if dates.is_null(row) {
            return Err(missing(row, DATE));
        }
        if fips.is_null(row) {
            return Err(missing(row, REGION_KEY));
        }
        if cases.is_null(row) {
            return Err(missing(row, CASES));
        }
        if deaths.is_null(row) {
            return Err(missing(row, DEATHS));
        }
        out.push(CaseRecord {
            date: Date32Type::to_naive_date(dates.value(row)),
            fips: fips.value(row).to_string(),
            county: text_at(&county, row),
            state: text_at(&state, row),
            cases: cases.value(row),
            deaths: deaths.value(row),
        });
    }
    Ok(out)
}

fn text_at(values: &StringArray, row: usize) -> String {
    if values.is_null(row) {
        String::new()
    } else {
        values.value(row).to_string()
    }
}
