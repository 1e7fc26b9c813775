// src/table/mod.rs

pub mod join;
pub mod schema;
pub mod types;

pub use join::{merge, JoinMode, MERGE_INDICATOR};
pub use schema::build_arrow_schema;
pub use types::{ColumnSpec, ColumnType};

use arrow::{
    array::{Array, ArrayRef, AsArray, BooleanArray, Int64Array, StringArray},
    compute::{cast, cast_with_options, filter_record_batch, CastOptions},
    datatypes::{DataType, Field, Int64Type, Schema},
    record_batch::RecordBatch,
};
use std::sync::Arc;

use crate::error::{ValidationError, ValidationResult};

/// An in-memory, typed table: one Arrow batch plus the name used in
/// diagnostics ("cases", "population", ...).
///
/// Every transformation returns a new `Table`; nothing is mutated in place.
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    batch: RecordBatch,
}

impl Table {
    pub fn new(name: impl Into<String>, batch: RecordBatch) -> Self {
        Self {
            name: name.into(),
            batch,
        }
    }

    /// Assemble a table from named arrays. All fields are nullable.
    pub fn from_columns(
        name: impl Into<String>,
        columns: Vec<(&str, ArrayRef)>,
    ) -> ValidationResult<Self> {
        let fields: Vec<Field> = columns
            .iter()
            .map(|(n, a)| Field::new(*n, a.data_type().clone(), true))
            .collect();
        let arrays = columns.into_iter().map(|(_, a)| a).collect();
        let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?;
        Ok(Self::new(name, batch))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    pub fn column_names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.batch.column_by_name(column).is_some()
    }

    /// The named column, or a schema error naming this table.
    pub fn column(&self, column: &str) -> ValidationResult<&ArrayRef> {
        self.batch
            .column_by_name(column)
            .ok_or_else(|| ValidationError::schema(&self.name, column))
    }

    /// The named column viewed as text.
    pub fn strings(&self, column: &str) -> ValidationResult<StringArray> {
        let arr = cast(self.column(column)?.as_ref(), &DataType::Utf8)?;
        Ok(arr.as_string::<i32>().clone())
    }

    /// The named column viewed as 64-bit integers. Nulls stay null; text that
    /// is not a whole number fails with a parse error naming the column.
    pub fn integers(&self, column: &str) -> ValidationResult<Int64Array> {
        let options = CastOptions {
            safe: false,
            ..Default::default()
        };
        let arr = cast_with_options(self.column(column)?.as_ref(), &DataType::Int64, &options)
            .map_err(|e| ValidationError::parse(&self.name, format!("{column}: {e}")))?;
        Ok(arr.as_primitive::<Int64Type>().clone())
    }

    /// Keep the rows where `mask` is true; null counts as false.
    pub fn filter(&self, mask: &BooleanArray) -> ValidationResult<Self> {
        let batch = filter_record_batch(&self.batch, mask)?;
        Ok(Self::new(self.name.clone(), batch))
    }

    /// Drop rows whose `column` is null or empty text.
    pub fn without_missing(&self, column: &str) -> ValidationResult<Self> {
        let values = self.strings(column)?;
        let mask: BooleanArray = values
            .iter()
            .map(|v| Some(v.is_some_and(|s| !s.is_empty())))
            .collect();
        self.filter(&mask)
    }

    /// Replace `column` if present, otherwise append it.
    pub fn with_column(&self, column: &str, array: ArrayRef) -> ValidationResult<Self> {
        let schema = self.batch.schema();
        let mut fields: Vec<Field> = schema.fields().iter().map(|f| f.as_ref().clone()).collect();
        let mut arrays: Vec<ArrayRef> = self.batch.columns().to_vec();
        let field = Field::new(column, array.data_type().clone(), true);

        match schema.index_of(column) {
            Ok(idx) => {
                fields[idx] = field;
                arrays[idx] = array;
            }
            Err(_) => {
                fields.push(field);
                arrays.push(array);
            }
        }

        let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?;
        Ok(Self::new(self.name.clone(), batch))
    }

    /// Project to `(source, target)` columns, in that order, renaming as given.
    pub fn select(&self, columns: &[(&str, &str)]) -> ValidationResult<Self> {
        let mut out = Vec::with_capacity(columns.len());
        for (source, target) in columns {
            out.push((*target, Arc::clone(self.column(source)?)));
        }
        Self::from_columns(self.name.clone(), out)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use anyhow::Result;

    /// Text/integer table builder shared by the validator tests.
    pub(crate) fn table(
        name: &str,
        text: &[(&str, Vec<Option<&str>>)],
        ints: &[(&str, Vec<Option<i64>>)],
    ) -> Table {
        let mut cols: Vec<(&str, ArrayRef)> = Vec::new();
        for (n, v) in text {
            cols.push((*n, Arc::new(StringArray::from(v.clone())) as ArrayRef));
        }
        for (n, v) in ints {
            cols.push((*n, Arc::new(Int64Array::from(v.clone())) as ArrayRef));
        }
        Table::from_columns(name, cols).expect("columns have equal length")
    }

    #[test]
    fn missing_column_is_a_schema_error() {
        let t = table("cases", &[("fips", vec![Some("00001")])], &[]);
        let err = t.column("cases").unwrap_err();
        assert!(matches!(
            err,
            ValidationError::Schema { ref table, ref column } if table == "cases" && column == "cases"
        ));
    }

    #[test]
    fn without_missing_drops_null_and_empty_keys() -> Result<()> {
        let t = table(
            "cases",
            &[("fips", vec![Some("00001"), None, Some(""), Some("00002")])],
            &[("cases", vec![Some(1), Some(2), Some(3), Some(4)])],
        );
        let kept = t.without_missing("fips")?;
        assert_eq!(kept.num_rows(), 2);
        let cases = kept.integers("cases")?;
        assert_eq!(cases.values().to_vec(), vec![1, 4]);
        Ok(())
    }

    #[test]
    fn select_renames_and_reorders() -> Result<()> {
        let t = table(
            "population",
            &[("STATE", vec![Some("01")]), ("COUNTY", vec![Some("001")])],
            &[("POPESTIMATE2019", vec![Some(55869)])],
        );
        let p = t.select(&[("POPESTIMATE2019", "population"), ("STATE", "STATE")])?;
        assert_eq!(p.column_names(), vec!["population", "STATE"]);
        assert_eq!(p.integers("population")?.value(0), 55869);
        Ok(())
    }

    #[test]
    fn with_column_replaces_or_appends() -> Result<()> {
        let t = table("t", &[("a", vec![Some("x")])], &[]);
        let t = t.with_column("b", Arc::new(Int64Array::from(vec![7])))?;
        let t = t.with_column("a", Arc::new(StringArray::from(vec!["y"])))?;
        assert_eq!(t.column_names(), vec!["a", "b"]);
        assert_eq!(t.strings("a")?.value(0), "y");
        Ok(())
    }

    #[test]
    fn integers_from_text_column() -> Result<()> {
        let t = table("t", &[("n", vec![Some("12"), Some("-3"), None])], &[]);
        let n = t.integers("n")?;
        assert_eq!(n.value(0), 12);
        assert_eq!(n.value(1), -3);
        assert!(n.is_null(2));
        Ok(())
    }

    #[test]
    fn non_integer_text_is_a_parse_error() {
        let t = table("t", &[("n", vec![Some("12"), Some("-1.5")])], &[]);
        let err = t.integers("n").unwrap_err();
        assert!(matches!(
            err,
            ValidationError::Parse { ref table, ref message } if table == "t" && message.starts_with("n:")
        ));
    }
}
