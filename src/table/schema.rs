// src/table/schema.rs

use arrow::datatypes::{DataType, Field as ArrowField, Schema as ArrowSchema};
use std::{collections::HashMap, sync::Arc};

use super::types::{ColumnSpec, ColumnType};

/// Map a declared column type into an Arrow DataType.
pub fn map_to_arrow_type(ty: ColumnType) -> DataType {
    match ty {
        ColumnType::Utf8 => DataType::Utf8,
        ColumnType::Int64 => DataType::Int64,
    }
}

/// Build an ArrowSchema over the file's `headers`, in file order.
///
/// Columns named in `expected` get their declared type; every other column is
/// read as text. All fields are nullable so empty cells load as nulls.
pub fn build_arrow_schema(headers: &[String], expected: &[ColumnSpec]) -> Arc<ArrowSchema> {
    let declared: HashMap<&str, ColumnType> =
        expected.iter().map(|c| (c.name.as_str(), c.ty)).collect();

    let fields: Vec<ArrowField> = headers
        .iter()
        .map(|name| {
            let dt = declared
                .get(name.as_str())
                .map(|ty| map_to_arrow_type(*ty))
                .unwrap_or(DataType::Utf8);
            ArrowField::new(name, dt, /* nullable = */ true)
        })
        .collect();

    Arc::new(ArrowSchema::new(fields))
}
