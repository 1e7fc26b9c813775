// src/table/types.rs

use serde::{Deserialize, Serialize};

/// Logical type a loaded column is coerced to.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Copy, Eq, Hash)]
pub enum ColumnType {
    Utf8,
    Int64,
}

/// One expected column of a source: it must be present in the header row and
/// its cells must coerce to `ty`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Eq, Hash)]
pub struct ColumnSpec {
    pub name: String,
    pub ty: ColumnType,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    pub fn utf8(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Utf8)
    }

    pub fn int64(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Int64)
    }
}
