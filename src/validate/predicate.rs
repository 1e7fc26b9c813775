// src/validate/predicate.rs

use arrow::{
    array::{BooleanArray, Int64Array},
    compute::{
        is_not_null, is_null,
        kernels::cmp::{eq, gt, gt_eq, lt, lt_eq, neq},
    },
};
use std::fmt;

use crate::{
    error::ValidationResult,
    table::{Table, MERGE_INDICATOR},
};

/// Comparison operator of a [`Condition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl CompareOp {
    fn symbol(self) -> &'static str {
        match self {
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Eq => "==",
            Self::Ne => "!=",
        }
    }
}

/// `<column> <op> <threshold>` against an integer column, e.g. `< 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Condition {
    pub op: CompareOp,
    pub threshold: i64,
}

impl Condition {
    pub fn new(op: CompareOp, threshold: i64) -> Self {
        Self { op, threshold }
    }

    pub fn lt(threshold: i64) -> Self {
        Self::new(CompareOp::Lt, threshold)
    }

    pub fn gt(threshold: i64) -> Self {
        Self::new(CompareOp::Gt, threshold)
    }

    /// Row-wise result; null inputs give null, which filters treat as false.
    pub fn evaluate(&self, values: &Int64Array) -> ValidationResult<BooleanArray> {
        let rhs = Int64Array::new_scalar(self.threshold);
        let out = match self.op {
            CompareOp::Lt => lt(values, &rhs)?,
            CompareOp::Le => lt_eq(values, &rhs)?,
            CompareOp::Gt => gt(values, &rhs)?,
            CompareOp::Ge => gt_eq(values, &rhs)?,
            CompareOp::Eq => eq(values, &rhs)?,
            CompareOp::Ne => neq(values, &rhs)?,
        };
        Ok(out)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.op.symbol(), self.threshold)
    }
}

/// Boolean row filter over a (usually joined) table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowPredicate {
    IsNull(String),
    IsNotNull(String),
    Compare { column: String, condition: Condition },
    /// Rows a merge produced from the left side alone.
    LeftOnly,
    /// Rows a merge produced from the right side alone.
    RightOnly,
}

impl RowPredicate {
    pub fn is_null(column: impl Into<String>) -> Self {
        Self::IsNull(column.into())
    }

    pub fn compare(column: impl Into<String>, condition: Condition) -> Self {
        Self::Compare {
            column: column.into(),
            condition,
        }
    }

    /// Mask with one entry per row of `table`.
    pub fn evaluate(&self, table: &Table) -> ValidationResult<BooleanArray> {
        match self {
            Self::IsNull(column) => Ok(is_null(table.column(column)?.as_ref())?),
            Self::IsNotNull(column) => Ok(is_not_null(table.column(column)?.as_ref())?),
            Self::Compare { column, condition } => condition.evaluate(&table.integers(column)?),
            Self::LeftOnly => indicator_equals(table, "left_only"),
            Self::RightOnly => indicator_equals(table, "right_only"),
        }
    }
}

fn indicator_equals(table: &Table, side: &str) -> ValidationResult<BooleanArray> {
    let indicator = table.strings(MERGE_INDICATOR)?;
    Ok(indicator.iter().map(|v| Some(v == Some(side))).collect())
}
