//! Load-and-check primitives: typed CSV loading, referential overlap between
//! two keyed tables, and column predicates.

pub mod load;
pub mod overlap;
pub mod predicate;
pub mod quality;

pub use crate::table::JoinMode;
pub use load::open_csv;
pub use overlap::{data_overlap, ensure_mutual_overlap, missing_keys};
pub use predicate::{CompareOp, Condition, RowPredicate};
pub use quality::data_quality_check;
