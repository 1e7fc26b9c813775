// src/validate/overlap.rs

use std::collections::BTreeSet;
use tracing::{debug, error, info};

use super::predicate::RowPredicate;
use crate::{
    error::{ValidationError, ValidationResult},
    table::{merge, JoinMode, Table},
};

/// Join `a` with `b` on `key` and return the joined rows matching
/// `mismatch`. An empty result means no mismatch in that direction.
pub fn data_overlap(
    a: &Table,
    b: &Table,
    mode: JoinMode,
    key: &str,
    mismatch: &RowPredicate,
) -> ValidationResult<Table> {
    for t in [a, b] {
        if !t.has_column(key) {
            return Err(ValidationError::schema(t.name(), key));
        }
    }

    let joined = merge(a, b, key, mode)?;
    let mask = mismatch.evaluate(&joined)?;
    let mismatched = joined.filter(&mask)?;
    debug!(
        left = a.name(),
        right = b.name(),
        join = %mode,
        joined = joined.num_rows(),
        mismatched = mismatched.num_rows(),
        "overlap check"
    );
    Ok(mismatched)
}

/// Distinct keys of `a` that have no partner in `b`, sorted.
///
/// Rows with a null or empty key are dropped from both sides first, so the
/// result is exactly the set difference of the two key sets.
pub fn missing_keys(a: &Table, b: &Table, key: &str) -> ValidationResult<Vec<String>> {
    let a = a.without_missing(key)?;
    let b = b.without_missing(key)?;
    let unmatched = data_overlap(&a, &b, JoinMode::Left, key, &RowPredicate::LeftOnly)?;

    let keys: BTreeSet<String> = unmatched
        .strings(key)?
        .iter()
        .flatten()
        .map(str::to_string)
        .collect();
    Ok(keys.into_iter().collect())
}

/// Require the key sets of `a` and `b` to be identical, checking `a → b`
/// first and then `b → a`.
pub fn ensure_mutual_overlap(a: &Table, b: &Table, key: &str) -> ValidationResult<()> {
    for (left, right) in [(a, b), (b, a)] {
        let missing = missing_keys(left, right, key)?;
        if !missing.is_empty() {
            error!(
                left = left.name(),
                right = right.name(),
                unmatched = missing.len(),
                "some {} codes in {} are not in {}",
                key,
                left.name(),
                right.name()
            );
            return Err(ValidationError::ReferentialIntegrity {
                left: left.name().to_string(),
                right: right.name().to_string(),
                key: key.to_string(),
                missing,
            });
        }
    }
    info!("all {} codes are mutually inclusive", key);
    Ok(())
}
