// src/table/join.rs

use arrow::{
    array::{Array, ArrayRef, StringArray, UInt32Array},
    compute::take,
};
use std::{collections::HashMap, collections::HashSet, fmt, str::FromStr, sync::Arc};

use super::Table;
use crate::error::{ValidationError, ValidationResult};

/// Name of the column `merge` appends to say which side(s) each row came
/// from: `both`, `left_only` or `right_only`.
pub const MERGE_INDICATOR: &str = "_merge";

/// Relational join semantics for [`merge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinMode {
    Inner,
    Left,
    Right,
    Outer,
}

impl FromStr for JoinMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INNER" => Ok(Self::Inner),
            "LEFT" => Ok(Self::Left),
            "RIGHT" => Ok(Self::Right),
            "OUTER" => Ok(Self::Outer),
            _ => Err(ValidationError::UnsupportedJoin(s.to_string())),
        }
    }
}

impl fmt::Display for JoinMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Inner => "inner",
            Self::Left => "left",
            Self::Right => "right",
            Self::Outer => "outer",
        };
        f.write_str(s)
    }
}

/// Join `left` and `right` on the text value of `key`.
///
/// Output layout: the left columns in order (with `key` coalesced from both
/// sides), then the right columns except `key`, then [`MERGE_INDICATOR`].
/// Non-key names present on both sides get `_x` / `_y` suffixes. Columns from
/// the side that did not match are null.
///
/// Row order follows the left table for inner/left joins and the right table
/// for right joins; outer joins list left-driven rows first, then unmatched
/// right rows in right order. Null keys never match anything.
pub fn merge(left: &Table, right: &Table, key: &str, mode: JoinMode) -> ValidationResult<Table> {
    let left_keys = left.strings(key)?;
    let right_keys = right.strings(key)?;

    let pairs = match mode {
        JoinMode::Right => {
            let left_index = index_keys(&left_keys);
            let mut pairs = Vec::with_capacity(right_keys.len());
            for j in 0..right_keys.len() {
                match key_at(&right_keys, j).and_then(|k| left_index.get(k)) {
                    Some(rows) => pairs.extend(rows.iter().map(|&i| (Some(i), Some(j as u32)))),
                    None => pairs.push((None, Some(j as u32))),
                }
            }
            pairs
        }
        JoinMode::Inner | JoinMode::Left | JoinMode::Outer => {
            let right_index = index_keys(&right_keys);
            let mut matched_right = vec![false; right_keys.len()];
            let mut pairs = Vec::with_capacity(left_keys.len());
            for i in 0..left_keys.len() {
                match key_at(&left_keys, i).and_then(|k| right_index.get(k)) {
                    Some(rows) => {
                        for &j in rows {
                            matched_right[j as usize] = true;
                            pairs.push((Some(i as u32), Some(j)));
                        }
                    }
                    None if mode != JoinMode::Inner => pairs.push((Some(i as u32), None)),
                    None => {}
                }
            }
            if mode == JoinMode::Outer {
                pairs.extend(
                    matched_right
                        .iter()
                        .enumerate()
                        .filter(|(_, m)| !**m)
                        .map(|(j, _)| (None, Some(j as u32))),
                );
            }
            pairs
        }
    };

    let left_take: UInt32Array = pairs.iter().map(|(l, _)| *l).collect();
    let right_take: UInt32Array = pairs.iter().map(|(_, r)| *r).collect();
    let merged_keys: StringArray = pairs
        .iter()
        .map(|(l, r)| {
            l.and_then(|i| key_at(&left_keys, i as usize))
                .or_else(|| r.and_then(|j| key_at(&right_keys, j as usize)))
        })
        .collect();
    let indicator: StringArray = pairs
        .iter()
        .map(|(l, r)| {
            Some(match (l, r) {
                (Some(_), Some(_)) => "both",
                (Some(_), None) => "left_only",
                _ => "right_only",
            })
        })
        .collect();

    let left_names: HashSet<String> = left.column_names().into_iter().collect();
    let right_names: HashSet<String> = right.column_names().into_iter().collect();

    let mut columns: Vec<(String, ArrayRef)> = Vec::new();
    for name in left.column_names() {
        if name == key {
            columns.push((name, Arc::new(merged_keys.clone())));
            continue;
        }
        let taken = take(left.column(&name)?.as_ref(), &left_take, None)?;
        let out_name = if right_names.contains(&name) {
            format!("{name}_x")
        } else {
            name
        };
        columns.push((out_name, taken));
    }
    for name in right.column_names() {
        if name == key {
            continue;
        }
        let taken = take(right.column(&name)?.as_ref(), &right_take, None)?;
        let out_name = if left_names.contains(&name) {
            format!("{name}_y")
        } else {
            name
        };
        columns.push((out_name, taken));
    }
    columns.push((MERGE_INDICATOR.to_string(), Arc::new(indicator)));

    Table::from_columns(
        format!("{}+{}", left.name(), right.name()),
        columns.iter().map(|(n, a)| (n.as_str(), Arc::clone(a))).collect(),
    )
}

fn key_at(keys: &StringArray, idx: usize) -> Option<&str> {
    keys.is_valid(idx).then(|| keys.value(idx))
}

fn index_keys(keys: &StringArray) -> HashMap<&str, Vec<u32>> {
    let mut index: HashMap<&str, Vec<u32>> = HashMap::new();
    for (row, key) in keys.iter().enumerate() {
        if let Some(key) = key {
            index.entry(key).or_default().push(row as u32);
        }
    }
    index
}
