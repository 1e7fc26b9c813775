//! Running per-county totals.
//!
//! For every case row the cumulative count is the sum over all rows of the
//! same county dated on or before it, same-day rows included. Rows are grouped
//! on all six case fields, so exact duplicates come out once; each raw row
//! still contributes to the running sum exactly once.

use arrow::{
    array::{ArrayRef, Date32Array, Int64Array, StringArray},
    datatypes::Date32Type,
};
use chrono::NaiveDate;
use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::Arc,
};

use super::{
    cases::{CaseRecord, CASES, COUNTY, DATE, DEATHS, STATE},
    REGION_KEY,
};
use crate::{
    error::{ValidationError, ValidationResult},
    table::Table,
};

pub const CUMULATIVE_CASES: &str = "cumulative_cases";
pub const CUMULATIVE_DEATHS: &str = "cumulative_deaths";

/// A case row plus its running totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CumulativeRecord {
    pub date: NaiveDate,
    pub fips: String,
    pub county: String,
    pub state: String,
    pub cases: i64,
    pub deaths: i64,
    pub cumulative_cases: i64,
    pub cumulative_deaths: i64,
}

/// Output ordering and grouping key: (date, fips, county, state, cases, deaths).
type GroupKey = (NaiveDate, String, String, String, i64, i64);

fn group_key(r: &CaseRecord) -> GroupKey {
    (
        r.date,
        r.fips.clone(),
        r.county.clone(),
        r.state.clone(),
        r.cases,
        r.deaths,
    )
}

/// Duplicate rows found in a case table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DuplicateReport {
    /// Rows identical on all six fields to an earlier row.
    pub exact: usize,
    /// (date, fips) pairs carrying more than one distinct row.
    pub conflicting: usize,
}

impl DuplicateReport {
    pub fn is_clean(&self) -> bool {
        self.exact == 0 && self.conflicting == 0
    }
}

pub fn find_duplicates(records: &[CaseRecord]) -> DuplicateReport {
    let mut seen: HashSet<GroupKey> = HashSet::with_capacity(records.len());
    let mut per_day: HashMap<(NaiveDate, &str), usize> = HashMap::new();
    let mut exact = 0;

    for r in records {
        if seen.insert(group_key(r)) {
            *per_day.entry((r.date, r.fips.as_str())).or_default() += 1;
        } else {
            exact += 1;
        }
    }

    DuplicateReport {
        exact,
        conflicting: per_day.values().filter(|&&n| n > 1).count(),
    }
}

/// Cumulative totals for every distinct group, ordered by (date, fips) and
/// then the remaining group fields.
///
/// Records are bucketed by region and walked in date order keeping a running
/// sum, so the cost is a sort per region rather than a self-join. A total
/// that leaves the `i64` range fails with [`ValidationError::Overflow`].
pub fn cumulative_totals(records: &[CaseRecord]) -> ValidationResult<Vec<CumulativeRecord>> {
    let mut by_region: HashMap<&str, Vec<&CaseRecord>> = HashMap::new();
    for r in records {
        by_region.entry(r.fips.as_str()).or_default().push(r);
    }

    let mut groups: BTreeMap<GroupKey, (i64, i64)> = BTreeMap::new();
    for rows in by_region.values_mut() {
        rows.sort_by_key(|r| r.date);

        let (mut running_cases, mut running_deaths) = (0i64, 0i64);
        for day in rows.chunk_by(|a, b| a.date == b.date) {
            running_cases = accumulate(running_cases, day, CASES, |r| r.cases)?;
            running_deaths = accumulate(running_deaths, day, DEATHS, |r| r.deaths)?;
            for r in day {
                groups.insert(group_key(r), (running_cases, running_deaths));
            }
        }
    }

    Ok(groups
        .into_iter()
        .map(
            |((date, fips, county, state, cases, deaths), (cumulative_cases, cumulative_deaths))| {
                CumulativeRecord {
                    date,
                    fips,
                    county,
                    state,
                    cases,
                    deaths,
                    cumulative_cases,
                    cumulative_deaths,
                }
            },
        )
        .collect())
}

fn accumulate(
    total: i64,
    day: &[&CaseRecord],
    column: &str,
    value: fn(&CaseRecord) -> i64,
) -> ValidationResult<i64> {
    day.iter()
        .try_fold(total, |acc, r| acc.checked_add(value(r)))
        .ok_or_else(|| ValidationError::Overflow {
            column: column.to_string(),
            key: day[0].fips.clone(),
            date: day[0].date.to_string(),
        })
}

/// Columnar form of the aggregate, ready to join with population.
pub fn to_table(name: &str, records: &[CumulativeRecord]) -> ValidationResult<Table> {
    let dates: Date32Array = records
        .iter()
        .map(|r| Some(Date32Type::from_naive_date(r.date)))
        .collect();
    let fips: StringArray = records.iter().map(|r| Some(r.fips.as_str())).collect();
    let county: StringArray = records.iter().map(|r| Some(r.county.as_str())).collect();
    let state: StringArray = records.iter().map(|r| Some(r.state.as_str())).collect();
    let ints = |f: fn(&CumulativeRecord) -> i64| -> ArrayRef {
        Arc::new(Int64Array::from_iter_values(records.iter().map(f)))
    };

    Table::from_columns(
        name,
        vec![
            (DATE, Arc::new(dates) as ArrayRef),
            (REGION_KEY, Arc::new(fips)),
            (COUNTY, Arc::new(county)),
            (STATE, Arc::new(state)),
            (CASES, ints(|r| r.cases)),
            (DEATHS, ints(|r| r.deaths)),
            (CUMULATIVE_CASES, ints(|r| r.cumulative_cases)),
            (CUMULATIVE_DEATHS, ints(|r| r.cumulative_deaths)),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, d).unwrap()
    }

    fn rec(d: u32, fips: &str, cases: i64, deaths: i64) -> CaseRecord {
        CaseRecord {
            date: day(d),
            fips: fips.to_string(),
            county: format!("County {fips}"),
            state: "State".to_string(),
            cases,
            deaths,
        }
    }

    fn totals(out: &[CumulativeRecord]) -> Vec<(NaiveDate, &str, i64, i64)> {
        out.iter()
            .map(|r| (r.date, r.fips.as_str(), r.cumulative_cases, r.cumulative_deaths))
            .collect()
    }

    #[test]
    fn two_day_example() -> Result<()> {
        let out = cumulative_totals(&[rec(2, "00001", 3, 1), rec(1, "00001", 5, 0)])?;
        assert_eq!(
            totals(&out),
            vec![(day(1), "00001", 5, 0), (day(2), "00001", 8, 1)]
        );
        assert_eq!(out[1].cases, 3);
        assert_eq!(out[1].deaths, 1);
        Ok(())
    }

    #[test]
    fn regions_accumulate_independently_and_sort_by_date_then_key() -> Result<()> {
        let out = cumulative_totals(&[
            rec(1, "00002", 10, 1),
            rec(2, "00001", 1, 0),
            rec(1, "00001", 2, 0),
            rec(2, "00002", 5, 2),
        ])?;
        assert_eq!(
            totals(&out),
            vec![
                (day(1), "00001", 2, 0),
                (day(1), "00002", 10, 1),
                (day(2), "00001", 3, 0),
                (day(2), "00002", 15, 3),
            ]
        );
        Ok(())
    }

    #[test]
    fn same_day_rows_are_included() -> Result<()> {
        let mut second = rec(1, "00001", 4, 0);
        second.county = "Other".into();
        let out = cumulative_totals(&[rec(1, "00001", 1, 0), second, rec(2, "00001", 2, 0)])?;
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].cumulative_cases, 5);
        assert_eq!(out[1].cumulative_cases, 5);
        assert_eq!(out[2].cumulative_cases, 7);
        Ok(())
    }

    #[test]
    fn exact_duplicates_collapse_but_count_once_each() -> Result<()> {
        let out = cumulative_totals(&[
            rec(1, "00001", 2, 0),
            rec(1, "00001", 2, 0),
            rec(2, "00001", 1, 0),
        ])?;
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].cumulative_cases, 4);
        assert_eq!(out[1].cumulative_cases, 5);
        Ok(())
    }

    #[test]
    fn non_decreasing_per_region_and_deterministic() -> Result<()> {
        let mut input = Vec::new();
        for d in 1..=20u32 {
            for (i, fips) in ["00001", "00002", "00003"].iter().enumerate() {
                input.push(rec(d, fips, (d as i64 * 7 + i as i64) % 5, (d as i64) % 2));
            }
        }
        input.reverse();

        let first = cumulative_totals(&input)?;
        let second = cumulative_totals(&input)?;
        assert_eq!(first, second);

        let mut last: HashMap<&str, (i64, i64)> = HashMap::new();
        for r in &first {
            let prev = last.entry(r.fips.as_str()).or_insert((0, 0));
            assert!(r.cumulative_cases >= prev.0);
            assert!(r.cumulative_deaths >= prev.1);
            *prev = (r.cumulative_cases, r.cumulative_deaths);
        }
        Ok(())
    }

    #[test]
    fn overflowing_total_is_an_error() {
        let err = cumulative_totals(&[rec(1, "00001", i64::MAX, 0), rec(2, "00001", 1, 0)])
            .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::Overflow { ref column, ref key, ref date }
                if column == "cases" && key == "00001" && date == "2020-01-02"
        ));

        let err = cumulative_totals(&[rec(1, "00002", 0, i64::MAX), rec(1, "00002", 0, 1)])
            .unwrap_err();
        assert!(matches!(err, ValidationError::Overflow { ref column, .. } if column == "deaths"));
    }

    #[test]
    fn reports_duplicates() {
        let clean = find_duplicates(&[rec(1, "00001", 1, 0), rec(2, "00001", 1, 0)]);
        assert!(clean.is_clean());

        let report = find_duplicates(&[
            rec(1, "00001", 1, 0),
            rec(1, "00001", 1, 0),
            rec(1, "00002", 1, 0),
            rec(1, "00002", 3, 0),
        ]);
        assert_eq!(
            report,
            DuplicateReport {
                exact: 1,
                conflicting: 1
            }
        );
    }

    #[test]
    fn table_layout() -> Result<()> {
        let out = cumulative_totals(&[rec(1, "00001", 5, 0)])?;
        let t = to_table("cases", &out)?;
        assert_eq!(
            t.column_names(),
            vec![
                "date",
                "fips",
                "county",
                "state",
                "cases",
                "deaths",
                "cumulative_cases",
                "cumulative_deaths"
            ]
        );
        assert_eq!(t.integers(CUMULATIVE_CASES)?.value(0), 5);
        Ok(())
    }
}
