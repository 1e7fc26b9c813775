use arrow::array::{ArrayRef, BooleanArray, StringArray};
use std::sync::Arc;
use tracing::info;

use super::REGION_KEY;
use crate::{
    error::ValidationResult,
    table::{ColumnSpec, Table},
};

pub const STATE_CODE: &str = "STATE";
pub const COUNTY_CODE: &str = "COUNTY";
pub const COUNTY_NAME: &str = "CTYNAME";
pub const ESTIMATE: &str = "POPESTIMATE2019";
pub const POPULATION: &str = "population";

/// County code the census file uses for its per-state total rows.
pub const STATE_SUMMARY_COUNTY: &str = "000";

/// Columns the population file must carry, with their load types.
pub fn population_columns() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec::utf8(STATE_CODE),
        ColumnSpec::utf8(COUNTY_CODE),
        ColumnSpec::utf8(COUNTY_NAME),
        ColumnSpec::int64(ESTIMATE),
    ]
}

/// Add `fips = STATE ++ COUNTY`. Both codes arrive zero padded; a null in
/// either gives a null key.
pub fn derive_region_key(table: &Table) -> ValidationResult<Table> {
    let state = table.strings(STATE_CODE)?;
    let county = table.strings(COUNTY_CODE)?;
    let fips: StringArray = state
        .iter()
        .zip(county.iter())
        .map(|(s, c)| match (s, c) {
            (Some(s), Some(c)) => Some(format!("{s}{c}")),
            _ => None,
        })
        .collect();
    table.with_column(REGION_KEY, Arc::new(fips) as ArrayRef)
}

/// Drop the per-state total rows (`COUNTY == "000"`).
pub fn exclude_state_summaries(table: &Table) -> ValidationResult<Table> {
    let county = table.strings(COUNTY_CODE)?;
    let mask: BooleanArray = county
        .iter()
        .map(|c| Some(c != Some(STATE_SUMMARY_COUNTY)))
        .collect();
    let kept = table.filter(&mask)?;
    info!(
        dropped = table.num_rows() - kept.num_rows(),
        "excluded state summary rows"
    );
    Ok(kept)
}

/// Keep the columns the join needs, renaming the estimate to `population`.
pub fn project_population(table: &Table) -> ValidationResult<Table> {
    table.select(&[
        (STATE_CODE, STATE_CODE),
        (COUNTY_NAME, COUNTY_NAME),
        (COUNTY_CODE, COUNTY_CODE),
        (REGION_KEY, REGION_KEY),
        (ESTIMATE, POPULATION),
    ])
}

/// Everything between load and validation for the population table.
pub fn prepare_population(table: &Table, drop_state_summaries: bool) -> ValidationResult<Table> {
    let table = if drop_state_summaries {
        exclude_state_summaries(table)?
    } else {
        table.clone()
    };
    let keyed = derive_region_key(&table)?;
    project_population(&keyed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::tests::table;
    use anyhow::Result;

    fn raw_population() -> Table {
        table(
            "population",
            &[
                ("SUMLEV", vec![Some("040"), Some("050"), Some("050")]),
                ("STATE", vec![Some("01"), Some("01"), Some("01")]),
                ("COUNTY", vec![Some("000"), Some("001"), Some("003")]),
                (
                    "CTYNAME",
                    vec![Some("Alabama"), Some("Autauga County"), Some("Baldwin County")],
                ),
            ],
            &[(
                "POPESTIMATE2019",
                vec![Some(4903185), Some(55869), Some(223234)],
            )],
        )
    }

    #[test]
    fn derives_key_from_codes() -> Result<()> {
        let keyed = derive_region_key(&raw_population())?;
        let fips = keyed.strings("fips")?;
        assert_eq!(fips.value(0), "01000");
        assert_eq!(fips.value(1), "01001");
        Ok(())
    }

    #[test]
    fn projection_matches_join_layout() -> Result<()> {
        let prepared = prepare_population(&raw_population(), true)?;
        assert_eq!(
            prepared.column_names(),
            vec!["STATE", "CTYNAME", "COUNTY", "fips", "population"]
        );
        assert_eq!(prepared.num_rows(), 2);
        assert_eq!(prepared.integers("population")?.value(1), 223234);
        Ok(())
    }

    #[test]
    fn state_summaries_kept_on_request() -> Result<()> {
        let prepared = prepare_population(&raw_population(), false)?;
        assert_eq!(prepared.num_rows(), 3);
        assert_eq!(prepared.strings("fips")?.value(0), "01000");
        Ok(())
    }
}
