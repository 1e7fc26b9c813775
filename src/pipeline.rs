// src/pipeline.rs

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use std::{collections::BTreeSet, path::PathBuf};
use tracing::{info, warn};

use crate::{
    config::{DuplicatePolicy, PipelineConfig},
    error::ValidationError,
    output::{write_key_inventory, write_table},
    process::{
        cases::{case_columns, case_records, prepare_cases, CASES, DEATHS},
        cumulative::{cumulative_totals, find_duplicates, to_table},
        population::{population_columns, prepare_population, POPULATION},
        OUTPUT_COLUMNS, REGION_KEY,
    },
    table::{merge, JoinMode, Table},
    validate::{data_quality_check, ensure_mutual_overlap, open_csv, Condition},
};

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Case rows left after dropping rows without a key.
    pub case_rows: usize,
    pub population_rows: usize,
    pub output_rows: usize,
    pub output_path: PathBuf,
}

/// Load, validate, aggregate, join and write. Stops at the first failed
/// check; neither the key inventory nor the output is written unless every
/// check and the aggregation succeeded.
#[tracing::instrument(level = "info", skip_all, fields(output = %config.output.display()))]
pub fn run(config: &PipelineConfig) -> Result<RunSummary> {
    let client = Client::builder()
        .build()
        .context("building HTTP client")?;

    let cases = open_csv(&client, &config.cases, &case_columns())
        .with_context(|| format!("loading {}", config.cases.location))?;
    let cases = prepare_cases(&cases)?;

    let population = open_csv(&client, &config.population, &population_columns())
        .with_context(|| format!("loading {}", config.population.location))?;
    let population = prepare_population(&population, config.exclude_state_summaries)?;
    info!(
        cases = cases.num_rows(),
        population = population.num_rows(),
        "inputs loaded"
    );

    ensure_mutual_overlap(&cases, &population, REGION_KEY)?;

    let negative = Condition::lt(0);
    data_quality_check(&cases, CASES, &negative)?;
    data_quality_check(&cases, DEATHS, &negative)?;
    data_quality_check(&population, POPULATION, &negative)?;

    let records = case_records(&cases)?;
    let report = find_duplicates(&records);
    if !report.is_clean() {
        warn!(
            exact = report.exact,
            conflicting = report.conflicting,
            "duplicate case rows"
        );
        if config.duplicates == DuplicatePolicy::Fail {
            return Err(ValidationError::DuplicateRecords {
                table: cases.name().to_string(),
                exact: report.exact,
                conflicting: report.conflicting,
            }
            .into());
        }
    }

    let totals = to_table(cases.name(), &cumulative_totals(&records)?)?;
    let joined = merge(&totals, &population, REGION_KEY, JoinMode::Inner)?;
    let output = joined.select(&OUTPUT_COLUMNS)?;
    if output.is_empty() {
        warn!("no case rows survived the join");
    }

    if let Some(path) = &config.key_inventory {
        let keys = distinct_keys(&cases)?;
        write_key_inventory(&keys, path)?;
    }
    write_table(&output, &config.output, config.format)?;

    Ok(RunSummary {
        case_rows: cases.num_rows(),
        population_rows: population.num_rows(),
        output_rows: output.num_rows(),
        output_path: config.output.clone(),
    })
}

/// Sorted distinct keys of `table`, null and empty keys left out.
fn distinct_keys(table: &Table) -> Result<Vec<String>> {
    let keys: BTreeSet<String> = table
        .without_missing(REGION_KEY)?
        .strings(REGION_KEY)?
        .iter()
        .flatten()
        .map(str::to_string)
        .collect();
    Ok(keys.into_iter().collect())
}
