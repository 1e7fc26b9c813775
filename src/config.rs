use clap::ValueEnum;
use std::path::PathBuf;

use crate::fetch::DataSource;

/// County-level daily case and death counts.
pub const CASES_URL: &str =
    "https://raw.githubusercontent.com/nytimes/covid-19-data/master/us-counties.csv";

/// Census 2010-2019 county population estimates (ISO-8859-1 text).
pub const POPULATION_URL: &str =
    "https://www2.census.gov/programs-surveys/popest/datasets/2010-2019/counties/totals/co-est2019-alldata.csv";

pub const DEFAULT_OUTPUT: &str = "final_output.csv";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Csv,
    Parquet,
}

/// What to do when the case table holds duplicate county-day rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DuplicatePolicy {
    /// Log the counts and carry on.
    Warn,
    /// Abort before aggregation.
    Fail,
}

/// Everything one run needs. Passed to [`crate::pipeline::run`].
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub cases: DataSource,
    pub population: DataSource,
    pub output: PathBuf,
    pub format: OutputFormat,
    pub duplicates: DuplicatePolicy,
    /// Drop the census per-state total rows (`COUNTY == "000"`) before the
    /// overlap check.
    pub exclude_state_summaries: bool,
    /// Also write the distinct case-table keys to this CSV.
    pub key_inventory: Option<PathBuf>,
}

impl PipelineConfig {
    /// Case and population sources at `cases` / `population`, which may be
    /// URLs or paths. The population source is always read as ISO-8859-1.
    pub fn new(cases: &str, population: &str, output: impl Into<PathBuf>) -> Self {
        Self {
            cases: DataSource::from_location("cases", cases),
            population: DataSource::from_location("population", population)
                .with_encoding(encoding_rs::WINDOWS_1252),
            output: output.into(),
            format: OutputFormat::Csv,
            duplicates: DuplicatePolicy::Warn,
            exclude_state_summaries: true,
            key_inventory: None,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new(CASES_URL, POPULATION_URL, DEFAULT_OUTPUT)
    }
}
