use clap::Parser;
use countyjoin::{
    config::{
        DuplicatePolicy, OutputFormat, PipelineConfig, CASES_URL, DEFAULT_OUTPUT, POPULATION_URL,
    },
    error::exit_code,
    run,
};
use std::{path::PathBuf, process::ExitCode};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

/// Validate county case counts against census population and write per-county
/// running totals joined with population.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Case CSV: URL or local path
    #[arg(long, default_value = CASES_URL)]
    cases: String,

    /// Population CSV (ISO-8859-1): URL or local path
    #[arg(long, default_value = POPULATION_URL)]
    population: String,

    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    format: OutputFormat,

    /// How to treat duplicate county-day rows
    #[arg(long, value_enum, default_value_t = DuplicatePolicy::Warn)]
    duplicates: DuplicatePolicy,

    /// Keep census per-state total rows (COUNTY 000)
    #[arg(long)]
    keep_state_summaries: bool,

    /// Also write the distinct case fips codes to this CSV
    #[arg(long)]
    key_inventory: Option<PathBuf>,
}

impl From<Args> for PipelineConfig {
    fn from(args: Args) -> Self {
        let mut config = PipelineConfig::new(&args.cases, &args.population, args.output);
        config.format = args.format;
        config.duplicates = args.duplicates;
        config.exclude_state_summaries = !args.keep_state_summaries;
        config.key_inventory = args.key_inventory;
        config
    }
}

fn main() -> ExitCode {
    let env = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,countyjoin=info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();

    let config = PipelineConfig::from(Args::parse());
    info!(
        cases = %config.cases.location,
        population = %config.population.location,
        "startup"
    );

    match run(&config) {
        Ok(summary) => {
            info!(
                rows = summary.output_rows,
                path = %summary.output_path.display(),
                "done"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{:#}", err);
            ExitCode::from(exit_code(&err))
        }
    }
}
