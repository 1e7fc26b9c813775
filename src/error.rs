// src/error.rs

use std::path::PathBuf;

use arrow::error::ArrowError;
use thiserror::Error;

pub type ValidationResult<T, E = ValidationError> = Result<T, E>;

/// Every failure the loaders, validators and transforms can raise.
///
/// None of these are recovered inside a run; the driver aborts on the first one
/// and `main` maps it to a process exit status via [`ValidationError::exit_code`].
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("source not found: {location}")]
    NotFound { location: String },

    #[error("input given is not csv: {location}")]
    Format { location: String },

    #[error("column `{column}` not found in {table}")]
    Schema { table: String, column: String },

    #[error("unsupported join type `{0}`; expected one of: inner, left, right, outer")]
    UnsupportedJoin(String),

    #[error("invalid value found in {table}: {violations} row(s) where {column} {condition}")]
    DataQuality {
        table: String,
        column: String,
        condition: String,
        violations: usize,
    },

    #[error(
        "some {key} codes in {left} are missing from {right}: {} unmatched ({})",
        .missing.len(),
        preview(.missing)
    )]
    ReferentialIntegrity {
        left: String,
        right: String,
        key: String,
        missing: Vec<String>,
    },

    #[error("{table} has duplicate rows: {exact} exact copies, {conflicting} (date, fips) pairs with conflicting counts")]
    DuplicateRecords {
        table: String,
        exact: usize,
        conflicting: usize,
    },

    #[error("running {column} total for {key} on {date} overflows a 64-bit integer")]
    Overflow {
        column: String,
        key: String,
        date: String,
    },

    #[error("failed to parse {table}: {message}")]
    Parse { table: String, message: String },

    #[error("request to {location} failed: {source}")]
    Fetch {
        location: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Arrow(#[from] ArrowError),
}

/// Exit status when the failure is not one of ours.
pub const EXIT_OTHER: u8 = 10;

impl ValidationError {
    pub fn schema(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::Schema {
            table: table.into(),
            column: column.into(),
        }
    }

    pub fn parse(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            table: table.into(),
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Process exit status for this failure. Referential mismatches keep the
    /// historical status 1; everything else gets its own code.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::ReferentialIntegrity { .. } => 1,
            Self::NotFound { .. } => 2,
            Self::Format { .. } => 3,
            Self::Schema { .. } => 4,
            Self::UnsupportedJoin(_) => 5,
            Self::DataQuality { .. } | Self::Overflow { .. } => 6,
            Self::DuplicateRecords { .. } => 7,
            Self::Parse { .. } | Self::Arrow(_) => 8,
            Self::Fetch { .. } => 9,
            Self::Io { .. } => EXIT_OTHER,
        }
    }
}

/// Walk an `anyhow` chain and pick the exit status of the first
/// [`ValidationError`] in it.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|e| e.downcast_ref::<ValidationError>())
        .map(ValidationError::exit_code)
        .unwrap_or(EXIT_OTHER)
}

fn preview(keys: &[String]) -> String {
    const SHOWN: usize = 5;
    let mut out = keys
        .iter()
        .take(SHOWN)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if keys.len() > SHOWN {
        out.push_str(", ...");
    }
    out
}
