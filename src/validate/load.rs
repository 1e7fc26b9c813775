// src/validate/load.rs

use arrow::{compute::concat_batches, csv::ReaderBuilder};
use reqwest::blocking::Client;
use std::io::Cursor;
use tracing::{debug, info};

use crate::{
    error::{ValidationError, ValidationResult},
    fetch::{self, DataSource},
    table::{build_arrow_schema, ColumnSpec, Table},
};

const BATCH_SIZE: usize = 8192;

/// Open a CSV source and load it as a typed [`Table`].
///
/// Checks, in order: the source exists, its name ends in `.csv`, and every
/// column of `expected` is present in the header row. Only then is the body
/// parsed, with each expected column coerced to its declared type and all
/// other columns kept as text.
#[tracing::instrument(level = "info", skip(client, expected), fields(table = %source.name, location = %source.location))]
pub fn open_csv(
    client: &Client,
    source: &DataSource,
    expected: &[ColumnSpec],
) -> ValidationResult<Table> {
    fetch::probe(client, source)?;
    ensure_csv(source)?;

    let bytes = fetch::read_bytes(client, source)?;
    let text = decode(&bytes, source)?;

    let headers = read_headers(&text, &source.name)?;
    if let Some(missing) = expected.iter().find(|c| !headers.contains(&c.name)) {
        return Err(ValidationError::schema(&source.name, &missing.name));
    }
    debug!(columns = headers.len(), "header check passed");

    let schema = build_arrow_schema(&headers, expected);
    let reader = ReaderBuilder::new(schema.clone())
        .with_header(true)
        .with_batch_size(BATCH_SIZE)
        .build(Cursor::new(text.as_bytes()))
        .map_err(|e| ValidationError::parse(&source.name, e.to_string()))?;
    let batches = reader
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ValidationError::parse(&source.name, e.to_string()))?;
    let batch = concat_batches(&schema, &batches)?;

    info!(rows = batch.num_rows(), "loaded");
    Ok(Table::new(source.name.clone(), batch))
}

fn ensure_csv(source: &DataSource) -> ValidationResult<()> {
    let is_csv = source
        .file_name()
        .and_then(|n| n.rsplit_once('.').map(|(_, ext)| ext.eq_ignore_ascii_case("csv")))
        .unwrap_or(false);
    if is_csv {
        Ok(())
    } else {
        Err(ValidationError::Format {
            location: source.location.clone(),
        })
    }
}

/// Bytes to text: UTF-8 (leading BOM dropped) unless the source names a legacy encoding.
fn decode(bytes: &[u8], source: &DataSource) -> ValidationResult<String> {
    match source.encoding {
        Some(encoding) => {
            let (text, used, had_errors) = encoding.decode(bytes);
            if had_errors {
                debug!(encoding = used.name(), "replacement characters in decoded text");
            }
            Ok(text.into_owned())
        }
        None => {
            let text = std::str::from_utf8(bytes).map_err(|e| {
                ValidationError::parse(&source.name, format!("invalid UTF-8: {e}"))
            })?;
            Ok(text.strip_prefix('\u{feff}').unwrap_or(text).to_string())
        }
    }
}

/// Header row only, read ahead of the typed parse.
fn read_headers(text: &str, table: &str) -> ValidationResult<Vec<String>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());
    let headers = rdr
        .headers()
        .map_err(|e| ValidationError::parse(table, format!("reading header row: {e}")))?;
    Ok(headers.iter().map(|h| h.trim().to_string()).collect())
}
