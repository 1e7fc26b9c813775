// src/output.rs

use anyhow::{Context, Result};
use arrow::csv::WriterBuilder;
use parquet::{arrow::ArrowWriter, basic::Compression, file::properties::WriterProperties};
use serde::Serialize;
use std::{
    fs::{self, File},
    io::BufWriter,
    path::Path,
};
use tracing::info;

use crate::{config::OutputFormat, table::Table};

/// Write `table` to `path` in the requested format, creating parent
/// directories as needed.
pub fn write_table(table: &Table, path: &Path, format: OutputFormat) -> Result<()> {
    ensure_parent(path)?;
    match format {
        OutputFormat::Csv => write_csv(table, path),
        OutputFormat::Parquet => write_parquet(table, path),
    }?;
    info!(rows = table.num_rows(), path = %path.display(), ?format, "wrote output");
    Ok(())
}

fn write_csv(table: &Table, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = WriterBuilder::new()
        .with_header(true)
        .with_date_format("%Y-%m-%d".to_string())
        .build(BufWriter::new(file));
    writer
        .write(table.batch())
        .with_context(|| format!("writing csv to {}", path.display()))?;
    Ok(())
}

fn write_parquet(table: &Table, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(file, table.batch().schema(), Some(props))
        .context("creating Arrow writer for output")?;
    writer.write(table.batch()).context("writing output batch")?;
    writer.close().context("closing output writer")?;
    Ok(())
}

#[derive(Serialize)]
struct KeyRow<'a> {
    fips: &'a str,
}

/// One-column CSV of the given keys, header `fips`.
pub fn write_key_inventory(keys: &[String], path: &Path) -> Result<()> {
    ensure_parent(path)?;
    let mut wtr =
        csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    for key in keys {
        wtr.serialize(KeyRow { fips: key })?;
    }
    wtr.flush()?;
    info!(keys = keys.len(), path = %path.display(), "wrote key inventory");
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory {}", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::{
        array::{ArrayRef, Date32Array, Int64Array, StringArray},
        datatypes::Date32Type,
    };
    use chrono::NaiveDate;
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn sample() -> Table {
        let d = Date32Type::from_naive_date(NaiveDate::from_ymd_opt(2020, 1, 2).unwrap());
        Table::from_columns(
            "out",
            vec![
                ("date", Arc::new(Date32Array::from(vec![d])) as ArrayRef),
                ("county", Arc::new(StringArray::from(vec!["Doña Ana, NM"]))),
                ("fips", Arc::new(StringArray::from(vec!["35013"]))),
                ("cases", Arc::new(Int64Array::from(vec![3]))),
            ],
        )
        .unwrap()
    }

    #[test]
    fn csv_has_header_iso_dates_and_quoting() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join("out.csv");
        write_table(&sample(), &path, OutputFormat::Csv)?;
        let text = fs::read_to_string(&path)?;
        assert_eq!(
            text,
            "date,county,fips,cases\n2020-01-02,\"Doña Ana, NM\",35013,3\n"
        );
        Ok(())
    }

    #[test]
    fn parquet_round_trips() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("out.parquet");
        write_table(&sample(), &path, OutputFormat::Parquet)?;

        let mut reader = ParquetRecordBatchReaderBuilder::try_new(File::open(&path)?)?.build()?;
        let batch = reader.next().transpose()?.expect("one batch");
        assert_eq!(batch.num_rows(), 1);
        assert_eq!(batch.schema().fields(), sample().batch().schema().fields());
        Ok(())
    }

    #[test]
    fn key_inventory_lists_keys() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("keys.csv");
        write_key_inventory(&["01001".to_string(), "01003".to_string()], &path)?;
        assert_eq!(fs::read_to_string(&path)?, "fips\n01001\n01003\n");
        Ok(())
    }
}
