use crate::error::ExtractError;
use crate::parameters::{DatasetKind, DATETIME_COLUMN};
use crate::time_line::parse_timestamp;
use anyhow::{Context, Result};
use gap_reconciler::{CountryMatrix, GapRecord, ResolutionRecord};
use polars::prelude::*;
use serde::Serialize;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

const OUTPUT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn country_file_name(country: &str, kind: DatasetKind) -> String {
    format!("{}_{}_MW.csv", country, kind)
}

/// Write a matrix as `{country}_{kind}_MW.csv`; absent cells are left empty.
pub fn write_country_matrix(matrix: &CountryMatrix, kind: DatasetKind, dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join(country_file_name(matrix.country(), kind));

    let times: Vec<String> = matrix
        .index()
        .iter()
        .map(|ts| ts.format(OUTPUT_TIMESTAMP_FORMAT).to_string())
        .collect();
    let mut series = vec![Series::new(DATETIME_COLUMN, times)];
    for (origin, values) in matrix.columns() {
        series.push(Series::new(origin, values.to_vec()));
    }
    let mut df = DataFrame::new(series)?;

    let mut file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    CsvWriter::new(&mut file)
        .has_header(true)
        .finish(&mut df)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

/// Read a file written by [`write_country_matrix`] back into a matrix.
pub fn read_country_matrix(path: &Path, country: &str) -> Result<CountryMatrix> {
    let df = CsvReader::from_path(path)
        .with_context(|| format!("opening {}", path.display()))?
        .has_header(true)
        .infer_schema(Some(0))
        .finish()
        .with_context(|| format!("parsing {}", path.display()))?;

    let times = df.column(DATETIME_COLUMN).map_err(|_| ExtractError::MissingColumn {
        path: path.to_path_buf(),
        column: DATETIME_COLUMN.to_string(),
    })?;
    let mut index = Vec::with_capacity(df.height());
    for text in times.utf8()?.into_iter() {
        let text = text.unwrap_or_default();
        let ts = parse_timestamp(text).ok_or_else(|| ExtractError::InvalidTimestamp {
            path: path.to_path_buf(),
            value: text.to_string(),
        })?;
        index.push(ts);
    }

    let mut matrix = CountryMatrix::new(country, index);
    for column in df.get_columns() {
        if column.name() == DATETIME_COLUMN {
            continue;
        }
        let values = column.cast(&DataType::Float32)?;
        matrix.insert_column(column.name(), values.f32()?.into_iter().collect());
    }
    Ok(matrix)
}

pub fn write_resolution_report(records: &[ResolutionRecord], kind: DatasetKind, dir: &Path) -> Result<PathBuf> {
    write_records(records, &dir.join(format!("resolution_{}.csv", kind)))
}

pub fn write_gap_report(records: &[GapRecord], kind: DatasetKind, dir: &Path) -> Result<PathBuf> {
    write_records(records, &dir.join(format!("gaps_{}.csv", kind)))
}

fn write_records<T: Serialize>(records: &[T], path: &Path) -> Result<PathBuf> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(path.to_path_buf())
}
