use crate::error::ExtractError;
use crate::models::{RawRecord, RecordTable};
use crate::parameters::DatasetKind;
use crate::progress::ProgressSink;
use crate::time_line::TimeLine;
use anyhow::Result;
use chrono::NaiveDateTime;
use gap_reconciler::CountryMatrix;
use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet};

/// Per-country matrices of one batch, with the batch-wide column set and timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Reshaped {
    pub matrices: BTreeMap<String, CountryMatrix>,
    /// Every origin seen in the batch, sorted.
    pub universe: Vec<String>,
    pub time_line: TimeLine,
}

/// Pivot a record table into one origin x time matrix per requested country.
///
/// Takes the table by value; it is dropped once pivoted.
pub fn reshape(
    table: RecordTable,
    countries: &[String],
    kind: DatasetKind,
    progress: Option<&dyn ProgressSink>,
) -> Result<Reshaped> {
    if !kind.is_pivotable() {
        return Err(ExtractError::NotPivotable {
            kind: kind.to_string(),
        }
        .into());
    }

    let records = table.into_records();
    let universe: Vec<String> = records
        .iter()
        .map(|r| r.origin.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let time_line = TimeLine::from_timestamps(records.iter().map(|r| r.timestamp));
    info!(
        "{}: {} origins over {} quarter hours",
        kind,
        universe.len(),
        time_line.len()
    );

    let mut by_country: BTreeMap<&str, Vec<RawRecord>> =
        countries.iter().map(|c| (c.as_str(), Vec::new())).collect();
    for record in records {
        if let Some(rows) = by_country.get_mut(record.destination.as_str()) {
            rows.push(record);
        }
    }

    let total = by_country.len();
    let mut matrices = BTreeMap::new();
    for (i, (country, rows)) in by_country.into_iter().enumerate() {
        if let Some(progress) = progress {
            progress.set_sub_label(country);
            progress.progress(i, total);
        }
        debug!("{}: pivoting {} rows", country, rows.len());
        matrices.insert(country.to_string(), pivot_country(country, rows)?);
    }
    if let Some(progress) = progress {
        progress.reset_sub_label();
    }

    Ok(Reshaped {
        matrices,
        universe,
        time_line,
    })
}

fn pivot_country(country: &str, mut rows: Vec<RawRecord>) -> Result<CountryMatrix> {
    // timestamp leads the key, so this also sorts by time
    rows.sort_by(|a, b| a.dedup_key().cmp(&b.dedup_key()));
    rows.dedup_by(|a, b| a.dedup_key() == b.dedup_key());

    if let Some(pair) = rows
        .windows(2)
        .find(|pair| pair[0].timestamp == pair[1].timestamp && pair[0].origin == pair[1].origin)
    {
        return Err(ExtractError::DuplicateEntry {
            country: country.to_string(),
            origin: pair[0].origin.clone(),
            timestamp: pair[0].timestamp,
        }
        .into());
    }

    let mut columns: BTreeMap<String, Vec<(NaiveDateTime, Option<f32>)>> = BTreeMap::new();
    for row in rows {
        columns
            .entry(row.origin)
            .or_default()
            .push((row.timestamp, row.value));
    }
    Ok(CountryMatrix::from_columns(country, columns))
}
