use crate::gaps::GapClass;
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One country's time x origin matrix.
///
/// The index is strictly increasing and every column has exactly one cell per
/// index entry. `None` marks a missing (absent) cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CountryMatrix {
    country: String,
    index: Vec<NaiveDateTime>,
    columns: BTreeMap<String, Vec<Option<f32>>>,
}

impl CountryMatrix {
    /// Create a matrix without columns over a sorted, deduplicated index.
    pub fn new(country: impl Into<String>, index: Vec<NaiveDateTime>) -> Self {
        debug_assert!(index.windows(2).all(|w| w[0] < w[1]));
        Self {
            country: country.into(),
            index,
            columns: BTreeMap::new(),
        }
    }

    /// Build a matrix whose index is the union of every column's timestamps.
    pub fn from_columns(
        country: impl Into<String>,
        columns: BTreeMap<String, Vec<(NaiveDateTime, Option<f32>)>>,
    ) -> Self {
        let index: Vec<NaiveDateTime> = columns
            .values()
            .flat_map(|points| points.iter().map(|(ts, _)| *ts))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut matrix = Self::new(country, index);
        for (origin, points) in columns {
            let mut values = vec![None; matrix.index.len()];
            for (ts, value) in points {
                if let Ok(row) = matrix.index.binary_search(&ts) {
                    values[row] = value;
                }
            }
            matrix.columns.insert(origin, values);
        }
        matrix
    }

    /// Insert or replace a column. Values are padded or truncated to the index length.
    pub fn insert_column(&mut self, origin: impl Into<String>, mut values: Vec<Option<f32>>) {
        values.resize(self.index.len(), None);
        self.columns.insert(origin.into(), values);
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn index(&self) -> &[NaiveDateTime] {
        &self.index
    }

    pub fn column(&self, origin: &str) -> Option<&[Option<f32>]> {
        self.columns.get(origin).map(|values| values.as_slice())
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(|name| name.as_str())
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &[Option<f32>])> {
        self.columns
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// Value at a timestamp, `None` when the cell is absent or the timestamp is not indexed.
    pub fn get(&self, timestamp: NaiveDateTime, origin: &str) -> Option<f32> {
        let row = self.index.binary_search(&timestamp).ok()?;
        self.columns.get(origin)?.get(row).copied().flatten()
    }

    /// Present cells of one column, in time order.
    pub fn present(&self, origin: &str) -> Vec<(NaiveDateTime, f32)> {
        match self.columns.get(origin) {
            Some(values) => self
                .index
                .iter()
                .zip(values)
                .filter_map(|(ts, value)| value.map(|v| (*ts, v)))
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn height(&self) -> usize {
        self.index.len()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty() || self.columns.is_empty()
    }

    pub fn missing_cells(&self) -> usize {
        self.columns
            .values()
            .map(|values| values.iter().filter(|v| v.is_none()).count())
            .sum()
    }
}

/// A column re-expressed on its own regular sampling grid.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeSeries {
    pub start: NaiveDateTime,
    pub step: Duration,
    pub values: Vec<Option<f32>>,
}

impl NativeSeries {
    /// Lay sorted present points onto a grid starting at the first point.
    ///
    /// Returns `None` for an empty input. The second element counts points that
    /// do not fall on the grid and were dropped.
    pub fn from_points(points: &[(NaiveDateTime, f32)], step: Duration) -> Option<(Self, usize)> {
        let (first, _) = *points.first()?;
        let (last, _) = *points.last()?;
        let step_secs = step.num_seconds().max(1);
        let len = ((last - first).num_seconds() / step_secs) as usize + 1;

        let mut values = vec![None; len];
        let mut off_grid = 0;
        for (ts, value) in points {
            let offset = (*ts - first).num_seconds();
            if offset % step_secs != 0 {
                off_grid += 1;
                continue;
            }
            values[(offset / step_secs) as usize] = Some(*value);
        }

        Some((
            Self {
                start: first,
                step,
                values,
            },
            off_grid,
        ))
    }

    pub fn timestamp(&self, position: usize) -> NaiveDateTime {
        self.start + self.step * position as i32
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn points(&self) -> Vec<(NaiveDateTime, Option<f32>)> {
        self.values
            .iter()
            .enumerate()
            .map(|(i, value)| (self.timestamp(i), *value))
            .collect()
    }
}

/// Detected native sampling interval of one (country, origin) series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionRecord {
    pub country: String,
    pub origin: String,
    /// `None` when the column holds fewer than two present values.
    pub resolution_minutes: Option<i64>,
}

/// Provenance of one classified gap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapRecord {
    pub country: String,
    pub origin: String,
    pub start: NaiveDateTime,
    pub steps: usize,
    pub class: GapClass,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileReport {
    pub resolutions: Vec<ResolutionRecord>,
    pub gaps: Vec<GapRecord>,
    /// Missing cells on the native grids before any fill.
    pub missing_cells: usize,
    pub total_cells: usize,
}

impl ReconcileReport {
    pub fn extend(&mut self, other: ReconcileReport) {
        self.resolutions.extend(other.resolutions);
        self.gaps.extend(other.gaps);
        self.missing_cells += other.missing_cells;
        self.total_cells += other.total_cells;
    }

    pub fn resolution(&self, country: &str, origin: &str) -> Option<i64> {
        self.resolutions
            .iter()
            .find(|r| r.country == country && r.origin == origin)
            .and_then(|r| r.resolution_minutes)
    }

    pub fn count(&self, class: GapClass) -> usize {
        self.gaps.iter().filter(|g| g.class == class).count()
    }

    pub fn missing_share(&self) -> f64 {
        if self.total_cells == 0 {
            0.0
        } else {
            self.missing_cells as f64 / self.total_cells as f64
        }
    }
}
