use crate::policy::GapPolicy;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A maximal run of missing cells bounded on both sides by present values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gap {
    /// Position of the first missing cell.
    pub start: usize,
    /// Number of missing cells.
    pub len: usize,
}

impl Gap {
    /// Position one past the last missing cell (a present value).
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    pub fn relative_size(&self, series_len: usize) -> f64 {
        if series_len == 0 {
            1.0
        } else {
            self.len as f64 / series_len as f64
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GapClass {
    /// Linear interpolation.
    Short,
    /// Average day built from the surrounding days.
    Long,
    /// Zero fill.
    Oversized,
}

impl fmt::Display for GapClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GapClass::Short => "short",
            GapClass::Long => "long",
            GapClass::Oversized => "oversized",
        };
        f.write_str(name)
    }
}

/// Interior gaps of a column. Leading and trailing missing cells are not gaps.
pub fn find_gaps(values: &[Option<f32>]) -> Vec<Gap> {
    let mut gaps = Vec::new();
    let first = match values.iter().position(Option::is_some) {
        Some(first) => first,
        None => return gaps,
    };

    let mut run_start = None;
    for (i, value) in values.iter().enumerate().skip(first) {
        match (value, run_start) {
            (None, None) => run_start = Some(i),
            (Some(_), Some(start)) => {
                gaps.push(Gap {
                    start,
                    len: i - start,
                });
                run_start = None;
            }
            _ => {}
        }
    }
    // an open run at the end is trailing missingness
    gaps
}

pub fn classify(gap: &Gap, series_len: usize, step: Duration, policy: &GapPolicy) -> GapClass {
    if gap.len <= policy.short_gap_steps(step) {
        GapClass::Short
    } else if gap.relative_size(series_len) <= policy.limit {
        GapClass::Long
    } else {
        GapClass::Oversized
    }
}
