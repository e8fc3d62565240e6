use crate::error::ExtractError;
use anyhow::{bail, Context, Result};
use chrono::{Datelike, NaiveDate};
use glob::{glob, Pattern};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;

/// Calendar month, the granularity of the monthly ENTSO-E files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            bail!("invalid month {} in {}-{:02}", month, year, month);
        }
        Ok(Self { year, month })
    }

    /// Month of a `YYYY_MM_...` file name.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let caps = month_prefix().captures(name)?;
        let year = caps.get(1)?.as_str().parse().ok()?;
        let month = caps.get(2)?.as_str().parse().ok()?;
        Self::new(year, month).ok()
    }
}

impl From<NaiveDate> for YearMonth {
    fn from(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl FromStr for YearMonth {
    type Err = anyhow::Error;

    /// Accepts `YYYY-MM` or `YYYY-MM-DD`; the day is ignored.
    fn from_str(s: &str) -> Result<Self> {
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Ok(date.into());
        }
        let (year, month) = s
            .split_once('-')
            .with_context(|| format!("invalid month '{}', expected YYYY-MM", s))?;
        let year = year
            .parse()
            .with_context(|| format!("invalid year in '{}'", s))?;
        let month = month
            .parse()
            .with_context(|| format!("invalid month in '{}'", s))?;
        Self::new(year, month)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

/// The files picked for one dataset directory and month range.
#[derive(Debug, Clone, PartialEq)]
pub struct FileSelection {
    pub dir: PathBuf,
    pub start: Option<YearMonth>,
    pub end: Option<YearMonth>,
    pub files: Vec<PathBuf>,
}

impl FileSelection {
    pub fn no_match_error(&self) -> ExtractError {
        ExtractError::NoMatchingFiles {
            dir: self.dir.clone(),
            start: self.start.map(|m| m.to_string()),
            end: self.end.map(|m| m.to_string()),
        }
    }
}

/// Select the monthly files of `dir` whose month lies in `[start, end]`.
///
/// A missing bound defaults to the first or last file's month. Files are
/// returned in lexical, hence chronological, order.
pub fn select_files(
    dir: &Path,
    start: Option<YearMonth>,
    end: Option<YearMonth>,
) -> Result<FileSelection> {
    if !dir.is_dir() {
        return Err(ExtractError::DirectoryNotFound(dir.to_path_buf()).into());
    }

    let pattern = format!("{}/*", Pattern::escape(&dir.to_string_lossy()));
    let mut candidates: Vec<(YearMonth, PathBuf)> = glob(&pattern)
        .with_context(|| format!("listing {}", dir.display()))?
        .filter_map(Result::ok)
        .filter(|path| path.is_file())
        .filter_map(|path| {
            let month = YearMonth::from_file_name(path.file_name()?.to_str()?)?;
            Some((month, path))
        })
        .collect();
    candidates.sort_by(|a, b| a.1.file_name().cmp(&b.1.file_name()));

    let mut selection = FileSelection {
        dir: dir.to_path_buf(),
        start,
        end,
        files: Vec::new(),
    };
    let (first, last) = match (candidates.first(), candidates.last()) {
        (Some(first), Some(last)) => (first.0, last.0),
        _ => return Err(selection.no_match_error().into()),
    };
    let start = start.unwrap_or(first);
    let end = end.unwrap_or(last);

    selection.files = candidates
        .into_iter()
        .filter(|(month, _)| (start..=end).contains(month))
        .map(|(_, path)| path)
        .collect();
    if selection.files.is_empty() {
        return Err(selection.no_match_error().into());
    }
    Ok(selection)
}

fn month_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{4})_(\d{2})_").expect("valid month prefix pattern"))
}
