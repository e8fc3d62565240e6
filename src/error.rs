use chrono::NaiveDateTime;
use std::path::PathBuf;
use thiserror::Error;

/// Failures of the extraction pipeline.
///
/// Functions return `anyhow::Result`; these variants sit at the root of the
/// error chain so callers can `downcast_ref::<ExtractError>()`.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("dataset kind '{0}' not understood")]
    UnsupportedKind(String),

    #[error("no source directory given: pass a generation and/or an import directory")]
    NoSourceDirectory,

    #[error("{kind} records cannot be pivoted into a time series matrix")]
    NotPivotable { kind: String },

    #[error("directory {} does not exist", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error(
        "no file found in {} between {} and {}; make sure the ENTSO-E data is downloaded",
        .dir.display(),
        .start.as_deref().unwrap_or("the first file"),
        .end.as_deref().unwrap_or("the last file")
    )]
    NoMatchingFiles {
        dir: PathBuf,
        start: Option<String>,
        end: Option<String>,
    },

    #[error("column '{column}' missing in {}", .path.display())]
    MissingColumn { path: PathBuf, column: String },

    #[error("invalid timestamp '{value}' in {}", .path.display())]
    InvalidTimestamp { path: PathBuf, value: String },

    #[error("duplicate entry for {country} / {origin} at {timestamp}")]
    DuplicateEntry {
        country: String,
        origin: String,
        timestamp: NaiveDateTime,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offending_input() {
        let err = ExtractError::NoMatchingFiles {
            dir: PathBuf::from("/data/generation"),
            start: Some("2023-01".to_string()),
            end: None,
        };
        let message = err.to_string();
        assert!(message.contains("/data/generation"));
        assert!(message.contains("2023-01"));
        assert!(message.contains("the last file"));

        let err = ExtractError::UnsupportedKind("prices".to_string());
        assert_eq!(err.to_string(), "dataset kind 'prices' not understood");
    }
}
