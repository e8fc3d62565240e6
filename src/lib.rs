pub mod batch_loader;
pub mod config;
pub mod error;
pub mod file_selector;
pub mod grid;
pub mod loader;
pub mod models;
pub mod output;
pub mod parameters;
pub mod pipeline;
pub mod progress;
pub mod reshaper;
pub mod time_line;

pub use config::ExtractConfig;
pub use error::ExtractError;
pub use file_selector::{select_files, FileSelection, YearMonth};
pub use models::{OutageDetails, RawRecord, RecordTable};
pub use parameters::{DatasetKind, FieldRoles, UnavailabilityKind};
pub use pipeline::{create_per_country, extract, DatasetExtraction, ExtractRequest, Extraction};
pub use progress::{NoProgress, ProgressReporter, ProgressSink};
pub use time_line::TimeLine;

pub use gap_reconciler::{CountryMatrix, GapClass, GapPolicy, GapRecord, ReconcileReport, ResolutionRecord};
