use crate::batch_loader::load_files;
use crate::error::ExtractError;
use crate::file_selector::{select_files, YearMonth};
use crate::grid::normalize_all;
use crate::output::{write_gap_report, write_resolution_report};
use crate::parameters::DatasetKind;
use crate::progress::ProgressSink;
use crate::reshaper::reshape;
use anyhow::{Context, Result};
use gap_reconciler::{CountryMatrix, GapPolicy, ReconcileReport, Reconciler};
use log::info;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// One extraction run over generation and/or import data.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractRequest {
    pub countries: Vec<String>,
    pub start: Option<YearMonth>,
    pub end: Option<YearMonth>,
    pub generation_dir: Option<PathBuf>,
    pub import_dir: Option<PathBuf>,
    /// Fill generation gaps; when off, missing data is only reported.
    pub correct_generation: bool,
    pub correct_import: bool,
    pub policy: GapPolicy,
    pub save_generation: Option<PathBuf>,
    pub save_import: Option<PathBuf>,
    pub save_resolution: Option<PathBuf>,
}

impl ExtractRequest {
    pub fn new(countries: Vec<String>) -> Self {
        Self {
            countries,
            start: None,
            end: None,
            generation_dir: None,
            import_dir: None,
            correct_generation: true,
            correct_import: true,
            policy: GapPolicy::default(),
            save_generation: None,
            save_import: None,
            save_resolution: None,
        }
    }

    /// Policy applied to `kind`, with filling turned off when its correction is.
    pub fn policy_for(&self, kind: DatasetKind) -> GapPolicy {
        let correct = match kind {
            DatasetKind::Generation => self.correct_generation,
            DatasetKind::Import => self.correct_import,
            _ => true,
        };
        GapPolicy {
            ignore: self.policy.ignore || !correct,
            ..self.policy
        }
    }

    fn save_dir(&self, kind: DatasetKind) -> Option<&Path> {
        match kind {
            DatasetKind::Generation => self.save_generation.as_deref(),
            DatasetKind::Import => self.save_import.as_deref(),
            _ => None,
        }
    }
}

/// Finalized matrices of one dataset kind.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetExtraction {
    pub kind: DatasetKind,
    pub matrices: BTreeMap<String, CountryMatrix>,
    pub universe: Vec<String>,
    pub report: ReconcileReport,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub generation: Option<DatasetExtraction>,
    pub import: Option<DatasetExtraction>,
}

/// Extract, reconcile and normalize the requested datasets.
pub fn extract(request: &ExtractRequest, progress: Option<&dyn ProgressSink>) -> Result<Extraction> {
    if request.generation_dir.is_none() && request.import_dir.is_none() {
        return Err(ExtractError::NoSourceDirectory.into());
    }

    let start = Instant::now();
    let mut extraction = Extraction::default();

    if let Some(dir) = &request.generation_dir {
        info!("Extracting generation data from {}", dir.display());
        extraction.generation =
            Some(create_per_country(request, DatasetKind::Generation, dir, progress)?);
    }
    if let Some(dir) = &request.import_dir {
        info!("Extracting cross-border flows from {}", dir.display());
        extraction.import = Some(create_per_country(request, DatasetKind::Import, dir, progress)?);
    }

    info!("Extraction done in {:.2?}", start.elapsed());
    Ok(extraction)
}

/// Run every stage for one dataset directory.
pub fn create_per_country(
    request: &ExtractRequest,
    kind: DatasetKind,
    dir: &Path,
    progress: Option<&dyn ProgressSink>,
) -> Result<DatasetExtraction> {
    let selection = select_files(dir, request.start, request.end)?;
    info!("{}: {} files selected", kind, selection.files.len());

    let table = load_files(&selection, &kind.field_roles(), progress)
        .with_context(|| format!("loading {} files", kind))?;
    let mut reshaped = reshape(table, &request.countries, kind, progress)?;

    let reconciler = Reconciler::new(request.policy_for(kind));
    if let Some(progress) = progress {
        progress.set_sub_label("Reconciling gaps");
    }
    let report = reconciler.reconcile(&mut reshaped.matrices);

    if let Some(dir) = &request.save_resolution {
        let path = write_resolution_report(&report.resolutions, kind, dir)?;
        info!("Saved {}", path.display());
        let path = write_gap_report(&report.gaps, kind, dir)?;
        info!("Saved {}", path.display());
    }

    let matrices = normalize_all(
        reshaped.matrices,
        &reshaped.universe,
        &reshaped.time_line,
        kind,
        request.save_dir(kind),
    )?;
    if let Some(progress) = progress {
        progress.reset_sub_label();
    }

    Ok(DatasetExtraction {
        kind,
        matrices,
        universe: reshaped.universe,
        report,
    })
}
