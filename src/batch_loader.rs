use crate::file_selector::FileSelection;
use crate::loader::load_single_file;
use crate::models::RecordTable;
use crate::parameters::FieldRoles;
use crate::progress::ProgressSink;
use anyhow::Result;
use log::info;
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

/// Up to this many files are read on the calling thread.
const SEQUENTIAL_LIMIT: usize = 2;

/// Load every selected file into one table.
///
/// Larger batches are spread over the rayon pool. The first failing file
/// fails the batch.
pub fn load_files(
    selection: &FileSelection,
    roles: &FieldRoles,
    progress: Option<&dyn ProgressSink>,
) -> Result<RecordTable> {
    if selection.files.is_empty() {
        return Err(selection.no_match_error().into());
    }

    let start = Instant::now();
    let total = selection.files.len();
    if let Some(progress) = progress {
        progress.set_sub_label("Loading files");
        progress.progress(0, total);
    }

    let done = AtomicUsize::new(0);
    let load = |path: &PathBuf| -> Result<RecordTable> {
        let table = load_single_file(path, roles)?;
        let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(progress) = progress {
            progress.progress(finished, total);
        }
        Ok(table)
    };

    let tables = if total <= SEQUENTIAL_LIMIT {
        selection.files.iter().map(load).collect::<Result<Vec<_>>>()?
    } else {
        selection.files.par_iter().map(load).collect::<Result<Vec<_>>>()?
    };

    let table = RecordTable::concat(tables);
    if let Some(progress) = progress {
        progress.reset_sub_label();
    }

    info!(
        "Loaded {} records from {} files in {:.2?} (~{:.1} MB)",
        table.len(),
        total,
        start.elapsed(),
        table.memory_usage() as f64 / (1024.0 * 1024.0)
    );
    Ok(table)
}
