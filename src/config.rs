use crate::file_selector::YearMonth;
use crate::pipeline::ExtractRequest;
use anyhow::{Context, Result};
use gap_reconciler::GapPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// On-disk description of one extraction run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    pub countries: Vec<String>,
    /// First month, `YYYY-MM` or `YYYY-MM-DD`.
    pub start: Option<String>,
    pub end: Option<String>,
    pub generation_dir: Option<PathBuf>,
    pub import_dir: Option<PathBuf>,
    pub correct_generation: bool,
    pub correct_import: bool,
    pub policy: GapPolicy,
    pub save_generation: Option<PathBuf>,
    pub save_import: Option<PathBuf>,
    /// Directory receiving the resolution and gap reports.
    pub save_resolution: Option<PathBuf>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            countries: Vec::new(),
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
}

impl ExtractConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn to_request(&self) -> Result<ExtractRequest> {
        let month = |text: &Option<String>| -> Result<Option<YearMonth>> {
            text.as_deref().map(str::parse).transpose()
        };

        Ok(ExtractRequest {
            countries: self.countries.clone(),
            start: month(&self.start)?,
            end: month(&self.end)?,
            generation_dir: self.generation_dir.clone(),
            import_dir: self.import_dir.clone(),
            correct_generation: self.correct_generation,
            correct_import: self.correct_import,
            policy: self.policy,
            save_generation: self.save_generation.clone(),
            save_import: self.save_import.clone(),
            save_resolution: self.save_resolution.clone(),
        })
    }
}
