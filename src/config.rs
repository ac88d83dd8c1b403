//! Dashboard configuration loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file at all) gives the
//! conventional `./data` layout.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Directory holding one sub-directory per category.
    pub data_root: PathBuf,
    /// Roster spreadsheet with `Nom` and `Position` columns.
    pub roster_file: PathBuf,
    /// Where normalised `<category>.csv` exports go.
    pub processed_dir: PathBuf,
    pub save_processed: bool,
    /// Sub-directory of GPS / heart-rate session exports.
    pub session_category: String,
    /// Sub-directory of post-session questionnaires.
    pub load_category: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("./data"),
            roster_file: PathBuf::from("./data/postes.xlsx"),
            processed_dir: PathBuf::from("./data/_processed"),
            save_processed: true,
            session_category: "Seances".to_string(),
            load_category: "RPE".to_string(),
        }
    }
}

impl DashboardConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("parsing dashboard config")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Directory for processed exports, `None` when saving is disabled.
    pub fn save_dir(&self) -> Option<&Path> {
        self.save_processed.then_some(self.processed_dir.as_path())
    }
}
