use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub output_dir: Option<String>,
    pub song_play_page: Option<String>,
    /// Name matcher used by the fact join: "exact" or "normalized"
    pub matcher: Option<String>,
    pub threads: Option<usize>,

    pub inputs: Option<InputsConfig>,
}

/// Where the raw records come from. For each source either a directory to
/// discover files under or an explicit file list may be given, not both.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct InputsConfig {
    pub song_data_dir: Option<String>,
    pub song_files: Option<Vec<String>>,
    pub log_data_dir: Option<String>,
    pub log_files: Option<Vec<String>>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
