use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Song files live at `song_data/<A>/<B>/<C>/<file>`.
pub const SONG_DATA_DEPTH: usize = 4;

/// Log files live at `log_data/<year>/<month>/<file>`.
pub const LOG_DATA_DEPTH: usize = 3;

/// List the regular files exactly `depth` levels below `root`, sorted by path.
///
/// Hidden files and files starting with `_` (such as `_SUCCESS` markers) are
/// skipped.
pub fn discover_files(root: &Path, depth: usize) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        bail!("Input directory does not exist: {:?}", root);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .min_depth(depth)
        .max_depth(depth)
        .sort_by_file_name()
    {
        let entry = entry.with_context(|| format!("Failed to walk {:?}", root))?;
        if entry.file_type().is_file() && !is_ignored(&entry) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Hidden entries and `_`-prefixed markers are never data.
pub(crate) fn is_ignored(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || name.starts_with('_')
}
