//! File discovery for the build root.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// List every regular file below `root`, sorted by path.
///
/// Symlinks are not followed, so a link pointing back up the tree cannot make the
/// walk loop. Leftover temp files from an interrupted atomic write are skipped.
pub fn list_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry =
            entry.with_context(|| format!("Failed to read directory entry in: {}", root.display()))?;

        if !entry.file_type().is_file() {
            continue;
        }

        let is_temp = entry.file_name().to_string_lossy().ends_with(".cachebust-tmp");
        if !is_temp {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}
