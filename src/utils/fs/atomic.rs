//! Atomic file write operations using temp-and-rename strategy.
//!
//! Hashed assets are written next to the originals they replace, so a crash in the
//! middle of a write must never leave a truncated file under a hashed name.

use crate::core::CachebustError;
use crate::utils::fs::dirs::ensure_dir;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Atomically writes bytes to a file using a write-then-rename strategy.
///
/// 1. Writes content to a sibling temporary file
/// 2. Syncs the temporary file to disk
/// 3. Renames the temporary file over the target path
///
/// Parent directories are created if they don't exist. The temporary file is
/// removed again when any step fails.
///
/// # Examples
///
/// ```rust,no_run
/// use cachebust_cli::utils::fs::atomic_write;
/// use std::path::Path;
///
/// atomic_write(Path::new("dist/app.3f9a1b2c.js"), b"const x=1;").unwrap();
/// ```
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<(), CachebustError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent)?;
    }

    let temp_path = temp_path_for(path);

    let result = write_and_sync(&temp_path, content)
        .and_then(|()| fs::rename(&temp_path, path))
        .map_err(|e| CachebustError::io("write", path, e));

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }

    result
}

fn write_and_sync(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(content)?;
    file.sync_all()
}

/// Sibling temp path that cannot collide with another asset's name.
fn temp_path_for(path: &Path) -> PathBuf {
    let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    path.with_file_name(format!(".{name}.cachebust-tmp"))
}
