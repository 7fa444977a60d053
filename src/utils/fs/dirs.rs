//! Directory creation helpers.

use crate::core::CachebustError;
use std::fs;
use std::path::Path;

/// Ensures a directory exists, creating it and all parents if necessary.
///
/// Fails if the path exists but is not a directory.
pub fn ensure_dir(path: &Path) -> Result<(), CachebustError> {
    if !path.exists() {
        fs::create_dir_all(path).map_err(|e| CachebustError::io("create directory", path, e))?;
    } else if !path.is_dir() {
        return Err(CachebustError::io(
            "create directory",
            path,
            std::io::Error::new(std::io::ErrorKind::AlreadyExists, "path exists but is not a directory"),
        ));
    }
    Ok(())
}
