//! File system collaborator for the hashing pipeline.
//!
//! The pipeline only needs a handful of operations: enumerate files under a root,
//! read, write, delete, and existence checks. They are expressed as the
//! [`FileSystem`] trait so every stage receives its I/O through the run
//! [`Context`](crate::pipeline::Context) instead of reaching for global state.
//!
//! [`LocalFileSystem`] is the production implementation:
//! - enumeration uses `walkdir` and returns paths sorted for deterministic runs
//! - writes are atomic (temp file, fsync, rename) so a reader never observes a
//!   partially written asset
//!
//! # Examples
//!
//! ```rust,no_run
//! use cachebust_cli::utils::fs::{FileSystem, LocalFileSystem};
//! use std::path::Path;
//!
//! # fn example() -> anyhow::Result<()> {
//! let fs = LocalFileSystem::new();
//! for file in fs.list_files(Path::new("dist"))? {
//!     println!("{}", file.display());
//! }
//! # Ok(())
//! # }
//! ```

pub mod atomic;
pub mod dirs;
pub mod discovery;

pub use atomic::atomic_write;
pub use dirs::ensure_dir;
pub use discovery::list_files;

use crate::core::CachebustError;
use std::path::{Path, PathBuf};

/// Abstract file system interface used by every pipeline stage.
///
/// Implementations must be shareable across the blocking worker threads used for
/// parallel reads and writes.
pub trait FileSystem: Send + Sync {
    /// List every regular file below `root`, recursively, sorted by path.
    fn list_files(&self, root: &Path) -> anyhow::Result<Vec<PathBuf>>;

    /// Read the raw bytes of a file.
    fn read(&self, path: &Path) -> Result<Vec<u8>, CachebustError>;

    /// Write `contents` to `path`, creating parent directories as needed.
    fn write(&self, path: &Path, contents: &[u8]) -> Result<(), CachebustError>;

    /// Delete a file.
    fn remove(&self, path: &Path) -> Result<(), CachebustError>;

    /// Whether `path` exists and is a regular file.
    fn is_file(&self, path: &Path) -> bool;

    /// Whether `path` exists and is a directory.
    fn is_dir(&self, path: &Path) -> bool;
}

/// [`FileSystem`] backed by the local disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl LocalFileSystem {
    /// Create a new local file system handle.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl FileSystem for LocalFileSystem {
    fn list_files(&self, root: &Path) -> anyhow::Result<Vec<PathBuf>> {
        list_files(root)
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>, CachebustError> {
        std::fs::read(path).map_err(|e| CachebustError::io("read", path, e))
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<(), CachebustError> {
        atomic_write(path, contents)
    }

    fn remove(&self, path: &Path) -> Result<(), CachebustError> {
        std::fs::remove_file(path).map_err(|e| CachebustError::io("remove", path, e))
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_local_roundtrip() {
        let temp = TempDir::new().unwrap();
        let fs = LocalFileSystem::new();
        let path = temp.path().join("nested/dir/app.js");

        fs.write(&path, b"const x=1;").unwrap();
        assert!(fs.is_file(&path));
        assert!(fs.is_dir(&temp.path().join("nested/dir")));
        assert_eq!(fs.read(&path).unwrap(), b"const x=1;");

        fs.remove(&path).unwrap();
        assert!(!fs.is_file(&path));
    }

    #[test]
    fn test_read_missing_file_is_io_error() {
        let temp = TempDir::new().unwrap();
        let fs = LocalFileSystem::new();
        let err = fs.read(&temp.path().join("missing.css")).unwrap_err();
        assert!(matches!(err, CachebustError::Io { ref operation, .. } if operation == "read"));
    }
}
