//! Local file system that fails reads or writes under chosen paths.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::core::CachebustError;
use crate::utils::fs::{FileSystem, LocalFileSystem};

/// [`LocalFileSystem`] with failures injected.
///
/// A denied path also denies everything below it.
#[derive(Debug, Default)]
pub struct FaultyFileSystem {
    inner: LocalFileSystem,
    deny_read: Vec<PathBuf>,
    deny_write: Vec<PathBuf>,
    panic_write: Vec<PathBuf>,
    writes: Mutex<Vec<PathBuf>>,
}

impl FaultyFileSystem {
    /// A file system that fails nothing yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail reads of `path`.
    #[must_use]
    pub fn deny_read(mut self, path: impl Into<PathBuf>) -> Self {
        self.deny_read.push(path.into());
        self
    }

    /// Fail writes to `path`.
    #[must_use]
    pub fn deny_write(mut self, path: impl Into<PathBuf>) -> Self {
        self.deny_write.push(path.into());
        self
    }

    /// Panic while writing to `path`, as a crashed worker would.
    #[must_use]
    pub fn panic_on_write(mut self, path: impl Into<PathBuf>) -> Self {
        self.panic_write.push(path.into());
        self
    }

    /// Paths written successfully so far.
    #[must_use]
    pub fn writes(&self) -> Vec<PathBuf> {
        self.writes.lock().map(|writes| writes.clone()).unwrap_or_default()
    }

    fn denied(list: &[PathBuf], path: &Path) -> bool {
        list.iter().any(|denied| path.starts_with(denied))
    }
}

impl FileSystem for FaultyFileSystem {
    fn list_files(&self, root: &Path) -> anyhow::Result<Vec<PathBuf>> {
        self.inner.list_files(root)
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>, CachebustError> {
        if Self::denied(&self.deny_read, path) {
            return Err(CachebustError::io("read", path, std::io::Error::from(ErrorKind::PermissionDenied)));
        }
        self.inner.read(path)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<(), CachebustError> {
        assert!(!Self::denied(&self.panic_write, path), "injected panic writing {}", path.display());
        if Self::denied(&self.deny_write, path) {
            return Err(CachebustError::io("write", path, std::io::Error::from(ErrorKind::PermissionDenied)));
        }
        self.inner.write(path, contents)?;
        if let Ok(mut writes) = self.writes.lock() {
            writes.push(path.to_path_buf());
        }
        Ok(())
    }

    fn remove(&self, path: &Path) -> Result<(), CachebustError> {
        self.inner.remove(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.inner.is_file(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.inner.is_dir(path)
    }
}
