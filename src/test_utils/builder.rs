//! Fluent builder for throwaway build directories.

use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use crate::config::Config;
use crate::manifest::Manifest;
use crate::pipeline::Context;
use crate::plugins::PluginRegistry;
use crate::utils::fs::FileSystem;

/// Builder for a [`TestSite`].
pub struct TestSiteBuilder {
    temp_dir: TempDir,
    root: PathBuf,
    files: Vec<(String, Vec<u8>)>,
}

impl TestSiteBuilder {
    /// Start an empty site rooted at `<tmp>/site`.
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path().join("site");
        Ok(Self {
            temp_dir,
            root,
            files: Vec::new(),
        })
    }

    /// Add a text file at a root-relative path.
    #[must_use]
    pub fn with_file(self, path: impl Into<String>, content: impl AsRef<str>) -> Self {
        self.with_bytes(path, content.as_ref().as_bytes())
    }

    /// Add a binary file at a root-relative path.
    #[must_use]
    pub fn with_bytes(mut self, path: impl Into<String>, content: &[u8]) -> Self {
        self.files.push((path.into(), content.to_vec()));
        self
    }

    /// Add several text files.
    #[must_use]
    pub fn with_files(mut self, files: &[(&str, &str)]) -> Self {
        for (path, content) in files {
            self.files.push(((*path).to_string(), content.as_bytes().to_vec()));
        }
        self
    }

    /// Write every file to disk.
    pub fn build(self) -> Result<TestSite> {
        std::fs::create_dir_all(&self.root)?;
        for (relative, content) in &self.files {
            let path = self.root.join(relative);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        }

        Ok(TestSite {
            _temp_dir: self.temp_dir,
            root: self.root,
        })
    }
}

/// A build directory living in a temporary directory.
///
/// The directory is removed when the site is dropped.
pub struct TestSite {
    _temp_dir: TempDir,
    root: PathBuf,
}

impl TestSite {
    /// The build root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// A sibling of the root inside the same temporary directory, for `--out-dir`.
    #[must_use]
    pub fn sibling(&self, name: &str) -> PathBuf {
        self.root.parent().map_or_else(|| PathBuf::from(name), |parent| parent.join(name))
    }

    /// Absolute path of a root-relative file.
    #[must_use]
    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// Whether a root-relative file exists.
    #[must_use]
    pub fn exists(&self, relative: &str) -> bool {
        self.path(relative).is_file()
    }

    /// Read a root-relative file as UTF-8.
    pub fn read(&self, relative: &str) -> Result<String> {
        let path = self.path(relative);
        std::fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))
    }

    /// Parse the manifest written at `<root>/<name>`.
    pub fn manifest(&self, name: &str) -> Result<Manifest> {
        Ok(Manifest::from_json(&self.read(name)?)?)
    }

    /// Default configuration for this site.
    #[must_use]
    pub fn config(&self) -> Config {
        Config::new(&self.root)
    }

    /// Local-disk context with the built-in plugins.
    pub fn context(&self, config: Config) -> Result<Context> {
        Ok(Context::local(config)?)
    }

    /// Context on `fs` with the built-in plugins.
    pub fn context_with_fs(&self, config: Config, fs: Arc<dyn FileSystem>) -> Result<Context> {
        Ok(Context::new(config, fs, Arc::new(PluginRegistry::with_defaults()?)))
    }

    /// Every file under the root, as sorted forward-slash relative paths.
    pub fn files(&self) -> Result<Vec<String>> {
        let mut files: Vec<String> = walkdir::WalkDir::new(&self.root)
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                entry.path().strip_prefix(&self.root).ok().map(crate::utils::paths::to_storage)
            })
            .collect();
        files.sort();
        Ok(files)
    }
}
