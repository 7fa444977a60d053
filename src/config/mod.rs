//! Run configuration.
//!
//! [`Config`] is the configuration surface consumed by the pipeline: the build
//! root, hash length, optional base URL, manifest file name and the knobs that
//! bound parallelism or redirect output. Values come from three layers, lowest
//! precedence first:
//!
//! 1. Built-in defaults (see [`crate::constants`])
//! 2. An optional `cachebust.toml` ([`ConfigFile`])
//! 3. Command-line flags, applied by the CLI on top of the merged value
//!
//! # Example `cachebust.toml`
//!
//! ```toml
//! hash-length = 10
//! base-url = "https://cdn.example.com/assets"
//! manifest = "manifest.json"
//! exclude = ["robots.txt", "**/*.txt"]
//! ```

mod file;
mod hash_length;

pub use file::{ConfigFile, HashLengthValue};
pub use hash_length::HashLength;

use crate::constants::{CONFIG_FILE_NAME, DEFAULT_MANIFEST_FILE, default_max_parallel};
use crate::core::CachebustError;
use std::path::{Path, PathBuf};

/// Fully merged configuration for one run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Build root; every asset below it is a candidate Document.
    pub root: PathBuf,
    /// Write hashed output here instead of rewriting the root in place.
    pub out_dir: Option<PathBuf>,
    /// How many hex characters of the digest end up in file names.
    pub hash_length: HashLength,
    /// Prefix for rewritten references and manifest values, without trailing slash.
    pub base_url: Option<String>,
    /// Manifest file name, relative to the output root.
    pub manifest_file: String,
    /// Upper bound on concurrent file operations.
    pub max_parallel: usize,
    /// Files whose root-relative path matches any pattern are ignored entirely.
    pub exclude: Vec<glob::Pattern>,
    /// Optional JSON dump of the document registry, for debugging.
    pub registry_dump: Option<PathBuf>,
    /// Compute everything but write nothing.
    pub dry_run: bool,
}

impl Config {
    /// Configuration with built-in defaults for the given root.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            out_dir: None,
            hash_length: HashLength::default(),
            base_url: None,
            manifest_file: DEFAULT_MANIFEST_FILE.to_string(),
            max_parallel: default_max_parallel(),
            exclude: Vec::new(),
            registry_dump: None,
            dry_run: false,
        }
    }

    /// Defaults overlaid with the values present in `file`.
    pub fn from_file(root: impl Into<PathBuf>, file: &ConfigFile) -> Result<Self, CachebustError> {
        let mut config = Self::new(root);

        if let Some(length) = &file.hash_length {
            config.hash_length = length.to_hash_length()?;
        }
        if let Some(base_url) = &file.base_url {
            config = config.with_base_url(base_url);
        }
        if let Some(manifest) = &file.manifest {
            config.manifest_file = manifest.clone();
        }
        if let Some(out_dir) = &file.out_dir {
            config.out_dir = Some(config.root.join(out_dir));
        }
        if let Some(max_parallel) = file.max_parallel {
            config.max_parallel = max_parallel;
        }
        for pattern in &file.exclude {
            config = config.with_exclude(pattern)?;
        }

        Ok(config)
    }

    /// Set the hash length.
    #[must_use]
    pub const fn with_hash_length(mut self, hash_length: HashLength) -> Self {
        self.hash_length = hash_length;
        self
    }

    /// Set the base URL. Trailing slashes are trimmed; an empty value clears it.
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        let trimmed = base_url.trim_end_matches('/');
        self.base_url = if base_url.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
        self
    }

    /// Set the manifest file name.
    #[must_use]
    pub fn with_manifest_file(mut self, manifest_file: impl Into<String>) -> Self {
        self.manifest_file = manifest_file.into();
        self
    }

    /// Redirect output to a separate directory.
    #[must_use]
    pub fn with_out_dir(mut self, out_dir: impl Into<PathBuf>) -> Self {
        self.out_dir = Some(out_dir.into());
        self
    }

    /// Add an exclusion glob, matched against forward-slash root-relative paths.
    pub fn with_exclude(mut self, pattern: &str) -> Result<Self, CachebustError> {
        let compiled = glob::Pattern::new(pattern).map_err(|e| CachebustError::ConfigError {
            message: format!("invalid exclude pattern '{pattern}': {e}"),
        })?;
        self.exclude.push(compiled);
        Ok(self)
    }

    /// Directory the hashed tree is written to.
    #[must_use]
    pub fn output_root(&self) -> &Path {
        self.out_dir.as_deref().unwrap_or(&self.root)
    }

    /// Whether the run rewrites the root in place (and therefore deletes originals).
    #[must_use]
    pub const fn in_place(&self) -> bool {
        self.out_dir.is_none()
    }

    /// Absolute path of the manifest file.
    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        self.output_root().join(&self.manifest_file)
    }

    /// Whether a root-relative path is excluded from enumeration.
    ///
    /// The manifest and the config file are always excluded.
    #[must_use]
    pub fn is_excluded(&self, relative: &str) -> bool {
        if relative == self.manifest_file || relative == CONFIG_FILE_NAME {
            return true;
        }
        self.exclude.iter().any(|pattern| pattern.matches(relative))
    }

    /// Check the configuration for contradictions before a run starts.
    pub fn validate(&self) -> Result<(), CachebustError> {
        if self.manifest_file.trim().is_empty() {
            return Err(CachebustError::ConfigError {
                message: "manifest file name must not be empty".to_string(),
            });
        }
        if Path::new(&self.manifest_file).is_absolute() {
            return Err(CachebustError::ConfigError {
                message: format!(
                    "manifest file '{}' must be relative to the output directory",
                    self.manifest_file
                ),
            });
        }
        if self.max_parallel == 0 {
            return Err(CachebustError::ConfigError {
                message: "max parallel operations must be at least 1".to_string(),
            });
        }
        if let Some(out_dir) = &self.out_dir {
            if out_dir.starts_with(&self.root) && out_dir != &self.root {
                return Err(CachebustError::ConfigError {
                    message: format!(
                        "output directory {} must not be inside the build root {}",
                        out_dir.display(),
                        self.root.display()
                    ),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::new("/site");
        assert_eq!(config.hash_length, HashLength::default());
        assert_eq!(config.manifest_file, DEFAULT_MANIFEST_FILE);
        assert!(config.base_url.is_none());
        assert!(config.in_place());
        assert_eq!(config.manifest_path(), PathBuf::from("/site/asset-manifest.json"));
        assert!(config.max_parallel >= 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_base_url_trimmed() {
        let config = Config::new("/site").with_base_url("https://cdn.example.com/assets/");
        assert_eq!(config.base_url.as_deref(), Some("https://cdn.example.com/assets"));

        let cleared = config.with_base_url("");
        assert!(cleared.base_url.is_none());
    }

    #[test]
    fn test_exclusions() {
        let config = Config::new("/site").with_exclude("**/*.txt").unwrap();
        assert!(config.is_excluded("docs/readme.txt"));
        assert!(config.is_excluded("asset-manifest.json"));
        assert!(config.is_excluded("cachebust.toml"));
        assert!(!config.is_excluded("app.js"));
    }

    #[test]
    fn test_invalid_exclude_pattern() {
        let err = Config::new("/site").with_exclude("[").unwrap_err();
        assert!(matches!(err, CachebustError::ConfigError { .. }));
    }

    #[test]
    fn test_out_dir() {
        let config = Config::new("/site").with_out_dir("/dist");
        assert!(!config.in_place());
        assert_eq!(config.output_root(), Path::new("/dist"));
        assert_eq!(config.manifest_path(), PathBuf::from("/dist/asset-manifest.json"));
    }

    #[test]
    fn test_validate_rejects_nested_out_dir() {
        let config = Config::new("/site").with_out_dir("/site/dist");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_absolute_manifest() {
        let config = Config::new("/site").with_manifest_file("/tmp/manifest.json");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file() {
        let file: ConfigFile = toml::from_str(
            r#"
hash-length = "infinite"
base-url = "https://cdn.example.com/"
manifest = "manifest.json"
exclude = ["*.txt"]
max-parallel = 3
"#,
        )
        .unwrap();

        let config = Config::from_file("/site", &file).unwrap();
        assert_eq!(config.hash_length, HashLength::Full);
        assert_eq!(config.base_url.as_deref(), Some("https://cdn.example.com"));
        assert_eq!(config.manifest_file, "manifest.json");
        assert_eq!(config.max_parallel, 3);
        assert!(config.is_excluded("robots.txt"));
    }
}
