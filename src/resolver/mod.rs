//! Specifier resolution.
//!
//! Turns the raw reference text found in an asset into either
//! [`Resolution::External`] (ignored, never rewritten) or a concrete file below
//! the build root. The rules mirror how a browser or bundler would find the
//! file:
//!
//! 1. Scheme-qualified, protocol-relative, `data:`, fragment-only and similar
//!    specifiers are external.
//! 2. Root-relative specifiers (`/js/app.js`) are reinterpreted against the build
//!    root; everything else is relative to the referencing document's directory.
//!    A `?query` or `#fragment` tail is split off and preserved.
//! 3. Candidates are tried in order: the literal path, the literal path with each
//!    candidate extension appended, and for directories the package entry points
//!    named by the candidate main fields (then `index` + extensions).
//! 4. If nothing matched and the specifier carries a file extension, the author
//!    clearly meant a file: [`CachebustError::Resolution`]. Otherwise the
//!    specifier is ambiguous (a route, a bare module name) and treated as external.
//!
//! Targets that resolve outside the build root are external too; they can never be
//! part of the hashed tree.
//!
//! # Examples
//!
//! ```rust,no_run
//! use cachebust_cli::resolver::{Resolution, ResolveOptions, Resolver};
//! use cachebust_cli::utils::fs::LocalFileSystem;
//! use std::path::Path;
//!
//! # fn example() -> anyhow::Result<()> {
//! let fs = LocalFileSystem::new();
//! let resolver = Resolver::new(Path::new("/site"), &fs);
//! let options = ResolveOptions::new().with_extensions(&[".js"]);
//!
//! match resolver.resolve("/js/app", Path::new("/site/pages"), &options)? {
//!     Resolution::File { path, .. } => println!("resolved to {}", path.display()),
//!     Resolution::External => println!("not an in-tree asset"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod package;
pub mod specifier;

use crate::core::CachebustError;
use crate::utils::fs::FileSystem;
use crate::utils::paths::{is_within, normalize_path};
use std::path::{Path, PathBuf};

/// Extension probing and entry-point rules for one file type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Extensions appended to extensionless specifiers, with leading dot, in priority order.
    pub extensions: Vec<String>,
    /// `package.json` fields consulted when a specifier names a directory.
    pub main_fields: Vec<String>,
}

impl ResolveOptions {
    /// No probing: only literal paths resolve.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the candidate extensions.
    #[must_use]
    pub fn with_extensions(mut self, extensions: &[&str]) -> Self {
        self.extensions = extensions.iter().map(|e| (*e).to_string()).collect();
        self
    }

    /// Set the candidate main fields.
    #[must_use]
    pub fn with_main_fields(mut self, fields: &[&str]) -> Self {
        self.main_fields = fields.iter().map(|f| (*f).to_string()).collect();
        self
    }
}

/// Outcome of resolving one specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Not an in-tree asset.
    External,
    /// An existing file below the build root.
    File {
        /// Absolute, normalized path of the file
        path: PathBuf,
        /// `?query`/`#fragment` tail to carry over
        suffix: String,
    },
}

/// Resolves specifiers against the build root through the file system collaborator.
pub struct Resolver<'a> {
    root: &'a Path,
    fs: &'a dyn FileSystem,
}

impl<'a> Resolver<'a> {
    /// Create a resolver for the given build root.
    pub fn new(root: &'a Path, fs: &'a dyn FileSystem) -> Self {
        Self {
            root,
            fs,
        }
    }

    /// Build root this resolver works against.
    #[must_use]
    pub const fn root(&self) -> &Path {
        self.root
    }

    /// Resolve `specifier` as found in a file located in `from_dir`.
    pub fn resolve(
        &self,
        specifier: &str,
        from_dir: &Path,
        options: &ResolveOptions,
    ) -> Result<Resolution, CachebustError> {
        let trimmed = specifier.trim();

        if specifier::is_external(trimmed) {
            tracing::trace!("External specifier: {}", trimmed);
            return Ok(Resolution::External);
        }

        let (path_part, suffix) = specifier::split_suffix(trimmed);
        if path_part.is_empty() {
            return Ok(Resolution::External);
        }

        let mut attempts = vec![path_part.to_string()];
        if let Some(decoded) = specifier::percent_decode(path_part) {
            attempts.push(decoded);
        }

        for attempt in &attempts {
            let base = self.base_path(attempt, from_dir);

            if !is_within(self.root, &base) {
                tracing::warn!(
                    "'{}' in {} points outside the build root; leaving it untouched",
                    trimmed,
                    from_dir.display()
                );
                return Ok(Resolution::External);
            }

            if let Some(path) = self.probe(&base, attempt.ends_with('/'), options) {
                tracing::trace!("Resolved '{}' to {}", trimmed, path.display());
                return Ok(Resolution::File {
                    path,
                    suffix: suffix.to_string(),
                });
            }
        }

        if specifier::has_file_extension(path_part) {
            return Err(CachebustError::Resolution {
                specifier: trimmed.to_string(),
                directory: from_dir.display().to_string(),
            });
        }

        tracing::debug!(
            "'{}' in {} matched no file and has no extension; treating as external",
            trimmed,
            from_dir.display()
        );
        Ok(Resolution::External)
    }

    fn base_path(&self, path: &str, from_dir: &Path) -> PathBuf {
        match path.strip_prefix('/') {
            Some(root_relative) => normalize_path(&self.root.join(root_relative)),
            None => normalize_path(&from_dir.join(path)),
        }
    }

    fn probe(&self, base: &Path, directory_only: bool, options: &ResolveOptions) -> Option<PathBuf> {
        if !directory_only {
            if self.fs.is_file(base) {
                return Some(base.to_path_buf());
            }
            if let Some(found) = self.probe_extensions(base, options) {
                return Some(found);
            }
        }

        if self.fs.is_dir(base) {
            return self.probe_directory(base, options);
        }

        None
    }

    fn probe_extensions(&self, base: &Path, options: &ResolveOptions) -> Option<PathBuf> {
        options.extensions.iter().find_map(|extension| {
            let mut candidate = base.as_os_str().to_owned();
            candidate.push(extension);
            let candidate = PathBuf::from(candidate);
            self.fs.is_file(&candidate).then_some(candidate)
        })
    }

    fn probe_directory(&self, dir: &Path, options: &ResolveOptions) -> Option<PathBuf> {
        for entry in package::entry_points(self.fs, dir, &options.main_fields) {
            let candidate = normalize_path(&dir.join(&entry));
            if !is_within(self.root, &candidate) {
                continue;
            }
            if self.fs.is_file(&candidate) {
                return Some(candidate);
            }
            if let Some(found) = self.probe_extensions(&candidate, options) {
                return Some(found);
            }
            if self.fs.is_dir(&candidate) {
                if let Some(found) = self.probe_index(&candidate, options) {
                    return Some(found);
                }
            }
        }

        self.probe_index(dir, options)
    }

    fn probe_index(&self, dir: &Path, options: &ResolveOptions) -> Option<PathBuf> {
        self.probe_extensions(&dir.join("index"), options)
    }
}
