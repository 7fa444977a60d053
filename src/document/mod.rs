//! In-memory model of one asset.
//!
//! A [`Document`] is created once per file during graph building and mutated
//! exactly once, when the topological hasher finalizes it: its contents are
//! replaced by the rewritten bytes, its content hash is assigned and its output
//! path is fixed. Dependency positions are byte offsets into the contents *as
//! extracted*; they are only meaningful until that single rewrite.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Byte range of a specifier inside the owning document's contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Position {
    /// Inclusive start offset
    pub start: usize,
    /// Exclusive end offset
    pub end: usize,
}

impl Position {
    /// Create a new range.
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end,
        }
    }

    /// Length of the range in bytes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Whether the range is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether two ranges share at least one byte.
    #[must_use]
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// A reference found by a plugin, before resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReference {
    /// Literal text as authored
    pub specifier: String,
    /// Where the literal sits in the contents
    pub position: Position,
}

impl RawReference {
    /// Create a raw reference.
    #[must_use]
    pub fn new(specifier: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            specifier: specifier.into(),
            position: Position::new(start, end),
        }
    }
}

/// What happened to a dependency during hashing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DependencyStatus {
    /// Not an in-tree asset; never rewritten and never a graph edge.
    External,
    /// In-tree, waiting for the owning document to be finalized.
    Pending,
    /// Replaced by the target's hashed reference.
    Rewritten,
    /// Left pointing at the original name to break a dependency cycle.
    UnresolvedDueToCycle,
}

impl DependencyStatus {
    /// Diagnostic label used in the manifest and logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::External => "external",
            Self::Pending => "pending",
            Self::Rewritten => "rewritten",
            Self::UnresolvedDueToCycle => "unresolved-due-to-cycle",
        }
    }
}

/// One reference from a document to another asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dependency {
    /// Literal reference text, including any query string or fragment.
    pub specifier: String,
    /// Resolved absolute path, `None` for external references.
    pub file_path: Option<PathBuf>,
    /// Extension of the resolved file, without the dot.
    pub file_extension: Option<String>,
    /// `?query` / `#fragment` tail carried over verbatim after rewriting.
    pub suffix: String,
    /// Byte range of `specifier` in the owning document at extraction time.
    pub position: Position,
    /// Rewrite outcome.
    pub status: DependencyStatus,
}

impl Dependency {
    /// Dependency on an in-tree file.
    #[must_use]
    pub fn internal(specifier: impl Into<String>, file_path: PathBuf, suffix: impl Into<String>, position: Position) -> Self {
        let file_extension = file_path.extension().map(|e| e.to_string_lossy().into_owned());
        Self {
            specifier: specifier.into(),
            file_path: Some(file_path),
            file_extension,
            suffix: suffix.into(),
            position,
            status: DependencyStatus::Pending,
        }
    }

    /// Reference to something outside the tree.
    #[must_use]
    pub fn external(specifier: impl Into<String>, position: Position) -> Self {
        Self {
            specifier: specifier.into(),
            file_path: None,
            file_extension: None,
            suffix: String::new(),
            position,
            status: DependencyStatus::External,
        }
    }

    /// Whether this dependency is a graph edge.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        self.file_path.is_some()
    }
}

/// A source map that travels with its owning document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceMapRef {
    /// Absolute path of the map file
    pub path: PathBuf,
    /// Range of the `sourceMappingURL` value in the owning document
    pub position: Position,
    /// Query or fragment after the map URL
    pub suffix: String,
}

/// How a document came to be part of the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentOrigin {
    /// Parsed by the named plugin; always hashed and renamed.
    Parsed(&'static str),
    /// Matched by no plugin; hashed only when something references it.
    PassThrough,
}

/// In-memory record of one asset file.
#[derive(Debug, Clone)]
pub struct Document {
    /// Absolute path, unique key within a run.
    pub file_path: PathBuf,
    /// Forward-slash path relative to the build root.
    pub relative_path: String,
    /// Raw contents as read, then the final bytes once finalized.
    pub contents: Vec<u8>,
    /// References in order of appearance.
    pub dependencies: Vec<Dependency>,
    /// Assigned once during finalization.
    pub content_hash: Option<String>,
    /// Optional passenger source map.
    pub source_map: Option<SourceMapRef>,
    /// Plugin or pass-through.
    pub origin: DocumentOrigin,
    /// Final absolute path, set during finalization.
    pub output_path: Option<PathBuf>,
}

impl Document {
    /// New, unfinalized document.
    #[must_use]
    pub fn new(file_path: PathBuf, relative_path: String, contents: Vec<u8>, origin: DocumentOrigin) -> Self {
        Self {
            file_path,
            relative_path,
            contents,
            dependencies: Vec::new(),
            content_hash: None,
            source_map: None,
            origin,
            output_path: None,
        }
    }

    /// Document for a file no plugin claimed: identity extraction, no dependencies.
    #[must_use]
    pub fn pass_through(file_path: PathBuf, relative_path: String, contents: Vec<u8>) -> Self {
        Self::new(file_path, relative_path, contents, DocumentOrigin::PassThrough)
    }

    /// Attach dependencies.
    #[must_use]
    pub fn with_dependencies(mut self, dependencies: Vec<Dependency>) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Attach a source map.
    #[must_use]
    pub fn with_source_map(mut self, source_map: Option<SourceMapRef>) -> Self {
        self.source_map = source_map;
        self
    }

    /// Whether the hasher has finalized this document.
    #[must_use]
    pub const fn is_final(&self) -> bool {
        self.output_path.is_some()
    }

    /// Whether the document was parsed by a plugin.
    #[must_use]
    pub const fn is_parsed(&self) -> bool {
        matches!(self.origin, DocumentOrigin::Parsed(_))
    }

    /// Distinct in-tree targets, sorted.
    #[must_use]
    pub fn targets(&self) -> Vec<&Path> {
        let mut targets: Vec<&Path> =
            self.dependencies.iter().filter_map(|d| d.file_path.as_deref()).collect();
        targets.sort();
        targets.dedup();
        targets
    }

    /// Directory containing the document; references are relative to it.
    #[must_use]
    pub fn directory(&self) -> &Path {
        self.file_path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Whether the output lands somewhere other than the original file.
    #[must_use]
    pub fn is_renamed(&self) -> bool {
        self.output_path.as_ref().is_some_and(|out| out != &self.file_path)
    }

    /// Whether the document received a content hash (and therefore a hashed name).
    #[must_use]
    pub const fn is_hashed(&self) -> bool {
        self.content_hash.is_some()
    }

    /// Where the passenger source map is written: next to the output, named
    /// after it with `.map` appended. `None` unless the document is hashed.
    #[must_use]
    pub fn source_map_output(&self) -> Option<PathBuf> {
        self.source_map.as_ref()?;
        let output = self.output_path.as_ref().filter(|_| self.is_hashed())?;
        let mut name = output.as_os_str().to_owned();
        name.push(".map");
        Some(PathBuf::from(name))
    }

    /// Record the outcome of the single rewrite.
    ///
    /// Finalizing twice is a logic error in the hasher.
    pub fn finalize(&mut self, contents: Vec<u8>, content_hash: Option<String>, output_path: PathBuf) {
        debug_assert!(!self.is_final(), "document {} finalized twice", self.relative_path);
        self.contents = contents;
        self.content_hash = content_hash;
        self.output_path = Some(output_path);
    }
}
