//! The asset manifest.
//!
//! A flat JSON object mapping every hashed file's original root-relative path
//! to its final path (root-relative, or qualified with the configured base URL).
//! Keys are sorted. When breaking a dependency cycle left stale references
//! behind, the reserved `#diagnostics` key lists them:
//!
//! ```json
//! {
//!   "#diagnostics": [
//!     {
//!       "document": "a.css",
//!       "specifier": "b.css",
//!       "target": "b.css",
//!       "reason": "unresolved-due-to-cycle"
//!     }
//!   ],
//!   "a.css": "a.1f2e3d4c.css",
//!   "b.css": "b.9a8b7c6d.css"
//! }
//! ```

use crate::config::Config;
use crate::constants::DIAGNOSTICS_KEY;
use crate::core::CachebustError;
use crate::document::DependencyStatus;
use crate::graph::AssetGraph;
use crate::utils::fs::FileSystem;
use crate::utils::paths::relative_to_root;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// A reference left pointing at an original file name to break a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleDiagnostic {
    /// Root-relative path of the document holding the stale reference
    pub document: String,
    /// The reference text, left as authored
    pub specifier: String,
    /// Root-relative path of the file it points at
    pub target: String,
    /// Always `unresolved-due-to-cycle`
    pub reason: String,
}

impl CycleDiagnostic {
    /// Diagnostic for one stale reference.
    #[must_use]
    pub fn new(document: impl Into<String>, specifier: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            specifier: specifier.into(),
            target: target.into(),
            reason: DependencyStatus::UnresolvedDueToCycle.as_str().to_string(),
        }
    }
}

/// Original path to final path, plus cycle diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Stale references left by cycle breaking.
    #[serde(rename = "#diagnostics", default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<CycleDiagnostic>,

    /// Original root-relative path to final path.
    #[serde(flatten)]
    pub entries: BTreeMap<String, String>,
}

impl Manifest {
    /// Empty manifest.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Manifest for every hashed document of a finalized graph.
    ///
    /// Documents whose relative path is in `failed` are left out; their output
    /// may not exist.
    #[must_use]
    pub fn from_graph(
        graph: &AssetGraph,
        config: &Config,
        diagnostics: &[CycleDiagnostic],
        failed: &HashSet<String>,
    ) -> Self {
        let mut manifest = Self::new();

        for document in graph.documents() {
            if !document.is_hashed() || failed.contains(&document.relative_path) {
                continue;
            }
            let Some(output) =
                document.output_path.as_deref().and_then(|out| relative_to_root(config.output_root(), out))
            else {
                continue;
            };
            manifest.insert(document.relative_path.clone(), qualify(config.base_url.as_deref(), &output));
        }

        manifest.diagnostics = diagnostics.to_vec();
        manifest
    }

    /// Record one mapping.
    pub fn insert(&mut self, original: impl Into<String>, output: impl Into<String>) {
        let original = original.into();
        debug_assert_ne!(original, DIAGNOSTICS_KEY);
        self.entries.insert(original, output.into());
    }

    /// Final path recorded for `original`.
    #[must_use]
    pub fn get(&self, original: &str) -> Option<&str> {
        self.entries.get(original).map(String::as_str)
    }

    /// Number of mappings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no mappings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pretty JSON with a trailing newline.
    pub fn to_json(&self) -> Result<String, CachebustError> {
        let mut json = serde_json::to_string_pretty(self).map_err(|e| CachebustError::ManifestError {
            message: format!("failed to serialize manifest: {e}"),
        })?;
        json.push('\n');
        Ok(json)
    }

    /// Parse a manifest written by [`Manifest::to_json`].
    pub fn from_json(json: &str) -> Result<Self, CachebustError> {
        serde_json::from_str(json).map_err(|e| CachebustError::ManifestError {
            message: format!("failed to parse manifest: {e}"),
        })
    }

    /// Write the manifest through the file system collaborator.
    pub fn save(&self, fs: &dyn FileSystem, path: &Path) -> Result<(), CachebustError> {
        let json = self.to_json()?;
        fs.write(path, json.as_bytes())?;
        tracing::info!("Wrote manifest with {} entries to {}", self.len(), path.display());
        Ok(())
    }
}

/// Root-relative output path, prefixed with the base URL when one is configured.
#[must_use]
pub fn qualify(base_url: Option<&str>, relative: &str) -> String {
    match base_url {
        Some(base) => format!("{base}/{relative}"),
        None => relative.to_string(),
    }
}
