//! Source maps are never documents of their own.
//!
//! A map is renamed together with the script or stylesheet whose
//! `sourceMappingURL` names it. Claiming `.map` files here keeps them out of the
//! pass-through set, so an orphaned map is left exactly where it is.

use super::{ParsedAsset, Plugin, has_extension};
use crate::core::CachebustError;
use crate::resolver::ResolveOptions;
use std::path::Path;

/// Claims `.map` files and always skips them.
#[derive(Debug, Clone, Default)]
pub struct SourceMapPlugin {
    options: ResolveOptions,
}

impl SourceMapPlugin {
    /// Create the plugin.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Plugin for SourceMapPlugin {
    fn name(&self) -> &'static str {
        "source-map"
    }

    fn matches(&self, path: &Path) -> bool {
        has_extension(path, &["map"])
    }

    fn resolve_options(&self) -> &ResolveOptions {
        &self.options
    }

    fn parse(&self, path: &Path, _contents: &[u8]) -> Result<Option<ParsedAsset>, CachebustError> {
        tracing::trace!("Leaving source map {} to its owner", path.display());
        Ok(None)
    }
}
