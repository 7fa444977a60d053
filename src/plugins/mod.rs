//! Per-file-type dependency extraction.
//!
//! A [`Plugin`] claims files by path and turns their raw bytes into the
//! references they contain. Plugins only *find* references; resolving them to
//! files is the [`Resolver`](crate::resolver::Resolver)'s job, driven by the
//! [`ResolveOptions`] each plugin declares for its file type.
//!
//! Plugins are tried in registry order and the first one whose
//! [`matches`](Plugin::matches) returns `true` owns the file. Its
//! [`parse`](Plugin::parse) is called at most once per file and may return
//! `None` to skip the file entirely (it then never becomes a document).
//!
//! # Built-in plugins
//!
//! | Name | Files | Extracts |
//! |------|-------|----------|
//! | `html` | `.html`, `.htm` | tag attributes, `srcset` candidates, inline CSS `url()` |
//! | `css` | `.css` | `@import`, `url()`, `sourceMappingURL` |
//! | `javascript` | `.js`, `.mjs`, `.cjs` | static/dynamic imports, re-exports, `new URL(.., import.meta.url)`, `sourceMappingURL` |
//! | `source-map` | `.map` | nothing; maps travel with the file that names them |

pub mod css;
pub mod html;
pub mod javascript;
pub mod mask;
pub mod source_map;

pub use css::CssPlugin;
pub use html::HtmlPlugin;
pub use javascript::JavaScriptPlugin;
pub use source_map::SourceMapPlugin;

use crate::core::CachebustError;
use crate::document::RawReference;
use crate::resolver::ResolveOptions;
use regex::bytes::Captures;
use std::path::Path;
use std::sync::Arc;

/// References extracted from one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedAsset {
    /// References in order of appearance.
    pub references: Vec<RawReference>,
    /// Value of a trailing `sourceMappingURL` comment, if any.
    pub source_map: Option<RawReference>,
}

impl ParsedAsset {
    /// Asset with the given references and no source map.
    #[must_use]
    pub fn new(mut references: Vec<RawReference>) -> Self {
        references.sort_by_key(|r| r.position);
        references.dedup_by_key(|r| r.position);
        Self {
            references,
            source_map: None,
        }
    }

    /// Attach a source map reference.
    #[must_use]
    pub fn with_source_map(mut self, source_map: Option<RawReference>) -> Self {
        self.source_map = source_map;
        self
    }
}

/// A dependency extractor for one family of file types.
pub trait Plugin: Send + Sync {
    /// Short, stable name used in logs and the registry dump.
    fn name(&self) -> &'static str;

    /// Whether this plugin claims the file.
    fn matches(&self, path: &Path) -> bool;

    /// How extensionless and directory specifiers found by this plugin are probed.
    fn resolve_options(&self) -> &ResolveOptions;

    /// Extract references. `Ok(None)` means "skip this file".
    fn parse(&self, path: &Path, contents: &[u8]) -> Result<Option<ParsedAsset>, CachebustError>;
}

/// Ordered list of plugins; first match wins.
#[derive(Clone, Default)]
pub struct PluginRegistry {
    plugins: Vec<Arc<dyn Plugin>>,
}

impl PluginRegistry {
    /// Empty registry: every file is a pass-through.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in plugins in their standard order.
    pub fn with_defaults() -> Result<Self, CachebustError> {
        let mut registry = Self::new();
        registry.register(Arc::new(HtmlPlugin::new().map_err(|e| compile_error("html", &e))?));
        registry.register(Arc::new(CssPlugin::new().map_err(|e| compile_error("css", &e))?));
        registry.register(Arc::new(JavaScriptPlugin::new().map_err(|e| compile_error("javascript", &e))?));
        registry.register(Arc::new(SourceMapPlugin::new()));
        Ok(registry)
    }

    /// Append a plugin; it is consulted after every plugin already registered.
    pub fn register(&mut self, plugin: Arc<dyn Plugin>) {
        self.plugins.push(plugin);
    }

    /// Insert a plugin ahead of every plugin already registered.
    pub fn push_front(&mut self, plugin: Arc<dyn Plugin>) {
        self.plugins.insert(0, plugin);
    }

    /// First plugin claiming `path`.
    #[must_use]
    pub fn find(&self, path: &Path) -> Option<&dyn Plugin> {
        self.plugins.iter().find(|p| p.matches(path)).map(|p| &**p)
    }

    /// Plugin names in registry order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    /// Number of registered plugins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Whether no plugin is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry").field("plugins", &self.names()).finish()
    }
}

fn compile_error(plugin: &str, error: &regex::Error) -> CachebustError {
    CachebustError::PluginError {
        plugin: plugin.to_string(),
        path: String::new(),
        reason: format!("invalid pattern: {error}"),
    }
}

/// Whether the file name ends in one of `extensions` (without dot, case-insensitive).
pub(crate) fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|candidate| ext.eq_ignore_ascii_case(candidate)))
}

/// First participating group among `groups`, as a reference shifted by `offset`.
///
/// Patterns express quoting styles as alternatives (`"(..)"|'(..)'|(..)`), so at
/// most one of the groups takes part in a match. Non-UTF-8 values are skipped.
pub(crate) fn capture_reference(captures: &Captures<'_>, groups: &[usize], offset: usize) -> Option<RawReference> {
    groups.iter().find_map(|index| captures.get(*index)).and_then(|m| {
        let text = std::str::from_utf8(m.as_bytes()).ok()?;
        Some(RawReference::new(text, offset + m.start(), offset + m.end()))
    })
}
