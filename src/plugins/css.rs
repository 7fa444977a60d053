//! Stylesheet references: `@import` and `url()`.

use super::mask::{self, CSS};
use super::{ParsedAsset, Plugin, capture_reference, has_extension};
use crate::core::CachebustError;
use crate::document::RawReference;
use crate::resolver::ResolveOptions;
use regex::bytes::Regex;
use std::path::Path;

/// Finds `@import` and `url()` references in CSS text.
///
/// Shared by the CSS plugin and by the HTML plugin for `<style>` blocks and
/// `style` attributes.
#[derive(Debug, Clone)]
pub struct CssScanner {
    import: Regex,
    url: Regex,
}

impl CssScanner {
    /// Compile the scanner patterns.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            import: Regex::new(r#"(?i-u)@import\s+(?:"([^"\n]*)"|'([^'\n]*)')"#)?,
            url: Regex::new(r#"(?i-u)\burl\(\s*(?:"([^"\n]*)"|'([^'\n]*)'|([^)"'\s]+))\s*\)"#)?,
        })
    }

    /// References in `css` (already comment-masked), with positions shifted by `offset`.
    #[must_use]
    pub fn scan(&self, css: &[u8], offset: usize) -> Vec<RawReference> {
        let imports = self.import.captures_iter(css).filter_map(|c| capture_reference(&c, &[1, 2], offset));
        let urls = self.url.captures_iter(css).filter_map(|c| capture_reference(&c, &[1, 2, 3], offset));
        imports.chain(urls).collect()
    }
}

/// Plugin for `.css` files.
#[derive(Debug, Clone)]
pub struct CssPlugin {
    scanner: CssScanner,
    source_map: Regex,
    options: ResolveOptions,
}

impl CssPlugin {
    /// Create the plugin.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            scanner: CssScanner::new()?,
            source_map: Regex::new(r"(?-u)/\*[#@][ \t]*sourceMappingURL=([^\s*]+)[ \t]*\*/")?,
            options: ResolveOptions::new().with_extensions(&[".css"]).with_main_fields(&["style"]),
        })
    }
}

impl Plugin for CssPlugin {
    fn name(&self) -> &'static str {
        "css"
    }

    fn matches(&self, path: &Path) -> bool {
        has_extension(path, &["css"])
    }

    fn resolve_options(&self) -> &ResolveOptions {
        &self.options
    }

    fn parse(&self, _path: &Path, contents: &[u8]) -> Result<Option<ParsedAsset>, CachebustError> {
        let masked = mask::mask_comments(contents, CSS);
        let references = self.scanner.scan(&masked, 0);

        let source_map =
            self.source_map.captures_iter(contents).filter_map(|c| capture_reference(&c, &[1], 0)).last();

        Ok(Some(ParsedAsset::new(references).with_source_map(source_map)))
    }
}
