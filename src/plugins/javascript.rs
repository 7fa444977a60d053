//! JavaScript module references.
//!
//! Only string literals are followed. Computed specifiers such as
//! `import(base + name)` are left alone; there is no text to rewrite.

use super::mask::{self, JAVASCRIPT};
use super::{ParsedAsset, Plugin, capture_reference, has_extension};
use crate::core::CachebustError;
use crate::resolver::ResolveOptions;
use regex::bytes::Regex;
use std::path::Path;

/// Plugin for `.js`, `.mjs` and `.cjs` files.
#[derive(Debug, Clone)]
pub struct JavaScriptPlugin {
    patterns: Vec<Regex>,
    source_map: Regex,
    options: ResolveOptions,
}

impl JavaScriptPlugin {
    /// Create the plugin.
    pub fn new() -> Result<Self, regex::Error> {
        let patterns = [
            // import x from "..."; export { x } from "..."; export * from "..."
            r#"(?-u)\b(?:import|export)\b[^;"'`()]*?\bfrom\s*(?:"([^"\n]*)"|'([^'\n]*)')"#,
            // import "..."
            r#"(?-u)\bimport\s*(?:"([^"\n]*)"|'([^'\n]*)')"#,
            // import("...")
            r#"(?-u)\bimport\s*\(\s*(?:"([^"\n]*)"|'([^'\n]*)'|`([^`$\n]*)`)\s*[,)]"#,
            // new URL("...", import.meta.url)
            r#"(?-u)\bnew\s+URL\s*\(\s*(?:"([^"\n]*)"|'([^'\n]*)'|`([^`$\n]*)`)\s*,\s*import\.meta\.url\s*\)"#,
        ]
        .iter()
        .map(|pattern| Regex::new(pattern))
        .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            patterns,
            source_map: Regex::new(r"(?m-u)^[ \t]*//[#@][ \t]*sourceMappingURL=(\S+)[ \t]*\r?$")?,
            options: ResolveOptions::new()
                .with_extensions(&[".js", ".mjs", ".cjs", ".json"])
                .with_main_fields(&["browser", "module", "main"]),
        })
    }
}

impl Plugin for JavaScriptPlugin {
    fn name(&self) -> &'static str {
        "javascript"
    }

    fn matches(&self, path: &Path) -> bool {
        has_extension(path, &["js", "mjs", "cjs"])
    }

    fn resolve_options(&self) -> &ResolveOptions {
        &self.options
    }

    fn parse(&self, _path: &Path, contents: &[u8]) -> Result<Option<ParsedAsset>, CachebustError> {
        let masked = mask::mask_comments(contents, JAVASCRIPT);

        let references = self
            .patterns
            .iter()
            .flat_map(|pattern| {
                pattern.captures_iter(&masked).filter_map(|c| capture_reference(&c, &[1, 2, 3], 0)).collect::<Vec<_>>()
            })
            .collect();

        let source_map =
            self.source_map.captures_iter(contents).filter_map(|c| capture_reference(&c, &[1], 0)).last();

        Ok(Some(ParsedAsset::new(references).with_source_map(source_map)))
    }
}
