//! HTML references: URL-valued attributes, `srcset` candidates and inline CSS.

use super::css::CssScanner;
use super::mask::{self, HTML};
use super::{ParsedAsset, Plugin, capture_reference, has_extension};
use crate::core::CachebustError;
use crate::document::RawReference;
use crate::resolver::ResolveOptions;
use regex::bytes::{Captures, Regex};
use std::path::Path;

/// Attributes holding a single URL, per element.
const URL_ATTRIBUTES: &[(&str, &[&str])] = &[
    ("script", &["src"]),
    ("link", &["href"]),
    ("img", &["src"]),
    ("source", &["src"]),
    ("video", &["src", "poster"]),
    ("audio", &["src"]),
    ("track", &["src"]),
    ("iframe", &["src"]),
    ("embed", &["src"]),
    ("object", &["data"]),
    ("input", &["src"]),
    ("a", &["href"]),
    ("area", &["href"]),
    ("use", &["href", "xlink:href"]),
    ("image", &["href", "xlink:href"]),
];

/// Elements whose `srcset` lists candidate URLs.
const SRCSET_ELEMENTS: &[&str] = &["img", "source"];

/// Plugin for `.html` and `.htm` files.
#[derive(Debug, Clone)]
pub struct HtmlPlugin {
    tag: Regex,
    attribute: Regex,
    raw_text: Regex,
    css: CssScanner,
    options: ResolveOptions,
}

impl HtmlPlugin {
    /// Create the plugin.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            tag: Regex::new(r#"(?-u)<([A-Za-z][A-Za-z0-9:-]*)((?:[^>"']|"[^"]*"|'[^']*')*)>"#)?,
            attribute: Regex::new(
                r#"(?-u)([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+))"#,
            )?,
            raw_text: Regex::new(r"(?is-u)<(script|style)\b[^>]*>(.*?)</(?:script|style)\s*>")?,
            css: CssScanner::new()?,
            options: ResolveOptions::new(),
        })
    }

    fn scan_tag(&self, name: &str, attributes: &[u8], offset: usize, references: &mut Vec<RawReference>) {
        let url_attributes =
            URL_ATTRIBUTES.iter().find(|(element, _)| *element == name).map_or(&[][..], |(_, attrs)| *attrs);

        for captures in self.attribute.captures_iter(attributes) {
            let Some(attribute) = captures.get(1).map(|m| String::from_utf8_lossy(m.as_bytes()).to_ascii_lowercase())
            else {
                continue;
            };

            if url_attributes.contains(&attribute.as_str()) {
                if let Some(reference) = capture_reference(&captures, &[2, 3, 4], offset) {
                    references.push(reference);
                }
            } else if attribute == "srcset" && SRCSET_ELEMENTS.contains(&name) {
                if let Some(value) = value_group(&captures) {
                    references.extend(srcset_candidates(value.as_bytes(), offset + value.start()));
                }
            } else if attribute == "style" {
                if let Some(value) = value_group(&captures) {
                    references.extend(self.css.scan(value.as_bytes(), offset + value.start()));
                }
            }
        }
    }
}

impl Plugin for HtmlPlugin {
    fn name(&self) -> &'static str {
        "html"
    }

    fn matches(&self, path: &Path) -> bool {
        has_extension(path, &["html", "htm"])
    }

    fn resolve_options(&self) -> &ResolveOptions {
        &self.options
    }

    fn parse(&self, _path: &Path, contents: &[u8]) -> Result<Option<ParsedAsset>, CachebustError> {
        let mut masked = mask::mask_comments(contents, HTML);
        let mut references = Vec::new();

        // Raw text bodies are not markup; scan <style> as CSS, then hide both kinds from the tag scan.
        let bodies: Vec<(bool, usize, usize)> = self
            .raw_text
            .captures_iter(&masked)
            .filter_map(|c| {
                let element = c.get(1)?.as_bytes().eq_ignore_ascii_case(b"style");
                let body = c.get(2)?;
                Some((element, body.start(), body.end()))
            })
            .collect();

        for (is_style, start, end) in bodies {
            if is_style {
                let css = mask::mask_comments(&masked[start..end], mask::CSS);
                references.extend(self.css.scan(&css, start));
            }
            mask::blank(&mut masked, start, end);
        }

        for captures in self.tag.captures_iter(&masked) {
            let (Some(name), Some(attributes)) = (captures.get(1), captures.get(2)) else {
                continue;
            };
            let name = String::from_utf8_lossy(name.as_bytes()).to_ascii_lowercase();
            self.scan_tag(&name, attributes.as_bytes(), attributes.start(), &mut references);
        }

        Ok(Some(ParsedAsset::new(references)))
    }
}

fn value_group<'h>(captures: &Captures<'h>) -> Option<regex::bytes::Match<'h>> {
    [2, 3, 4].iter().find_map(|index| captures.get(*index))
}

/// Each candidate URL of a `srcset` value, positioned at `offset`.
///
/// Candidates are separated by commas; a URL runs to the first whitespace and is
/// followed by optional width/density descriptors.
fn srcset_candidates(value: &[u8], offset: usize) -> Vec<RawReference> {
    let mut references = Vec::new();
    let mut i = 0;

    while i < value.len() {
        while i < value.len() && (value[i].is_ascii_whitespace() || value[i] == b',') {
            i += 1;
        }
        let start = i;
        while i < value.len() && !value[i].is_ascii_whitespace() {
            i += 1;
        }
        let mut end = i;
        while end > start && value[end - 1] == b',' {
            end -= 1;
        }
        if end > start {
            if let Ok(url) = std::str::from_utf8(&value[start..end]) {
                references.push(RawReference::new(url, offset + start, offset + end));
            }
        }
        if end < i {
            // Trailing comma consumed with the URL; no descriptors follow.
            continue;
        }
        while i < value.len() && value[i] != b',' {
            i += 1;
        }
    }

    references
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(html: &str) -> Vec<String> {
        let asset = HtmlPlugin::new().unwrap().parse(Path::new("index.html"), html.as_bytes()).unwrap().unwrap();
        asset
            .references
            .iter()
            .map(|r| {
                assert_eq!(&html[r.position.start..r.position.end], r.specifier);
                r.specifier.clone()
            })
            .collect()
    }

    #[test]
    fn test_attribute_quoting_styles() {
        let html = r#"<script src="/app.js"></script><img src='logo.png' alt="x"><link rel=stylesheet href=site.css>"#;
        assert_eq!(parse(html), vec!["/app.js", "logo.png", "site.css"]);
    }

    #[test]
    fn test_only_url_attributes_of_known_elements() {
        let html = r#"<div src="nope.png" data-src="no.png"></div><a href="about.html" title="x.png">x</a><video src="v.mp4" poster="p.jpg"></video>"#;
        assert_eq!(parse(html), vec!["about.html", "v.mp4", "p.jpg"]);
    }

    #[test]
    fn test_srcset_candidates() {
        let html = r#"<img srcset="a.png 1x, b.png 2x,c.png" src="a.png"><source srcset="wide.jpg 800w">"#;
        assert_eq!(parse(html), vec!["a.png", "b.png", "c.png", "a.png", "wide.jpg"]);
    }

    #[test]
    fn test_comments_are_ignored() {
        let html = "<!-- <img src=\"old.png\"> -->\n<img src=\"new.png\">";
        assert_eq!(parse(html), vec!["new.png"]);
    }

    #[test]
    fn test_inline_css() {
        let html = r#"<style>
/* url(skip.png) */
body { background: url("bg.png") }
</style><div style="background: url(hero.jpg)"></div>"#;
        assert_eq!(parse(html), vec!["bg.png", "hero.jpg"]);
    }

    #[test]
    fn test_inline_script_text_is_not_markup() {
        let html = r#"<script>document.write('<img src="x.png">')</script><script src="real.js"></script>"#;
        assert_eq!(parse(html), vec!["real.js"]);
    }

    #[test]
    fn test_quoted_gt_inside_attribute() {
        let html = r#"<a title="1 > 0" href="x.html">x</a>"#;
        assert_eq!(parse(html), vec!["x.html"]);
    }

    #[test]
    fn test_svg_use_xlink() {
        let html = r##"<svg><use xlink:href="sprite.svg#icon"></use></svg>"##;
        assert_eq!(parse(html), vec!["sprite.svg#icon"]);
    }

    #[test]
    fn test_srcset_offsets() {
        let refs = srcset_candidates(b" a.png 1x , b.png", 10);
        assert_eq!(refs[0].position.start, 11);
        assert_eq!(refs[0].position.end, 16);
        assert_eq!(refs[1].specifier, "b.png");
        assert_eq!(refs[1].position.start, 22);
    }
}
