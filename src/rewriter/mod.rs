//! Single-pass content rewriting.
//!
//! All replacements for a document are applied at once: the output is built by
//! copying the untouched spans between the sorted ranges and substituting the
//! replacement text for each range. Offsets therefore always refer to the
//! contents as extracted, no matter how long the replacement strings are.

use crate::core::CachebustError;
use crate::document::Position;

/// Text to put in place of one range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    /// Range in the original contents
    pub position: Position,
    /// New text for the range
    pub text: String,
}

impl Replacement {
    /// Create a replacement.
    #[must_use]
    pub fn new(position: Position, text: impl Into<String>) -> Self {
        Self {
            position,
            text: text.into(),
        }
    }
}

/// Apply `replacements` to `contents`.
///
/// `path` only names the document in errors. Fails with
/// [`CachebustError::Overlap`] if two ranges share a byte and with
/// [`CachebustError::OutOfBounds`] if a range does not fit in `contents`.
///
/// # Examples
///
/// ```rust
/// use cachebust_cli::document::Position;
/// use cachebust_cli::rewriter::{Replacement, rewrite};
///
/// let html = br#"<script src="/app.js"></script>"#;
/// let out = rewrite("index.html", html, vec![Replacement::new(Position::new(13, 20), "app.1a2b.js")]).unwrap();
/// assert_eq!(out, br#"<script src="app.1a2b.js"></script>"#.to_vec());
/// ```
pub fn rewrite(path: &str, contents: &[u8], mut replacements: Vec<Replacement>) -> Result<Vec<u8>, CachebustError> {
    if replacements.is_empty() {
        return Ok(contents.to_vec());
    }

    replacements.sort_by_key(|r| (r.position.start, r.position.end));

    let mut previous: Option<Position> = None;
    for replacement in &replacements {
        let position = replacement.position;
        if position.start > position.end || position.end > contents.len() {
            return Err(CachebustError::OutOfBounds {
                path: path.to_string(),
                start: position.start,
                end: position.end,
                len: contents.len(),
            });
        }
        if let Some(prev) = previous {
            if prev.end > position.start {
                return Err(CachebustError::Overlap {
                    path: path.to_string(),
                    first: (prev.start, prev.end),
                    second: (position.start, position.end),
                });
            }
        }
        previous = Some(position);
    }

    let added: usize = replacements.iter().map(|r| r.text.len()).sum();
    let mut output = Vec::with_capacity(contents.len() + added);
    let mut cursor = 0;
    for replacement in &replacements {
        output.extend_from_slice(&contents[cursor..replacement.position.start]);
        output.extend_from_slice(replacement.text.as_bytes());
        cursor = replacement.position.end;
    }
    output.extend_from_slice(&contents[cursor..]);

    Ok(output)
}
