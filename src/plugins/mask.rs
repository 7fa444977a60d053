//! Comment masking.
//!
//! Plugins scan a copy of the contents in which every comment byte has been
//! replaced by a space. Offsets in the masked copy are identical to offsets in the
//! original, so a match in the masked text can be reported directly as a
//! [`Position`](crate::document::Position) in the real contents.

/// Comment and string syntax of a language, as far as masking cares.
#[derive(Debug, Clone, Copy)]
pub struct CommentSyntax {
    /// Block comment delimiters, e.g. `/*` and `*/`.
    pub block: (&'static [u8], &'static [u8]),
    /// Whether `//` starts a comment running to the end of the line.
    pub line: bool,
    /// Quote characters that open string literals; comments never start inside one.
    pub quotes: &'static [u8],
}

/// CSS: `/* */` only.
pub const CSS: CommentSyntax = CommentSyntax {
    block: (b"/*", b"*/"),
    line: false,
    quotes: b"\"'",
};

/// JavaScript: `/* */` and `//`, with template literals as strings.
pub const JAVASCRIPT: CommentSyntax = CommentSyntax {
    block: (b"/*", b"*/"),
    line: true,
    quotes: b"\"'`",
};

/// HTML: `<!-- -->`; attribute quotes are not tracked.
pub const HTML: CommentSyntax = CommentSyntax {
    block: (b"<!--", b"-->"),
    line: false,
    quotes: b"",
};

/// Copy of `contents` with every comment byte replaced by a space.
///
/// Newlines inside comments are kept so line-anchored patterns still work.
/// An unterminated comment or string runs to the end of the input.
#[must_use]
pub fn mask_comments(contents: &[u8], syntax: CommentSyntax) -> Vec<u8> {
    let mut masked = contents.to_vec();
    let (open, close) = syntax.block;
    let mut i = 0;

    while i < contents.len() {
        let byte = contents[i];

        if syntax.quotes.contains(&byte) {
            i = skip_string(contents, i);
            continue;
        }

        if contents[i..].starts_with(open) {
            let end = find(contents, close, i + open.len()).map_or(contents.len(), |at| at + close.len());
            blank(&mut masked, i, end);
            i = end;
            continue;
        }

        if syntax.line && contents[i..].starts_with(b"//") {
            let end = find(contents, b"\n", i).unwrap_or(contents.len());
            blank(&mut masked, i, end);
            i = end;
            continue;
        }

        i += 1;
    }

    masked
}

/// Blank out `masked[start..end]`, keeping line breaks.
pub fn blank(masked: &mut [u8], start: usize, end: usize) {
    let end = end.min(masked.len());
    for byte in &mut masked[start..end] {
        if *byte != b'\n' && *byte != b'\r' {
            *byte = b' ';
        }
    }
}

/// Index just past the string literal opening at `start`.
fn skip_string(contents: &[u8], start: usize) -> usize {
    let quote = contents[start];
    let mut i = start + 1;
    while i < contents.len() {
        match contents[i] {
            b'\\' => i += 2,
            b'\n' if quote != b'`' => return i + 1,
            b if b == quote => return i + 1,
            _ => i += 1,
        }
    }
    contents.len()
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from >= haystack.len() {
        return None;
    }
    haystack[from..].windows(needle.len()).position(|w| w == needle).map(|at| at + from)
}
