//! Classification of raw specifier text.
//!
//! These helpers decide, from the text alone, whether a specifier can ever name
//! an in-tree file, split off query strings and fragments, and detect whether the
//! author clearly meant a file (it has an extension).

/// Whether the specifier names something outside the build tree.
///
/// External specifiers are never rewritten and never become graph edges:
/// - scheme-qualified URLs (`https:`, `mailto:`, `data:`, `javascript:`, ...)
/// - protocol-relative URLs (`//cdn.example.com/x.js`)
/// - empty specifiers and fragment-only (`#top`) or query-only (`?a=1`) links
/// - template placeholders left in the output (`{{ url }}`, `${base}`)
///
/// # Examples
///
/// ```rust
/// use cachebust_cli::resolver::specifier::is_external;
///
/// assert!(is_external("https://example.com/x.png"));
/// assert!(is_external("//cdn.example.com/app.js"));
/// assert!(is_external("data:image/png;base64,AAAA"));
/// assert!(!is_external("./logo.png"));
/// assert!(!is_external("/js/app.js"));
/// ```
#[must_use]
pub fn is_external(specifier: &str) -> bool {
    let trimmed = specifier.trim();

    if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('?') {
        return true;
    }

    if trimmed.starts_with("//") || trimmed.starts_with("\\\\") {
        return true;
    }

    if trimmed.contains("{{") || trimmed.contains("${") || trimmed.contains("<%") {
        return true;
    }

    has_scheme(trimmed)
}

/// `scheme ":"` where scheme is `ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )`.
fn has_scheme(specifier: &str) -> bool {
    let Some((scheme, _)) = specifier.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Split a specifier into its path and its `?query`/`#fragment` tail.
///
/// # Examples
///
/// ```rust
/// use cachebust_cli::resolver::specifier::split_suffix;
///
/// assert_eq!(split_suffix("logo.png?v=2#x"), ("logo.png", "?v=2#x"));
/// assert_eq!(split_suffix("a.css"), ("a.css", ""));
/// ```
#[must_use]
pub fn split_suffix(specifier: &str) -> (&str, &str) {
    match specifier.find(['?', '#']) {
        Some(index) => specifier.split_at(index),
        None => (specifier, ""),
    }
}

/// Whether the last path segment carries a recognizable file extension.
///
/// A recognizable extension is 1-8 ASCII alphanumerics containing at least one
/// letter, so `app.js` and `font.woff2` qualify while `/blog/` and `v1.2` don't.
#[must_use]
pub fn has_file_extension(path: &str) -> bool {
    let segment = path.rsplit('/').next().unwrap_or(path);
    let Some((stem, extension)) = segment.rsplit_once('.') else {
        return false;
    };

    !stem.is_empty()
        && (1..=8).contains(&extension.len())
        && extension.chars().all(|c| c.is_ascii_alphanumeric())
        && extension.chars().any(|c| c.is_ascii_alphabetic())
}

/// Decode `%XX` escapes in a path, if any.
///
/// Returns `None` when the text has no escapes or decodes to invalid UTF-8.
#[must_use]
pub fn percent_decode(path: &str) -> Option<String> {
    if !path.contains('%') {
        return None;
    }

    let bytes = path.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(high), Some(low)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                decoded.push(high * 16 + low);
                i += 3;
                continue;
            }
        }
        decoded.push(bytes[i]);
        i += 1;
    }

    String::from_utf8(decoded).ok().filter(|d| d != path)
}

/// Encode every byte of a path outside `A-Z a-z 0-9 - . _ ~ /` as `%XX`.
///
/// ```rust
/// use cachebust_cli::resolver::specifier::percent_encode;
///
/// assert_eq!(percent_encode("img/my file.3f9a.png"), "img/my%20file.3f9a.png");
/// ```
#[must_use]
pub fn percent_encode(path: &str) -> String {
    let mut encoded = String::with_capacity(path.len());
    for byte in path.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~' | b'/') {
            encoded.push(char::from(byte));
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }
    encoded
}

const fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}
