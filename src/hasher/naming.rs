//! Hashed file names.

/// Insert `.hash` before the extension of `file_name`, or append it if there is none.
///
/// A name whose stem already ends in `.hash` is returned unchanged, so running
/// over an already-hashed tree keeps every name stable.
///
/// # Examples
///
/// ```rust
/// use cachebust_cli::hasher::naming::hashed_file_name;
///
/// assert_eq!(hashed_file_name("app.js", "3f9a1b"), "app.3f9a1b.js");
/// assert_eq!(hashed_file_name("app.min.js", "3f9a1b"), "app.min.3f9a1b.js");
/// assert_eq!(hashed_file_name("LICENSE", "3f9a1b"), "LICENSE.3f9a1b");
/// assert_eq!(hashed_file_name("app.3f9a1b.js", "3f9a1b"), "app.3f9a1b.js");
/// ```
#[must_use]
pub fn hashed_file_name(file_name: &str, hash: &str) -> String {
    let (stem, extension) = match file_name.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() => (stem, Some(extension)),
        _ => (file_name, None),
    };

    let already_hashed = |name: &str| name.strip_suffix(hash).is_some_and(|rest| rest.len() > 1 && rest.ends_with('.'));
    if already_hashed(stem) || (extension.is_some() && already_hashed(file_name)) {
        return file_name.to_string();
    }

    match extension {
        Some(extension) => format!("{stem}.{hash}.{extension}"),
        None => format!("{stem}.{hash}"),
    }
}

/// Name of the source map travelling with a document written as `file_name`.
#[must_use]
pub fn source_map_name(file_name: &str) -> String {
    format!("{file_name}.map")
}
