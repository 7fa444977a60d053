//! Lexical path helpers.
//!
//! None of these touch the file system. References written into assets always use
//! forward slashes regardless of the host OS, so every function that produces
//! text for an asset or the manifest goes through [`to_storage`].

use std::path::{Component, Path, PathBuf};

/// Normalizes a path by resolving `.` and `..` components lexically.
///
/// A `..` at the root is dropped rather than escaping it, matching how browsers
/// resolve URLs above `/`.
///
/// # Examples
///
/// ```rust
/// use cachebust_cli::utils::paths::normalize_path;
/// use std::path::{Path, PathBuf};
///
/// assert_eq!(normalize_path(Path::new("/site/js/../css/./a.css")), PathBuf::from("/site/css/a.css"));
/// ```
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match components.last() {
                Some(Component::Normal(_)) => {
                    components.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => components.push(component),
            },
            c => components.push(c),
        }
    }

    components.iter().collect()
}

/// Render a path with forward slashes for storage in assets and the manifest.
#[must_use]
pub fn to_storage<P: AsRef<Path>>(path: P) -> String {
    path.as_ref().to_string_lossy().replace('\\', "/")
}

/// Path of `path` relative to `root`, with forward slashes.
///
/// Returns `None` when `path` is not below `root`.
#[must_use]
pub fn relative_to_root(root: &Path, path: &Path) -> Option<String> {
    path.strip_prefix(root).ok().map(to_storage)
}

/// Whether `path` lies inside `root` after lexical normalization.
#[must_use]
pub fn is_within(root: &Path, path: &Path) -> bool {
    normalize_path(path).starts_with(normalize_path(root))
}

/// Relative reference from directory `from_dir` to `target`, with forward slashes.
///
/// Both paths are expected to be absolute (or both relative to the same base).
///
/// # Examples
///
/// ```rust
/// use cachebust_cli::utils::paths::relative_path;
/// use std::path::Path;
///
/// assert_eq!(relative_path(Path::new("/site"), Path::new("/site/app.js")), "app.js");
/// assert_eq!(relative_path(Path::new("/site/css"), Path::new("/site/img/a.png")), "../img/a.png");
/// ```
#[must_use]
pub fn relative_path(from_dir: &Path, target: &Path) -> String {
    let from = normalize_path(from_dir);
    let to = normalize_path(target);

    let from_parts: Vec<Component<'_>> = from.components().collect();
    let to_parts: Vec<Component<'_>> = to.components().collect();

    let common = from_parts.iter().zip(to_parts.iter()).take_while(|(a, b)| a == b).count();

    let mut segments: Vec<String> = Vec::new();
    for _ in common..from_parts.len() {
        segments.push("..".to_string());
    }
    for part in &to_parts[common..] {
        segments.push(part.as_os_str().to_string_lossy().into_owned());
    }

    segments.join("/")
}
