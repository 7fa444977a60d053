//! Package entry-point lookup.
//!
//! When a specifier names a directory, the directory may be a package root with a
//! `package.json` whose main fields (`browser`, `module`, `main`, `style`, ...)
//! point at the real entry file.

use crate::utils::fs::FileSystem;
use std::path::Path;

/// Name of the package descriptor looked up in directories.
pub const PACKAGE_JSON: &str = "package.json";

/// Entry paths named by `fields` in `dir/package.json`, in field priority order.
///
/// Only string-valued fields count; the object form of `browser` (a remapping
/// table) is ignored. A missing or unparseable descriptor yields no entries.
pub fn entry_points(fs: &dyn FileSystem, dir: &Path, fields: &[String]) -> Vec<String> {
    if fields.is_empty() {
        return Vec::new();
    }

    let descriptor = dir.join(PACKAGE_JSON);
    if !fs.is_file(&descriptor) {
        return Vec::new();
    }

    let value: serde_json::Value = match fs.read(&descriptor).map(|bytes| serde_json::from_slice(&bytes)) {
        Ok(Ok(value)) => value,
        Ok(Err(e)) => {
            tracing::warn!("Ignoring invalid {}: {}", descriptor.display(), e);
            return Vec::new();
        }
        Err(e) => {
            tracing::warn!("Ignoring unreadable {}: {}", descriptor.display(), e);
            return Vec::new();
        }
    };

    fields
        .iter()
        .filter_map(|field| value.get(field).and_then(serde_json::Value::as_str))
        .filter(|entry| !entry.trim().is_empty())
        .map(str::to_string)
        .collect()
}
