//! Content digests.

use crate::config::HashLength;
use sha2::{Digest, Sha512};

/// Lowercase hex SHA-512 of `contents`, cut to `length` characters.
///
/// # Examples
///
/// ```rust
/// use cachebust_cli::config::HashLength;
/// use cachebust_cli::hasher::digest::content_hash;
///
/// let short = content_hash(b"const x=1;", HashLength::default());
/// assert_eq!(short.len(), 8);
///
/// let full = content_hash(b"const x=1;", HashLength::Full);
/// assert_eq!(full.len(), 128);
/// assert!(full.starts_with(&short));
/// ```
#[must_use]
pub fn content_hash(contents: &[u8], length: HashLength) -> String {
    let mut hasher = Sha512::new();
    hasher.update(contents);
    let digest = hex::encode(hasher.finalize());
    length.apply(&digest).to_string()
}
