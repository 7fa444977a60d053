use crate::constants::DEFAULT_HASH_LENGTH;
use crate::core::CachebustError;
use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

/// How much of the hex digest is kept in hashed file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashLength {
    /// Keep the first N hex characters.
    Truncated(NonZeroUsize),
    /// Keep the whole digest.
    Full,
}

impl HashLength {
    /// Apply the length to a hex digest.
    #[must_use]
    pub fn apply<'a>(&self, hex_digest: &'a str) -> &'a str {
        match self {
            Self::Full => hex_digest,
            Self::Truncated(n) => &hex_digest[..n.get().min(hex_digest.len())],
        }
    }
}

impl Default for HashLength {
    fn default() -> Self {
        NonZeroUsize::new(DEFAULT_HASH_LENGTH).map_or(Self::Full, Self::Truncated)
    }
}

impl FromStr for HashLength {
    type Err = CachebustError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "infinite" | "infinity" | "full" => Ok(Self::Full),
            value => value
                .parse::<usize>()
                .ok()
                .and_then(NonZeroUsize::new)
                .map(Self::Truncated)
                .ok_or_else(|| CachebustError::InvalidHashLength {
                    value: trimmed.to_string(),
                }),
        }
    }
}

impl fmt::Display for HashLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "infinite"),
            Self::Truncated(n) => write!(f, "{n}"),
        }
    }
}
