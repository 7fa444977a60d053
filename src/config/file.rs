use super::HashLength;
use crate::constants::CONFIG_FILE_NAME;
use crate::core::CachebustError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Contents of an optional `cachebust.toml`.
///
/// Every field is optional; missing fields fall back to the built-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConfigFile {
    /// Positive integer or `"infinite"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash_length: Option<HashLengthValue>,

    /// Prefix for rewritten references and manifest values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Manifest file name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest: Option<String>,

    /// Output directory, relative to the build root when not absolute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_dir: Option<PathBuf>,

    /// Bound on concurrent file operations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_parallel: Option<usize>,

    /// Glob patterns of root-relative paths to ignore.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
}

/// Hash length as written in TOML: either a number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HashLengthValue {
    /// `hash-length = 8`
    Number(i64),
    /// `hash-length = "infinite"`
    Text(String),
}

impl HashLengthValue {
    /// Interpret the raw value.
    pub fn to_hash_length(&self) -> Result<HashLength, CachebustError> {
        match self {
            Self::Number(n) => n.to_string().parse(),
            Self::Text(s) => s.parse(),
        }
    }
}

impl ConfigFile {
    /// Load and parse a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Load `cachebust.toml` from the root if it exists.
    pub fn discover(root: &Path) -> Result<Option<Self>> {
        let path = root.join(CONFIG_FILE_NAME);
        if path.is_file() {
            tracing::debug!("Loading config from {}", path.display());
            Self::load(&path).map(Some)
        } else {
            Ok(None)
        }
    }
}
