//! Global constants used throughout cachebust.
//!
//! Default values live here so the CLI, the TOML config file and the library
//! agree on them.

/// Default number of hex characters kept from the content digest.
pub const DEFAULT_HASH_LENGTH: usize = 8;

/// Default manifest file name, written at the output root.
pub const DEFAULT_MANIFEST_FILE: &str = "asset-manifest.json";

/// Name of the optional configuration file looked up in the build root.
pub const CONFIG_FILE_NAME: &str = "cachebust.toml";

/// Reserved manifest key holding cycle-breaking diagnostics.
pub const DIAGNOSTICS_KEY: &str = "#diagnostics";

/// Minimum number of parallel file operations regardless of CPU count.
pub const MIN_PARALLELISM: usize = 10;

/// Multiplier applied to CPU core count for default parallelism.
pub const PARALLELISM_CORE_MULTIPLIER: usize = 2;

/// Default CPU core count when detection fails.
pub const FALLBACK_CORE_COUNT: usize = 4;

/// Default bound on concurrent reads, parses and writes.
#[must_use]
pub fn default_max_parallel() -> usize {
    let cores =
        std::thread::available_parallelism().map(std::num::NonZero::get).unwrap_or(FALLBACK_CORE_COUNT);
    (cores * PARALLELISM_CORE_MULTIPLIER).max(MIN_PARALLELISM)
}
