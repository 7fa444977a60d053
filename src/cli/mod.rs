//! Command-line interface for cachebust.
//!
//! A single command: hash every asset under a build directory, rewrite the
//! references between them and write the manifest.
//!
//! ```bash
//! # Rewrite ./dist in place with 8-character hashes
//! cachebust dist
//!
//! # Full-length hashes, CDN-qualified references, separate output directory
//! cachebust dist --hash-length infinite --base-url https://cdn.example.com --out-dir public
//!
//! # Show what would happen
//! cachebust dist --dry-run --dump-registry registry.json -v
//! ```
//!
//! # Configuration layering
//!
//! Built-in defaults, then `cachebust.toml` in the build directory (or the
//! file given with `--config`), then the flags below. Each layer overrides
//! the previous one.
//!
//! # Logging
//!
//! Logs go to stderr so stdout only carries the summary (and the planned
//! manifest in a dry run). `RUST_LOG` wins over `--log-level`, which wins
//! over `-v`/`-q`; the default level is `info`.


use crate::config::{Config, ConfigFile, HashLength};
use crate::pipeline::{self, Context, RunReport};
use crate::utils::paths::normalize_path;
use anyhow::{Context as _, Result};
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Log verbosity accepted by `--log-level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Errors only
    Error,
    /// Errors and warnings
    Warn,
    /// Stage progress
    Info,
    /// Per-file decisions
    Debug,
    /// Resolution probing
    Trace,
}

impl LogLevel {
    /// Directive understood by [`EnvFilter`].
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "cachebust",
    about = "Content-hash static build artifacts and rewrite every reference to them",
    version,
    long_about = "cachebust renames every asset in a build directory to include a hash of its \
                  content, rewrites the references between assets in dependency order and \
                  writes a manifest mapping original paths to hashed ones."
)]
pub struct Cli {
    /// Build directory to process
    #[arg(value_name = "DIR", default_value = ".")]
    dir: PathBuf,

    /// Manifest file name, relative to the output directory
    #[arg(short, long, value_name = "FILE")]
    manifest: Option<String>,

    /// Hex characters kept from the content hash, or `infinite`
    #[arg(long, value_name = "N")]
    hash_length: Option<HashLength>,

    /// Prefix for rewritten references and manifest values
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Write the hashed tree here instead of rewriting DIR in place
    #[arg(short, long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Ignore files whose DIR-relative path matches this glob (repeatable)
    #[arg(short, long, value_name = "GLOB")]
    exclude: Vec<String>,

    /// Maximum number of concurrent file operations
    #[arg(long, value_name = "N")]
    max_parallel: Option<usize>,

    /// Compute hashes and print the planned manifest without writing
    #[arg(long)]
    dry_run: bool,

    /// Write a JSON dump of every document after hashing
    #[arg(long, value_name = "FILE")]
    dump_registry: Option<PathBuf>,

    /// Configuration file to use instead of DIR/cachebust.toml
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, value_enum, value_name = "LEVEL")]
    log_level: Option<LogLevel>,

    /// Shorthand for --log-level debug
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Shorthand for --log-level error
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    /// Run the command and print the summary to stdout.
    pub async fn execute(self) -> Result<RunReport> {
        self.init_logging();

        let config = self.build_config()?;
        let dry_run = config.dry_run;
        let ctx = Context::local(config)?;
        let report = pipeline::run(&ctx).await?;

        if dry_run {
            print!("{}", report.manifest.to_json()?);
        }
        println!("{}", report.summary());
        Ok(report)
    }

    /// Level used when `RUST_LOG` is not set.
    #[must_use]
    pub fn log_level(&self) -> LogLevel {
        if let Some(level) = self.log_level {
            level
        } else if self.verbose {
            LogLevel::Debug
        } else if self.quiet {
            LogLevel::Error
        } else {
            LogLevel::Info
        }
    }

    fn init_logging(&self) {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::new(self.log_level().as_str())
        };

        // A subscriber may already be installed when embedded; keep it.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }

    /// Merge defaults, the config file and the flags into a [`Config`].
    pub fn build_config(&self) -> Result<Config> {
        let root = std::fs::canonicalize(&self.dir)
            .with_context(|| format!("Build directory {} does not exist", self.dir.display()))?;
        if !root.is_dir() {
            anyhow::bail!("{} is not a directory", root.display());
        }

        let file = match &self.config {
            Some(path) => Some(ConfigFile::load(path)?),
            None => ConfigFile::discover(&root)?,
        };
        let mut config = match &file {
            Some(file) => Config::from_file(&root, file)?,
            None => Config::new(&root),
        };

        if let Some(manifest) = &self.manifest {
            config = config.with_manifest_file(manifest.clone());
        }
        if let Some(length) = self.hash_length {
            config = config.with_hash_length(length);
        }
        if let Some(base_url) = &self.base_url {
            config = config.with_base_url(base_url);
        }
        if let Some(out_dir) = &self.out_dir {
            config = config.with_out_dir(absolute(out_dir)?);
        }
        for pattern in &self.exclude {
            config = config.with_exclude(pattern)?;
        }
        if let Some(max_parallel) = self.max_parallel {
            config.max_parallel = max_parallel;
        }
        if let Some(dump) = &self.dump_registry {
            config.registry_dump = Some(absolute(dump)?);
        }
        config.dry_run = self.dry_run;

        Ok(config)
    }
}

/// Resolve a flag path against the working directory.
fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(normalize_path(path));
    }
    let cwd = std::env::current_dir().context("Failed to read the current directory")?;
    Ok(normalize_path(&cwd.join(path)))
}
