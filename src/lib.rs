//! cachebust - content-hash static build artifacts
//!
//! Takes a directory of build output (HTML, CSS, JavaScript, images, fonts, ...),
//! renames every asset to include a hash of its content and rewrites every
//! reference between assets so it points at the hashed name. Browsers and CDNs
//! can then cache assets forever: a changed file gets a new name, and so does
//! every file that (transitively) references it.
//!
//! # Architecture Overview
//!
//! A run is a straight pipeline over one in-memory graph:
//!
//! 1. **Graph building** ([`graph`]) - enumerate the root, parse each file with
//!    the first matching [`plugins::Plugin`], resolve every reference with the
//!    [`resolver`] and connect documents with dependency edges.
//! 2. **Hashing** ([`hasher`]) - finalize documents in dependency order. Each
//!    document's references are rewritten ([`rewriter`]) to the already final
//!    names of its dependencies, then its content is hashed. Dependency cycles
//!    are broken deterministically and reported.
//! 3. **Writing** ([`writer`], [`manifest`]) - write hashed files, delete the
//!    renamed originals and emit the JSON manifest.
//!
//! [`pipeline::run`] wires the stages together around a [`pipeline::Context`].
//!
//! # Core Modules
//!
//! - [`config`] - run configuration and `cachebust.toml`
//! - [`core`] - error types and user-facing error reporting
//! - [`document`] - documents, dependencies and byte ranges
//! - [`resolver`] - specifier resolution against the build root
//! - [`plugins`] - HTML, CSS, JavaScript and source-map parsers
//! - [`graph`] - the dependency graph and its builder
//! - [`hasher`] - digests, hashed names and the topological hasher
//! - [`rewriter`] - single-pass byte-range replacement
//! - [`writer`] - parallel output writing
//! - [`manifest`] - the original-to-hashed mapping
//! - [`utils`] - file system collaborator and path helpers
//!
//! # Example
//!
//! ```rust,no_run
//! use cachebust_cli::config::Config;
//! use cachebust_cli::pipeline::{Context, run};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let ctx = Context::local(Config::new("dist").with_base_url("https://cdn.example.com"))?;
//! let report = run(&ctx).await?;
//! println!("{}", report.summary());
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod document;
pub mod graph;
pub mod hasher;
pub mod manifest;
pub mod pipeline;
pub mod plugins;
pub mod resolver;
pub mod rewriter;
pub mod utils;
pub mod writer;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
