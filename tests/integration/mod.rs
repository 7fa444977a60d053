//! Integration test suite for cachebust
//!
//! End-to-end runs of the library pipeline and of the `cachebust` binary over
//! temporary build directories.
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **scenarios**: hashing and rewriting across HTML, CSS and JavaScript
//! - **cycles**: dependency cycles and their diagnostics
//! - **stability**: determinism and re-running over hashed output
//! - **output**: output directory, source maps, dry runs and manifests
//! - **cli**: the binary, its flags and exit codes

// Shared test utilities (from parent tests/ directory)
#[path = "../common/mod.rs"]
mod common;

mod cli;
mod cycles;
mod output;
mod scenarios;
mod stability;
