//! Common test utilities for cachebust integration tests

// Not every helper is used by every test module
#![allow(dead_code)]

use assert_cmd::Command;
use cachebust_cli::config::HashLength;
use cachebust_cli::hasher::{content_hash, hashed_file_name};

pub use cachebust_cli::test_utils::{FaultyFileSystem, TestSite, TestSiteBuilder, init_test_logging};

/// Default-length hash of `contents`.
pub fn hash(contents: &str) -> String {
    content_hash(contents.as_bytes(), HashLength::default())
}

/// `name` with the default-length hash of `contents` inserted.
pub fn hashed(name: &str, contents: &str) -> String {
    hashed_file_name(name, &hash(contents))
}

/// The `cachebust` binary, with `RUST_LOG` cleared so flags decide verbosity.
pub fn cachebust() -> Command {
    let mut cmd = Command::cargo_bin("cachebust").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

/// Build a site from `(path, content)` pairs.
pub fn site(files: &[(&str, &str)]) -> TestSite {
    TestSiteBuilder::new().unwrap().with_files(files).build().unwrap()
}
