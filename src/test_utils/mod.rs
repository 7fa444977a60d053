//! Test utilities for cachebust
//!
//! Helpers shared by unit tests and the `integration` test target (through the
//! `test-utils` feature):
//! - [`TestSiteBuilder`] lays out a build directory in a temporary directory
//! - [`FaultyFileSystem`] injects read and write failures
//! - [`init_test_logging`] installs a test-friendly tracing subscriber once
//!
//! # Example
//!
//! ```rust,no_run
//! use cachebust_cli::test_utils::TestSiteBuilder;
//!
//! let site = TestSiteBuilder::new()
//!     .unwrap()
//!     .with_file("index.html", r#"<script src="app.js"></script>"#)
//!     .with_file("app.js", "console.log(1);")
//!     .build()
//!     .unwrap();
//! assert!(site.exists("app.js"));
//! ```

pub mod builder;
pub mod faulty_fs;

pub use builder::{TestSite, TestSiteBuilder};
pub use faulty_fs::FaultyFileSystem;

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. Uses `level` when given, otherwise
/// `RUST_LOG`; with neither, tests run without a subscriber.
///
/// ```bash
/// RUST_LOG=cachebust_cli=trace cargo test resolver
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}
