//! cachebust CLI entry point.
//!
//! Parses arguments, runs the pipeline and maps the outcome to an exit code:
//! `0` when everything was written, `1` on a fatal error or when any read,
//! write, delete or manifest operation failed.

use anyhow::Result;
use cachebust_cli::cli;
use cachebust_cli::core::{ErrorContext, user_friendly_error};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute().await {
        Ok(report) if report.is_success() => Ok(()),
        Ok(report) => {
            let details = report.failure_messages();
            ErrorContext::new(format!("{} file operation(s) failed", details.len()))
                .with_details(details.join("\n"))
                .with_suggestion("Files that failed keep their original names and are left out of the manifest")
                .display();
            std::process::exit(1);
        }
        Err(e) => {
            user_friendly_error(e).display();
            std::process::exit(1);
        }
    }
}
