//! Error handling for cachebust
//!
//! This module provides the strongly-typed error enum used throughout the crate and
//! the user-friendly reporting layer used by the CLI. The design follows two rules:
//! 1. **Strongly-typed errors** so callers (and tests) can match on the failure mode
//! 2. **User-friendly messages** with an actionable suggestion for CLI users
//!
//! # Error Categories
//!
//! - **Resolution**: [`CachebustError::Resolution`] - a file-like specifier matched no file
//! - **Graph**: [`CachebustError::GraphInconsistency`] - a dependency points at a path
//!   that is not a parsed document
//! - **Plugin output**: [`CachebustError::Overlap`], [`CachebustError::OutOfBounds`]
//! - **File system**: [`CachebustError::Io`]
//! - **Configuration**: [`CachebustError::InvalidHashLength`], [`CachebustError::ConfigError`]
//!
//! Parse-time and resolution-time errors abort the whole run. Write-time errors are
//! collected by the writer and reported together once every independent write has
//! been attempted.
//!
//! # Examples
//!
//! ```rust,no_run
//! use cachebust_cli::core::{CachebustError, user_friendly_error};
//!
//! let error = CachebustError::Resolution {
//!     specifier: "./logo.png".to_string(),
//!     directory: "/site/img".to_string(),
//! };
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for cachebust operations.
///
/// Variants carry the offending path and reason so the CLI can print a message
/// naming exactly what went wrong without re-deriving context.
#[derive(Error, Debug)]
pub enum CachebustError {
    /// A specifier that looks like a file reference (it carries an extension)
    /// could not be resolved to any file on disk.
    #[error("Cannot resolve '{specifier}' from directory {directory}")]
    Resolution {
        /// The specifier as authored
        specifier: String,
        /// Directory the resolution was attempted from
        directory: String,
    },

    /// A dependency resolved to a path that has no parsed document in the graph.
    #[error("Dependency '{dependency}' of {document} points at {target}, which is not a document")]
    GraphInconsistency {
        /// Relative path of the referencing document
        document: String,
        /// Specifier text of the offending dependency
        dependency: String,
        /// Path the dependency resolved to
        target: String,
    },

    /// A plugin reported overlapping dependency ranges for one document.
    #[error("Overlapping dependency ranges in {path}: {}..{} and {}..{}", first.0, first.1, second.0, second.1)]
    Overlap {
        /// Path of the document being rewritten
        path: String,
        /// The earlier range (start, end)
        first: (usize, usize),
        /// The range that overlaps it (start, end)
        second: (usize, usize),
    },

    /// A plugin reported a range that does not fit inside the document contents.
    #[error("Dependency range {start}..{end} is outside of {path} ({len} bytes)")]
    OutOfBounds {
        /// Path of the document being rewritten
        path: String,
        /// Range start
        start: usize,
        /// Range end
        end: usize,
        /// Length of the contents
        len: usize,
    },

    /// A read, write or delete failed.
    #[error("Failed to {operation} {path}")]
    Io {
        /// The operation that failed (read, write, remove, ...)
        operation: String,
        /// Path the operation was applied to
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Hash length was neither a positive integer nor `infinite`.
    #[error("Invalid hash length '{value}': expected a positive integer or 'infinite'")]
    InvalidHashLength {
        /// The rejected input
        value: String,
    },

    /// Configuration could not be loaded or is contradictory.
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the problem
        message: String,
    },

    /// The manifest could not be serialized or written.
    #[error("Manifest error: {message}")]
    ManifestError {
        /// Description of the problem
        message: String,
    },

    /// A plugin failed while parsing a file.
    #[error("Plugin '{plugin}' failed to parse {path}: {reason}")]
    PluginError {
        /// Plugin name
        plugin: String,
        /// File being parsed
        path: String,
        /// Reason reported by the plugin
        reason: String,
    },
}

impl CachebustError {
    /// Build an [`CachebustError::Io`] from an operation name, a path and the source error.
    pub fn io(operation: &str, path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.to_string(),
            path: path.display().to_string(),
            source,
        }
    }
}

/// Error wrapper with a user-facing suggestion and details.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error message
    pub message: String,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a context with only a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
            details: None,
        }
    }

    /// Attach a suggestion.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Attach details.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr with terminal colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.message);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into a user-friendly [`ErrorContext`].
///
/// Typed [`CachebustError`]s anywhere in the chain get a tailored suggestion;
/// everything else is reported with its full context chain as details.
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let message = error.to_string();

    if let Some(typed) = error.chain().find_map(|e| e.downcast_ref::<CachebustError>()) {
        let ctx = create_error_context(typed);
        // Keep the outermost context message when it adds information
        if message != typed.to_string() {
            let details = match ctx.details {
                Some(details) => format!("{typed}. {details}"),
                None => typed.to_string(),
            };
            return ErrorContext {
                message,
                details: Some(details),
                suggestion: ctx.suggestion,
            };
        }
        return ctx;
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        if io_error.kind() == std::io::ErrorKind::PermissionDenied {
            return ErrorContext::new(message)
                .with_suggestion("Check file ownership and permissions of the build directory");
        }
    }

    if let Some(toml_error) = error.chain().find_map(|e| e.downcast_ref::<toml::de::Error>()) {
        return ErrorContext::new(message)
            .with_details(toml_error.to_string())
            .with_suggestion("Check the TOML syntax in cachebust.toml");
    }

    let causes: Vec<String> = error.chain().skip(1).map(ToString::to_string).collect();
    let ctx = ErrorContext::new(message);
    if causes.is_empty() {
        ctx
    } else {
        ctx.with_details(causes.join(": "))
    }
}

fn create_error_context(error: &CachebustError) -> ErrorContext {
    let ctx = ErrorContext::new(error.to_string());
    match error {
        CachebustError::Resolution { .. } => ctx
            .with_details("The specifier has a file extension, so it was expected to name a file in the build output")
            .with_suggestion("Fix the reference or make sure the referenced asset is part of the build output"),
        CachebustError::GraphInconsistency { .. } => ctx
            .with_details("The referenced file exists but was skipped by its plugin, so it cannot receive a hashed name")
            .with_suggestion("Remove the reference or exclude the referencing file"),
        CachebustError::Overlap { .. } | CachebustError::OutOfBounds { .. } => ctx
            .with_details("A dependency extractor produced invalid ranges; rewriting would corrupt the file")
            .with_suggestion("Report this as a bug in the plugin that handles this file type"),
        CachebustError::Io { source, .. } => ctx.with_details(source.to_string()),
        CachebustError::InvalidHashLength { .. } => {
            ctx.with_suggestion("Use --hash-length 8 or --hash-length infinite")
        }
        CachebustError::ConfigError { .. } => {
            ctx.with_suggestion("Check cachebust.toml and the command-line flags")
        }
        CachebustError::ManifestError { .. } => ctx,
        CachebustError::PluginError { .. } => ctx,
    }
}
