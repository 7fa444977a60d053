//! Core types shared by every stage of cachebust.
//!
//! This module holds the error taxonomy ([`CachebustError`]) and the user-facing
//! error reporting layer ([`ErrorContext`], [`user_friendly_error`]). Every other
//! module reports failures through these types so the CLI can print a single,
//! consistent message that names the offending path.

pub mod error;

pub use error::{CachebustError, ErrorContext, user_friendly_error};
