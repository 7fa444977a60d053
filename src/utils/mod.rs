//! Cross-platform utilities shared by the pipeline stages.
//!
//! - [`fs`] - the [`FileSystem`](fs::FileSystem) collaborator and atomic writes
//! - [`paths`] - lexical path normalization and forward-slash relative references

pub mod fs;
pub mod paths;

pub use fs::{FileSystem, LocalFileSystem, atomic_write, ensure_dir};
pub use paths::{normalize_path, relative_path, relative_to_root, to_storage};
