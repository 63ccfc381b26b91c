//! Utility functions and helpers.
//!
//! Common functionality used across multiple osgi-deps crates.

pub mod path;

// Re-export commonly used utilities
pub use path::{is_archive, join_classpath_entry, normalize_path};
