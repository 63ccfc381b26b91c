//! # osgi-core
//!
//! Core types shared across all osgi-deps crates.
//!
//! This crate provides:
//! - `Version` / `VersionRange` and the `is_compatible_version` rule every
//!   requirement match is built on
//! - `ManifestEntry`, the parsed form of manifest header clauses
//! - `OsgiError` for unified error handling
//! - Path helpers for classpath construction
//!
//! ## Architecture
//!
//! - `types`: versions, manifest entries, capability filters
//! - `error`: error types and result aliases
//! - `utils`: utility functions and helpers

pub mod error;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use error::{OsgiError, OsgiResult};
pub use types::{
    compare_versions, is_compatible_version, Filter, HeaderKind, ManifestEntry, NamedElement,
    Version, VersionRange,
};
