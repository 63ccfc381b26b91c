//! Core data types for OSGi dependency analysis.
//!
//! - Versions and version ranges with the floor-or-range compatibility rule
//! - Parsed manifest entries and their attribute flags
//! - The simplified capability filter

pub mod filter;
pub mod manifest;
pub mod version;

// Re-export all public types
pub use filter::Filter;
pub use manifest::{
    EntryAttributes, HeaderKind, ManifestEntry, ManifestError, NamedElement,
    DUMMY_VERSION_SENTINEL,
};
pub use version::{compare_versions, is_compatible_version, Version, VersionError, VersionRange};
