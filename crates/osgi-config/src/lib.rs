//! Configuration for osgi-deps
//!
//! This crate handles parsing and validation of osgi-deps.toml and of the
//! platform description files, and layers global, project, environment and
//! command-line settings into [`osgi_resolver::ResolverOptions`].

pub mod merge;
pub mod platform;
pub mod toml;

// Re-export main types
pub use merge::{CliOverrides, ConfigLayering, ConfigLoader, ConfigSource};
pub use platform::PlatformDescription;
pub use toml::{DepsToml, ResolverSection, CONFIG_FILE_NAME};

use osgi_core::OsgiError;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, OsgiError>;
