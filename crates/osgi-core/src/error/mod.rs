//! Error types and result aliases for dependency analysis.
//!
//! Only failures that stop a run live here. Unresolved, ambiguous or cyclic
//! references are diagnostics recorded on the elements themselves and never
//! surface as an `OsgiError`.

use thiserror::Error;

use crate::types::{ManifestError, VersionError};

/// Unified error type for all osgi-deps operations
#[derive(Error, Debug)]
pub enum OsgiError {
    // Input errors
    #[error(transparent)]
    InvalidVersion(#[from] VersionError),

    #[error("Failed to parse manifest header of {element}: {source}")]
    ManifestParse {
        element: String,
        #[source]
        source: ManifestError,
    },

    #[error("Invalid input for {what}: {reason}")]
    InvalidInput { what: String, reason: String },

    #[error("Unknown {kind} '{name}'")]
    UnknownElement { kind: &'static str, name: String },

    // Config errors
    #[error("Failed to parse {file}: {message} at line {line}, column {column}")]
    TomlParse {
        file: String,
        message: String,
        line: usize,
        column: usize,
    },

    #[error("Failed to parse {file}: {message}")]
    JsonParse { file: String, message: String },

    #[error("Configuration field '{field}' is invalid: {reason}")]
    ConfigValidation { field: String, reason: String },

    // IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for osgi-deps operations
pub type OsgiResult<T> = Result<T, OsgiError>;

impl OsgiError {
    /// Create an IO error from std::io::Error
    pub fn io(message: String, source: std::io::Error) -> Self {
        Self::Io { message, source }
    }

    /// Contract violation on registry input
    pub fn invalid_input(what: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            what: what.into(),
            reason: reason.into(),
        }
    }

    /// Get a user-friendly suggestion for fixing this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            OsgiError::InvalidVersion(_) => {
                Some("Versions use the form major.minor.micro.qualifier, ranges [floor,ceiling)")
            },
            OsgiError::ManifestParse { .. } => {
                Some("Check the separators: clauses are split by ',' and parameters by ';'")
            },
            OsgiError::UnknownElement { .. } => {
                Some("Check the name spelling or list the platform with 'osgi-deps check'")
            },
            OsgiError::TomlParse { .. } | OsgiError::ConfigValidation { .. } => {
                Some("Fix the reported entry in osgi-deps.toml or the platform description")
            },
            _ => None,
        }
    }
}
