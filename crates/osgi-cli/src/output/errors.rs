//! Error message formatting with actionable suggestions.

use osgi_core::OsgiError;

use super::colors::{ColorSupport, Paint};

/// Error formatter with suggestions
pub struct ErrorFormatter {
    colors: ColorSupport,
}

impl ErrorFormatter {
    /// Create a new error formatter
    pub fn new() -> Self {
        Self {
            colors: ColorSupport::detect(),
        }
    }

    /// Formatter that never emits color codes
    pub fn plain() -> Self {
        Self {
            colors: ColorSupport::disabled(),
        }
    }

    /// Format an error with its location, suggestion and cause chain
    pub fn format_error(&self, error: &anyhow::Error) -> String {
        let mut output = String::new();

        output.push_str(&self.colors.paint(Paint::Red, "error"));
        output.push_str(": ");
        output.push_str(&error.to_string());
        output.push('\n');

        let osgi_error = error.chain().find_map(|cause| cause.downcast_ref::<OsgiError>());
        if let Some(OsgiError::TomlParse { file, line, column, .. }) = osgi_error {
            output.push_str(&self.format_location(file, *line, *column));
            output.push('\n');
        }

        if let Some(suggestion) = osgi_error.and_then(OsgiError::suggestion) {
            output.push('\n');
            output.push_str(&self.colors.paint(Paint::Dim, "help"));
            output.push_str(": ");
            output.push_str(suggestion);
            output.push('\n');
        }

        for cause in error.chain().skip(1) {
            output.push('\n');
            output.push_str(&self.colors.paint(Paint::Dim, "caused by"));
            output.push_str(": ");
            output.push_str(&cause.to_string());
        }

        output
    }

    /// Format file location context
    pub fn format_location(&self, file: &str, line: usize, column: usize) -> String {
        format!("{} {}:{}:{}", self.colors.paint(Paint::Dim, "-->"), file, line, column)
    }
}

impl Default for ErrorFormatter {
    fn default() -> Self {
        Self::new()
    }
}
