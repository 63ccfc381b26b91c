//! Terminal color support detection and formatting.
//!
//! Colors are used only when both stdout and stderr are terminals and
//! `NO_COLOR` is unset.

use std::env;
use std::io::{self, IsTerminal};

use osgi_resolver::Severity;

/// Styles used by the reporters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paint {
    Green,
    Yellow,
    Red,
    Bold,
    Dim,
}

impl Paint {
    fn code(self) -> &'static str {
        match self {
            Paint::Green => "32",
            Paint::Yellow => "33",
            Paint::Red => "31",
            Paint::Bold => "1",
            Paint::Dim => "2",
        }
    }

    /// Style of a problem label
    pub fn for_severity(severity: Severity) -> Self {
        match severity {
            Severity::Error => Paint::Red,
            Severity::Warning => Paint::Yellow,
        }
    }
}

/// Color support detection and formatting
#[derive(Debug, Clone, Copy)]
pub struct ColorSupport {
    enabled: bool,
}

impl ColorSupport {
    /// Detect color support automatically
    pub fn detect() -> Self {
        let enabled = env::var_os("NO_COLOR").is_none()
            && io::stderr().is_terminal()
            && io::stdout().is_terminal();
        Self { enabled }
    }

    pub fn disabled() -> Self {
        Self { enabled: false }
    }

    pub fn paint(&self, style: Paint, text: &str) -> String {
        if self.enabled {
            format!("\x1b[{}m{}\x1b[0m", style.code(), text)
        } else {
            text.to_string()
        }
    }
}
