//! Terminal output formatting.
//!
//! Results go to stdout, diagnostics to stderr, so the dependency listings
//! can be piped.

pub mod colors;
pub mod errors;

use osgi_resolver::Problem;

use colors::{ColorSupport, Paint};

/// Output handler for consistent terminal formatting
pub struct OutputHandler {
    colors: ColorSupport,
}

impl OutputHandler {
    /// Create a new output handler
    pub fn new() -> Self {
        Self {
            colors: ColorSupport::detect(),
        }
    }

    /// Print a result line
    pub fn line(&self, message: &str) {
        println!("{}", message);
    }

    /// Print a section heading
    pub fn heading(&self, message: &str) {
        println!("{}", self.colors.paint(Paint::Bold, message));
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        eprintln!("{} {}", self.colors.paint(Paint::Green, "✓"), message);
    }

    /// Print a warning message
    pub fn warn(&self, message: &str) {
        eprintln!("{} {}", self.colors.paint(Paint::Yellow, "⚠"), message);
    }

    /// Print one problem, prefixed by the element it belongs to
    pub fn problem(&self, owner: &str, problem: &Problem) {
        let severity = problem.severity().to_string();
        println!(
            "{} {}: {}",
            self.colors.paint(Paint::Bold, owner),
            self.colors.paint(Paint::for_severity(problem.severity()), &severity),
            problem.message()
        );
    }
}

impl Default for OutputHandler {
    fn default() -> Self {
        Self::new()
    }
}
