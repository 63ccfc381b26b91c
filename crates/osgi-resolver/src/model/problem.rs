//! Structured diagnostics recorded on elements during resolution.

use serde::Serialize;
use std::fmt;

use super::ElementId;

/// Problem severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Severity {
    Warning,
    Error,
}

/// What went wrong
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ProblemKind {
    /// No candidate matched a requirement
    UnresolvedReference,
    /// Several candidates matched; the highest version was taken
    AmbiguousReference,
    DependencyCycle,
    /// Malformed element structure, e.g. a fragment with two hosts
    StructuralError,
    /// A package exported by plugins that are not related to each other
    SplitPackage,
}

/// One diagnostic entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Problem {
    kind: ProblemKind,
    severity: Severity,
    message: String,
    owner: ElementId,
    related: Vec<ElementId>,
}

impl Problem {
    pub fn new(
        kind: ProblemKind,
        severity: Severity,
        message: impl Into<String>,
        owner: ElementId,
    ) -> Self {
        Self {
            kind,
            severity,
            message: message.into(),
            owner,
            related: Vec::new(),
        }
    }

    pub fn error(kind: ProblemKind, message: impl Into<String>, owner: ElementId) -> Self {
        Self::new(kind, Severity::Error, message, owner)
    }

    pub fn warning(kind: ProblemKind, message: impl Into<String>, owner: ElementId) -> Self {
        Self::new(kind, Severity::Warning, message, owner)
    }

    pub fn with_related(mut self, related: impl IntoIterator<Item = ElementId>) -> Self {
        self.related.extend(related);
        self
    }

    pub fn kind(&self) -> ProblemKind {
        self.kind
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn owner(&self) -> ElementId {
        self.owner
    }

    pub fn related(&self) -> &[ElementId] {
        &self.related
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Canonical textual form, e.g. `Error: plugin not found: org.acme 1.0`
    pub fn log_message(&self) -> String {
        format!("{}: {}", self.severity, self.message)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("Warning"),
            Severity::Error => f.write_str("Error"),
        }
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.log_message())
    }
}

/// Ordered, de-duplicating problem list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProblemLog {
    problems: Vec<Problem>,
}

impl ProblemLog {
    /// Append a problem unless an identical one is already recorded.
    /// Returns true if the problem was new.
    pub fn add(&mut self, problem: Problem) -> bool {
        if self.problems.contains(&problem) {
            return false;
        }
        self.problems.push(problem);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &Problem> {
        self.problems.iter()
    }

    pub fn clear(&mut self) {
        self.problems.clear();
    }

    pub fn errors(&self) -> impl Iterator<Item = &Problem> {
        self.problems.iter().filter(|p| p.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Problem> {
        self.problems.iter().filter(|p| !p.is_error())
    }

    pub fn of_kind(&self, kind: ProblemKind) -> impl Iterator<Item = &Problem> {
        self.problems.iter().filter(move |p| p.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.problems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.problems.iter().any(Problem::is_error)
    }

    /// Plain string view of the log
    pub fn messages(&self) -> Vec<String> {
        self.problems.iter().map(Problem::log_message).collect()
    }
}

impl<'a> IntoIterator for &'a ProblemLog {
    type Item = &'a Problem;
    type IntoIter = std::slice::Iter<'a, Problem>;

    fn into_iter(self) -> Self::IntoIter {
        self.problems.iter()
    }
}
