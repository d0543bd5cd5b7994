//! User-facing messages collected during a compilation unit.

use std::fmt;

use tempo_core::{CompilationError, Span};

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Informational; compilation continues.
    Warning,
    /// The unit failed.
    Error,
}

/// One reported message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Severity.
    pub severity: Severity,
    /// Source location, if the message has one.
    pub span: Option<Span>,
    /// Message text.
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        match self.span {
            Some(span) => write!(f, "{label} at {span}: {}", self.message),
            None => write!(f, "{label}: {}", self.message),
        }
    }
}

/// Collector for diagnostics.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Report an error at a source position.
    pub fn report(&mut self, span: Span, message: impl Into<String>) {
        self.push(Severity::Error, Some(span), message.into());
    }

    /// Report a warning, optionally at a source position.
    pub fn warn(&mut self, span: Option<Span>, message: impl Into<String>) {
        self.push(Severity::Warning, span, message.into());
    }

    /// Record a compilation error.
    pub fn error(&mut self, error: &CompilationError) {
        // CompilationError messages already carry their position.
        self.push(Severity::Error, error.span(), error.to_string());
    }

    fn push(&mut self, severity: Severity, span: Option<Span>, message: String) {
        self.items.push(Diagnostic {
            severity,
            span,
            message,
        });
    }

    /// Whether any error was reported.
    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|d| d.severity == Severity::Error)
    }

    /// Number of errors.
    pub fn error_count(&self) -> usize {
        self.items
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    /// All diagnostics in report order.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    /// Number of diagnostics.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing was reported.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Move every diagnostic of `other` into this collector.
    pub fn append(&mut self, other: &mut Diagnostics) {
        self.items.append(&mut other.items);
    }

    /// Forget every diagnostic.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_counts_errors() {
        let mut diags = Diagnostics::new();
        diags.warn(None, "unused");
        assert!(!diags.has_errors());
        diags.report(Span::new(2, 5, 1), "bad");
        assert!(diags.has_errors());
        assert_eq!(diags.error_count(), 1);
        assert_eq!(diags.len(), 2);
    }

    #[test]
    fn display_with_and_without_span() {
        let mut diags = Diagnostics::new();
        diags.report(Span::new(2, 5, 1), "bad");
        diags.warn(None, "meh");
        let lines: Vec<String> = diags.iter().map(|d| d.to_string()).collect();
        assert_eq!(lines, vec!["error at 2:5: bad", "warning: meh"]);
    }

    #[test]
    fn error_keeps_span() {
        let mut diags = Diagnostics::new();
        let span = Span::new(7, 1, 4);
        diags.error(&CompilationError::CaseOutsideSwitch { span });
        let first = diags.iter().next().map(|d| d.span);
        assert_eq!(first, Some(Some(span)));
    }
}
