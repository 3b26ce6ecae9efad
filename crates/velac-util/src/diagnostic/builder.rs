//! Fluent diagnostic construction.

use super::{Diagnostic, DiagnosticCode, Handler, Level};
use crate::span::Span;

/// Builder for [`Diagnostic`] records.
///
/// # Examples
///
/// ```
/// use velac_util::diagnostic::{DiagnosticBuilder, DiagnosticCode};
/// use velac_util::span::Span;
///
/// let diag = DiagnosticBuilder::error("type mismatch")
///     .code(DiagnosticCode::new("E", 3108))
///     .span(Span::DUMMY)
///     .note("expected `Int`")
///     .build();
/// assert_eq!(diag.notes, vec!["expected `Int`"]);
/// ```
pub struct DiagnosticBuilder {
    diagnostic: Diagnostic,
}

impl DiagnosticBuilder {
    /// Start an error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            diagnostic: Diagnostic::new(Level::Error, message, Span::DUMMY),
        }
    }

    /// Start a warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            diagnostic: Diagnostic::new(Level::Warning, message, Span::DUMMY),
        }
    }

    /// Start a note diagnostic.
    pub fn note_level(message: impl Into<String>) -> Self {
        Self {
            diagnostic: Diagnostic::new(Level::Note, message, Span::DUMMY),
        }
    }

    /// Set the primary span.
    pub fn span(mut self, span: Span) -> Self {
        self.diagnostic.span = span;
        self
    }

    /// Set the diagnostic code.
    pub fn code(mut self, code: DiagnosticCode) -> Self {
        self.diagnostic.code = Some(code);
        self
    }

    /// Add a note line.
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.diagnostic.notes.push(note.into());
        self
    }

    /// Add a secondary highlight range.
    pub fn highlight(mut self, span: Span) -> Self {
        self.diagnostic.highlights.push(span);
        self
    }

    /// Finish building the diagnostic.
    pub fn build(self) -> Diagnostic {
        self.diagnostic
    }

    /// Build and emit into a handler.
    pub fn emit(self, handler: &Handler) {
        handler.emit_diagnostic(self.diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_error() {
        let diag = DiagnosticBuilder::error("boom").build();
        assert_eq!(diag.level, Level::Error);
        assert_eq!(diag.message, "boom");
    }

    #[test]
    fn test_builder_full_chain() {
        let code = DiagnosticCode::new("W", 3101);
        let diag = DiagnosticBuilder::warning("careful")
            .span(Span::new(1, 4, 1, 2))
            .code(code)
            .note("context")
            .highlight(Span::new(8, 9, 2, 1))
            .build();
        assert_eq!(diag.level, Level::Warning);
        assert_eq!(diag.code, Some(code));
        assert_eq!(diag.span.start, 1);
        assert_eq!(diag.highlights.len(), 1);
    }

    #[test]
    fn test_builder_emit() {
        let handler = Handler::new();
        DiagnosticBuilder::error("emitted").emit(&handler);
        assert_eq!(handler.error_count(), 1);
    }
}
