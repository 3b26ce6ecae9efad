//! Diagnostic collection infrastructure.
//!
//! The semantic core never throws on user errors; it emits structured
//! [`Diagnostic`] records into a [`Handler`] and keeps going. Rendering
//! (source-span highlighting, color) is a collaborator's job; this module
//! only defines the records and the sink.
//!
//! Ordering matters: diagnostics are kept in emission order, and a
//! note-severity record is understood to annotate the immediately preceding
//! error.
//!
//! # Examples
//!
//! ```
//! use velac_util::diagnostic::{DiagnosticBuilder, Handler};
//! use velac_util::span::Span;
//!
//! let handler = Handler::new();
//! DiagnosticBuilder::error("unexpected token")
//!     .span(Span::DUMMY)
//!     .emit(&handler);
//!
//! assert!(handler.has_errors());
//! ```

mod builder;
mod codes;

pub use builder::DiagnosticBuilder;
pub use codes::DiagnosticCode;

use crate::span::Span;
use std::cell::RefCell;
use std::fmt;

/// Diagnostic severity level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    /// An error that prevents compilation
    Error,
    /// A warning that doesn't prevent compilation
    Warning,
    /// Additional information attached to the preceding error
    Note,
    /// A suggestion for fixing an issue
    Help,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Error => write!(f, "error"),
            Level::Warning => write!(f, "warning"),
            Level::Note => write!(f, "note"),
            Level::Help => write!(f, "help"),
        }
    }
}

/// A diagnostic record: severity, message, and source locations.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    /// Severity level
    pub level: Level,
    /// Main diagnostic message
    pub message: String,
    /// Primary source location
    pub span: Span,
    /// Optional diagnostic code
    pub code: Option<DiagnosticCode>,
    /// Additional notes for context
    pub notes: Vec<String>,
    /// Additional highlight ranges beyond the primary span
    pub highlights: Vec<Span>,
}

impl Diagnostic {
    /// Create a new diagnostic.
    pub fn new(level: Level, message: impl Into<String>, span: Span) -> Self {
        Self {
            level,
            message: message.into(),
            span,
            code: None,
            notes: Vec::new(),
            highlights: Vec::new(),
        }
    }

    /// Create an error diagnostic.
    pub fn error(message: impl Into<String>, span: Span) -> Self {
        Self::new(Level::Error, message, span)
    }

    /// Create a warning diagnostic.
    pub fn warning(message: impl Into<String>, span: Span) -> Self {
        Self::new(Level::Warning, message, span)
    }

    /// Create a note diagnostic, attached to the preceding error.
    pub fn note(message: impl Into<String>, span: Span) -> Self {
        Self::new(Level::Note, message, span)
    }

    /// Set the diagnostic code.
    pub fn with_code(mut self, code: DiagnosticCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Add a note line to the diagnostic.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Add a secondary highlight range.
    pub fn with_highlight(mut self, span: Span) -> Self {
        self.highlights.push(span);
        self
    }
}

/// Sink that collects diagnostics in emission order.
///
/// Interior mutability lets the analyzer hold a shared reference while it
/// walks the tree; the pass is single-threaded, so a `RefCell` suffices.
pub struct Handler {
    diagnostics: RefCell<Vec<Diagnostic>>,
}

impl Handler {
    /// Create a new handler.
    pub fn new() -> Self {
        Self {
            diagnostics: RefCell::new(Vec::new()),
        }
    }

    /// Emit a pre-built diagnostic.
    pub fn emit_diagnostic(&self, diagnostic: Diagnostic) {
        self.diagnostics.borrow_mut().push(diagnostic);
    }

    /// Check if any errors have been reported.
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .borrow()
            .iter()
            .any(|d| d.level == Level::Error)
    }

    /// Number of errors reported.
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|d| d.level == Level::Error)
            .count()
    }

    /// Number of warnings reported.
    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|d| d.level == Level::Warning)
            .count()
    }

    /// Snapshot of all diagnostics in emission order.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }

    /// Clear all diagnostics.
    pub fn clear(&self) {
        self.diagnostics.borrow_mut().clear();
    }
}

impl Default for Handler {
    fn default() -> Self {
        Self::new()
    }
}
