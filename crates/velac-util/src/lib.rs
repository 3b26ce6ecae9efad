//! velac-util - Foundation types for the velac compiler front-end.
//!
//! This crate provides the utilities shared by every later phase:
//!
//! - [`Symbol`]: interned identifier strings with O(1) comparison
//! - [`Span`] and [`FileId`]: source locations for diagnostics
//! - [`IndexVec`] and [`Idx`]: vectors with typed indices (declaration arenas)
//! - [`diagnostic`]: structured error/warning/note collection
//!
//! The types here are deliberately small and copyable; a `Symbol` is four
//! bytes and a `Span` is plain data, so AST nodes can carry them freely.

pub mod diagnostic;
pub mod error;
pub mod index_vec;
pub mod span;
pub mod symbol;

pub use diagnostic::{Diagnostic, DiagnosticBuilder, DiagnosticCode, Handler, Level};
pub use error::InternError;
pub use index_vec::{Idx, IndexVec};
pub use span::{FileId, Span};
pub use symbol::Symbol;

// Shared hashers for hot maps throughout the compiler.
pub use rustc_hash::FxHashMap;
pub use rustc_hash::FxHashSet;
