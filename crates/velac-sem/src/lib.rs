//! velac-sem - Semantic analysis for the Vela language.
//!
//! This crate is the type checker and name resolver of the velac front-end.
//! It consumes the parsed AST of one translation unit ([`velac_ast::Module`])
//! and produces the same tree fully annotated: every expression typed, every
//! resolvable use-site bound to its declaration, literals retyped to their
//! slots, and every block marked with its reachability result. Errors are
//! structured diagnostics in a [`velac_util::Handler`], never panics.
//!
//! The pass runs in two phases:
//!
//! 1. **Top-level registration** ([`SemanticContext::register_top_level`]):
//!    builds the global symbol table, attaches extension methods to their
//!    targets, sets field backpointers, rejects duplicate fields and
//!    duplicate mangled method signatures, detects structural cycles through
//!    value-type fields, and synthesizes memberwise initializers.
//!
//! 2. **The tree walk** ([`SemanticAnalyzer`]): a synchronous depth-first
//!    traversal that resolves names through the scope stack, infers local
//!    and global types from initializers, resolves calls by overload scoring
//!    with literal bias, enforces mutability through the oracle, discovers
//!    closure captures, and checks control-flow reachability.
//!
//! The walk is single-threaded and owns all shared state (the context and
//! the diagnostic sink) for its duration. Diagnostics come out in source
//! order within a declaration. Analysis must run exactly once per tree;
//! re-running it on an annotated module is a logic error.
//!
//! ```
//! use velac_ast::Module;
//! use velac_sem::analyze;
//! use velac_util::Handler;
//!
//! let handler = Handler::new();
//! let analysis = analyze(Module::new(), &handler);
//! assert!(!handler.has_errors());
//! assert!(analysis.module.funcs.is_empty());
//! ```

pub mod analysis;
pub mod context;
pub mod errors;
pub mod mutability;
pub mod scope;

mod call;
mod expr;
mod stmt;

mod edge_cases;

pub use analysis::{analyze, Analysis, SemanticAnalyzer};
pub use context::SemanticContext;
pub use errors::SemError;
pub use mutability::Mutability;
pub use scope::{RibKind, ScopeTree, VarBinding};
