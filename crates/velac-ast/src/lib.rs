//! velac-ast - AST and type model for the Vela language.
//!
//! The parser produces this tree; the semantic analyzer annotates it in
//! place; code generation consumes the annotated result. Three slot families
//! are written exactly once by the analyzer and by nothing else:
//!
//! - every [`Expr`] carries `ty: Option<Type>` (the [`Type::Error`] sentinel
//!   on failure, so downstream checks can suppress cascades),
//! - use-sites carry resolved references ([`BindingRef`], [`FieldRef`], or a
//!   [`FuncId`] on calls), which are weak back-references into the [`Module`]
//!   arenas,
//! - every [`Block`] carries `has_return`.
//!
//! Declarations are arena-allocated in a [`Module`]: type declarations own
//! their fields, but methods, initializers and deinitializers are stored in
//! the shared function arena and referenced by [`FuncId`]. That keeps the
//! mutual references between extensions, methods and their parent types
//! acyclic.

pub mod decl;
pub mod expr;
pub mod stmt;
pub mod types;

pub use decl::{
    ExtensionDecl, FuncDecl, FuncId, FuncKind, FuncParam, GlobalId, Module, TypeAliasDecl,
    TypeDecl, TypeDeclId, VarDecl,
};
pub use expr::{Argument, BindingRef, Capture, ClosureExpr, Expr, ExprKind, FieldRef, InfixOp,
    OpCategory, PrefixOp};
pub use stmt::{Block, ElseArm, IfStmt, ReturnStmt, Stmt, SwitchCase, SwitchStmt, WhileStmt};
pub use types::Type;
