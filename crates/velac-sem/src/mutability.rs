//! The mutability oracle.
//!
//! Classifies l-value expressions as mutable or immutable, naming the
//! culprit binding when there is one. Mutability flows from the access-path
//! root: a field is as mutable as the value it is read from, whether the
//! aggregate is held by value or by reference, and dereferencing follows the
//! pointer binding. Everything that is not a place expression is an r-value
//! and immutable with no culprit.

use velac_ast::{BindingRef, Expr, ExprKind, Module, PrefixOp};
use velac_util::Symbol;

use crate::context::SemanticContext;

/// The oracle's verdict for an l-value expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutability {
    Mutable,
    /// Immutable, optionally naming the binding responsible.
    Immutable(Option<Symbol>),
}

impl Mutability {
    pub fn is_mutable(&self) -> bool {
        matches!(self, Mutability::Mutable)
    }

    fn of(mutable: bool, culprit: Symbol) -> Self {
        if mutable {
            Mutability::Mutable
        } else {
            Mutability::Immutable(Some(culprit))
        }
    }
}

impl SemanticContext {
    /// Classify an expression as a mutable or immutable place.
    ///
    /// Expects resolved reference slots; run only on analyzed expressions.
    pub fn mutability(&self, module: &Module, expr: &Expr) -> Mutability {
        match &expr.kind {
            ExprKind::VarRef { name, binding } => match binding {
                Some(BindingRef::Local { mutable }) => Mutability::of(*mutable, *name),
                Some(BindingRef::Param { mutable }) => Mutability::of(*mutable, *name),
                Some(BindingRef::SelfRef { mutable }) => Mutability::of(*mutable, *name),
                Some(BindingRef::Global(gid)) => {
                    Mutability::of(module.globals[*gid].mutable, *name)
                }
                Some(BindingRef::Func(_)) | None => Mutability::Immutable(Some(*name)),
            },
            // Fields inherit the mutability of their access-path root; the
            // indirection of a reference type does not launder `let`.
            ExprKind::FieldAccess { base, .. } => self.mutability(module, base),
            ExprKind::TupleField { base, .. } => self.mutability(module, base),
            ExprKind::Subscript { base, .. } => self.mutability(module, base),
            ExprKind::Prefix {
                op: PrefixOp::Deref,
                operand,
            } => self.mutability(module, operand),
            ExprKind::Paren(inner) => self.mutability(module, inner),
            _ => Mutability::Immutable(None),
        }
    }
}
