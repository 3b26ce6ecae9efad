//! Lexical scope tracking for name resolution.
//!
//! A rib is one scope level; entering a compound statement pushes a rib and
//! exiting pops it, on every exit path including error continuation. Only
//! locals, parameters and `self` live here; globals and free functions are
//! resolved through the semantic context instead, which gives the resolution
//! order: bindings first, then globals, then functions.

use velac_ast::{BindingRef, Type};
use velac_util::{FxHashMap, Symbol};

/// A binding in scope: its name, type, and resolved reference.
#[derive(Debug, Clone)]
pub struct VarBinding {
    pub name: Symbol,
    pub ty: Type,
    pub binding: BindingRef,
}

/// Kind of rib.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RibKind {
    Module,
    Function,
    Closure,
    Block,
}

#[derive(Debug)]
struct Rib {
    bindings: FxHashMap<Symbol, VarBinding>,
    kind: RibKind,
}

/// The rib stack.
#[derive(Debug)]
pub struct ScopeTree {
    ribs: Vec<Rib>,
}

impl ScopeTree {
    /// Create a scope tree holding only the module rib.
    pub fn new() -> Self {
        Self {
            ribs: vec![Rib {
                bindings: FxHashMap::default(),
                kind: RibKind::Module,
            }],
        }
    }

    /// Number of ribs on the stack. A binding's depth is the index of the
    /// rib that holds it, so `depth()` at closure entry separates outer
    /// bindings (captures) from the closure's own.
    pub fn depth(&self) -> usize {
        self.ribs.len()
    }

    /// Enter a new scope.
    pub fn enter(&mut self, kind: RibKind) {
        self.ribs.push(Rib {
            bindings: FxHashMap::default(),
            kind,
        });
    }

    /// Exit the current scope, restoring the bindings visible before entry.
    /// The module rib is never popped.
    pub fn exit(&mut self) {
        if self.ribs.len() > 1 {
            self.ribs.pop();
        }
    }

    /// Add a binding to the current scope, shadowing any outer binding of
    /// the same name.
    pub fn bind(&mut self, binding: VarBinding) {
        if let Some(rib) = self.ribs.last_mut() {
            rib.bindings.insert(binding.name, binding);
        }
    }

    /// Resolve a name, innermost scope first.
    pub fn resolve(&self, name: Symbol) -> Option<&VarBinding> {
        self.resolve_with_depth(name).map(|(binding, _)| binding)
    }

    /// Resolve a name, also returning the index of the rib holding it.
    pub fn resolve_with_depth(&self, name: Symbol) -> Option<(&VarBinding, usize)> {
        for (depth, rib) in self.ribs.iter().enumerate().rev() {
            if let Some(binding) = rib.bindings.get(&name) {
                return Some((binding, depth));
            }
        }
        None
    }

    /// Kind of the innermost rib.
    pub fn current_kind(&self) -> RibKind {
        self.ribs.last().map(|r| r.kind).unwrap_or(RibKind::Module)
    }
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}
