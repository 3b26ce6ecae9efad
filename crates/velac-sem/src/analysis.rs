//! The semantic analyzer: declaration hooks and the tree walk driver.
//!
//! The analyzer owns the module for the duration of the pass. While a
//! function body is walked it is detached from its arena slot, so reads of
//! other declarations (overload signatures, field lists) can never alias the
//! statements being mutated. Scope state is acquired on entry to each
//! syntactic construct and restored on every exit path, including error
//! continuation.
//!
//! Pass order: globals, then type declarations (field initializers first
//! across all types, then members), then free functions. Within one
//! declaration, diagnostics come out in source order.

use velac_ast::{
    BindingRef, Capture, Expr, FuncId, FuncKind, GlobalId, Module, Type, TypeDeclId,
};
use velac_util::{Handler, Span, Symbol};

use crate::context::SemanticContext;
use crate::errors::SemError;
use crate::scope::{RibKind, ScopeTree, VarBinding};

/// The annotated module together with its symbol table.
pub struct Analysis {
    pub module: Module,
    pub context: SemanticContext,
}

/// Run semantic analysis over a parsed module.
///
/// Registers top-level declarations, walks every declaration in depth-first
/// order attaching types and resolved references, and accumulates
/// diagnostics in the handler. Must not be re-run on an already-annotated
/// module.
pub fn analyze(mut module: Module, handler: &Handler) -> Analysis {
    let context = SemanticContext::register_top_level(&mut module, handler);
    let module = SemanticAnalyzer::new(module, &context, handler).run();
    Analysis { module, context }
}

/// The function the analyzer is currently inside.
#[derive(Clone)]
pub(crate) struct FuncFrame {
    pub kind: FuncKind,
    pub ret_ty: Type,
    pub pretty_name: Symbol,
}

/// Capture collection state for one closure being analyzed.
pub(crate) struct ClosureFrame {
    pub captures: Vec<Capture>,
    /// Scope depth at closure entry; bindings below it are captures.
    pub scope_depth: usize,
}

/// What `break` would leave.
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum BreakTarget {
    Loop,
    Switch,
}

/// The semantic analyzer.
pub struct SemanticAnalyzer<'a> {
    pub(crate) module: Module,
    pub(crate) context: &'a SemanticContext,
    pub(crate) handler: &'a Handler,
    pub(crate) scopes: ScopeTree,
    pub(crate) func_stack: Vec<FuncFrame>,
    pub(crate) closure_frames: Vec<ClosureFrame>,
    pub(crate) break_targets: Vec<BreakTarget>,
    pub(crate) type_stack: Vec<TypeDeclId>,
}

impl<'a> SemanticAnalyzer<'a> {
    pub fn new(module: Module, context: &'a SemanticContext, handler: &'a Handler) -> Self {
        Self {
            module,
            context,
            handler,
            scopes: ScopeTree::new(),
            func_stack: Vec::new(),
            closure_frames: Vec::new(),
            break_targets: Vec::new(),
            type_stack: Vec::new(),
        }
    }

    /// Walk the whole module and return it annotated.
    pub fn run(mut self) -> Module {
        self.mark_indirect_params();

        let global_ids: Vec<GlobalId> = self.module.globals.indices().collect();
        for gid in global_ids {
            self.visit_global(gid);
        }

        let type_ids: Vec<TypeDeclId> = self.module.types.indices().collect();
        // Field initializers across all types first, so method bodies can
        // rely on every field's (possibly inferred) type.
        for &tid in &type_ids {
            self.visit_fields(tid);
        }
        for &tid in &type_ids {
            self.visit_type_members(tid);
        }

        // Snapshot before the walk: synthetic wrappers pushed during call
        // resolution are not declarations to visit.
        let free: Vec<FuncId> = self
            .module
            .funcs
            .iter_enumerated()
            .filter(|(_, f)| f.kind == FuncKind::Free && f.parent.is_none() && !f.is_implicit)
            .map(|(id, _)| id)
            .collect();
        for fid in free {
            self.visit_func(fid);
        }

        self.module
    }

    pub(crate) fn report(&self, err: SemError, span: Span) {
        self.handler.emit_diagnostic(err.into_diagnostic(span));
    }

    /// Argument bindings of indirect aggregate type are mutable.
    fn mark_indirect_params(&mut self) {
        let func_ids: Vec<FuncId> = self.module.funcs.indices().collect();
        for fid in func_ids {
            for i in 0..self.module.funcs[fid].params.len() {
                if self.module.funcs[fid].params[i].is_self {
                    continue;
                }
                let ty = self.module.funcs[fid].params[i].ty.clone();
                if self.is_indirect(&ty) {
                    self.module.funcs[fid].params[i].mutable = true;
                }
            }
        }
    }

    pub(crate) fn is_indirect(&self, ty: &Type) -> bool {
        self.context
            .decl_for(ty, false)
            .is_some_and(|tid| self.module.types[tid].indirect)
    }

    pub(crate) fn in_initializer(&self) -> bool {
        self.func_stack
            .last()
            .is_some_and(|f| f.kind == FuncKind::Initializer)
    }

    fn visit_global(&mut self, gid: GlobalId) {
        let mut declared = self.module.globals[gid].declared_ty.take();
        let mut init = self.module.globals[gid].init.take();
        let (name, foreign, span) = {
            let decl = &self.module.globals[gid];
            (decl.name, decl.is_foreign, decl.span)
        };
        self.check_var_decl(name, foreign, &mut declared, &mut init, span);
        let decl = &mut self.module.globals[gid];
        decl.declared_ty = declared;
        decl.init = init;
    }

    fn visit_fields(&mut self, tid: TypeDeclId) {
        self.type_stack.push(tid);
        for i in 0..self.module.types[tid].fields.len() {
            let mut declared = self.module.types[tid].fields[i].declared_ty.take();
            let mut init = self.module.types[tid].fields[i].init.take();
            let (name, foreign, span) = {
                let field = &self.module.types[tid].fields[i];
                (field.name, field.is_foreign, field.span)
            };
            self.check_var_decl(name, foreign, &mut declared, &mut init, span);
            let field = &mut self.module.types[tid].fields[i];
            field.declared_ty = declared;
            field.init = init;
        }
        self.type_stack.pop();
    }

    fn visit_type_members(&mut self, tid: TypeDeclId) {
        self.type_stack.push(tid);
        let members: Vec<FuncId> = {
            let decl = &self.module.types[tid];
            decl.initializers
                .iter()
                .chain(&decl.methods)
                .copied()
                .chain(decl.deinitializer)
                .collect()
        };
        for fid in members {
            self.visit_func(fid);
        }
        self.type_stack.pop();
    }

    /// Shared var-declaration hook for globals, fields and locals.
    ///
    /// On success `declared` holds the binding type: the annotation when
    /// present (with the initializer retyped to it under literal-bias
    /// coercion), the initializer's type otherwise.
    pub(crate) fn check_var_decl(
        &mut self,
        name: Symbol,
        foreign: bool,
        declared: &mut Option<Type>,
        init: &mut Option<Expr>,
        span: Span,
    ) {
        if foreign {
            if init.is_some() {
                self.report(SemError::ForeignVarWithRHS { name }, span);
                return;
            }
            if let Some(ty) = declared.as_ref() {
                if !self.context.is_valid_type(ty) {
                    self.report(SemError::UnknownType { ty: ty.clone() }, span);
                    *declared = Some(Type::Error);
                }
            }
            return;
        }

        if let Some(ty) = declared.as_ref() {
            if !self.context.is_valid_type(ty) {
                self.report(SemError::UnknownType { ty: ty.clone() }, span);
                *declared = Some(Type::Error);
            }
        }

        if let Some(rhs) = init.as_mut() {
            self.visit_expr(rhs);
            if rhs.is_nil_literal() {
                match declared.as_ref() {
                    Some(ty) if self.context.can_be_nil(ty) => {
                        crate::expr::retype_literal(rhs, ty.clone());
                    }
                    Some(ty) => {
                        if !ty.is_error() {
                            self.report(SemError::NonPointerNil { ty: ty.clone() }, rhs.span);
                        }
                        rhs.ty = Some(Type::Error);
                    }
                    None => {
                        self.report(SemError::NonPointerNil { ty: Type::Void }, rhs.span);
                        rhs.ty = Some(Type::Error);
                    }
                }
            } else if let Some(ty) = declared.as_ref() {
                let rhs_ty = rhs.ty();
                if self.context.can_coerce(&rhs_ty, ty) {
                    crate::expr::retype_literal(rhs, ty.clone());
                } else if !rhs_ty.matches(ty) {
                    self.report(
                        SemError::CannotCoerce {
                            from: rhs_ty,
                            to: ty.clone(),
                        },
                        rhs.span,
                    );
                }
            }
        }

        if declared.is_none() {
            *declared = Some(init.as_ref().map_or(Type::Error, |rhs| rhs.ty()));
        }
    }

    /// Function declaration hook: the ordered precondition checks, then the
    /// body walk, then the all-paths-return and deinitializer checks.
    pub(crate) fn visit_func(&mut self, fid: FuncId) {
        let (name, kind, foreign, implicit, var_args, ret_ty, parent, span, has_body) = {
            let decl = &self.module.funcs[fid];
            (
                decl.name,
                decl.kind,
                decl.is_foreign,
                decl.is_implicit,
                decl.var_args,
                decl.ret_ty.clone(),
                decl.parent,
                decl.span,
                decl.body.is_some(),
            )
        };

        if foreign && kind != FuncKind::Initializer && has_body {
            self.report(SemError::ForeignFunctionWithBody { name }, span);
            return;
        }
        if !foreign && !implicit && !has_body {
            self.report(SemError::NonForeignFunctionWithoutBody { name }, span);
            return;
        }
        if var_args && !foreign {
            self.report(SemError::VarArgsInNonForeignDecl, span);
            return;
        }
        if !self.context.is_valid_type(&ret_ty) {
            self.report(SemError::UnknownType { ty: ret_ty }, span);
            return;
        }
        for i in 0..self.module.funcs[fid].params.len() {
            let param_ty = self.module.funcs[fid].params[i].ty.clone();
            if !self.context.is_valid_type(&param_ty) {
                self.report(SemError::UnknownType { ty: param_ty }, span);
                return;
            }
        }

        if has_body {
            self.enter_function(fid);
            if let Some(mut body) = self.module.funcs[fid].body.take() {
                self.visit_block(&mut body);
                self.module.funcs[fid].body = Some(body);
            }
            self.exit_function();

            let body_returns = self.module.funcs[fid]
                .body
                .as_ref()
                .is_some_and(|b| b.has_return);
            if !ret_ty.is_void() && kind != FuncKind::Initializer && !body_returns {
                self.report(SemError::NotAllPathsReturn { name, ret: ret_ty }, span);
            }
        }

        if kind == FuncKind::Deinitializer {
            if let Some(tid) = parent {
                if !self.module.types[tid].indirect {
                    self.report(
                        SemError::DeinitOnStruct {
                            ty: self.module.types[tid].name,
                        },
                        span,
                    );
                }
            }
        }
    }

    fn enter_function(&mut self, fid: FuncId) {
        let frame = FuncFrame {
            kind: self.module.funcs[fid].kind,
            ret_ty: self.module.funcs[fid].ret_ty.clone(),
            pretty_name: self.pretty_name(fid),
        };
        self.func_stack.push(frame);
        self.scopes.enter(RibKind::Function);

        // Default values are analyzed in the function rib but before any
        // parameter is bound; a default cannot see its siblings.
        for i in 0..self.module.funcs[fid].params.len() {
            if let Some(mut default) = self.module.funcs[fid].params[i].default.take() {
                self.visit_expr(&mut default);
                let param_ty = self.module.funcs[fid].params[i].ty.clone();
                self.coerce_literal_to(&mut default, &param_ty);
                let default_ty = default.ty();
                if !self.context.can_coerce(&default_ty, &param_ty) {
                    self.report(
                        SemError::CannotCoerce {
                            from: default_ty,
                            to: param_ty,
                        },
                        default.span,
                    );
                }
                self.module.funcs[fid].params[i].default = Some(default);
            }
        }

        let is_mutating = self.module.funcs[fid].is_mutating;
        for i in 0..self.module.funcs[fid].params.len() {
            let (is_self, param_name, ty, mutable) = {
                let p = &self.module.funcs[fid].params[i];
                (p.is_self, p.name, p.ty.clone(), p.mutable)
            };
            let binding = if is_self {
                let self_mutable = is_mutating || self.is_indirect(&ty);
                BindingRef::SelfRef {
                    mutable: self_mutable,
                }
            } else {
                BindingRef::Param { mutable }
            };
            self.scopes.bind(VarBinding {
                name: param_name,
                ty,
                binding,
            });
        }
    }

    fn exit_function(&mut self) {
        self.scopes.exit();
        self.func_stack.pop();
    }

    /// The name `#function` evaluates to: `Type.method` for members, the
    /// bare name for free functions.
    fn pretty_name(&self, fid: FuncId) -> Symbol {
        let decl = &self.module.funcs[fid];
        match decl.parent {
            Some(tid) => {
                Symbol::intern(&format!("{}.{}", self.module.types[tid].name, decl.name))
            }
            None => decl.name,
        }
    }

    /// Retype an integer or nil literal to fit a target slot. Used where a
    /// single known target exists (returns, defaults); overload resolution
    /// has its own deferred variant.
    pub(crate) fn coerce_literal_to(&self, expr: &mut Expr, target: &Type) {
        let target = self.context.canonical_type(target);
        if expr.is_int_literal() && target.is_integer() {
            crate::expr::retype_literal(expr, target);
        } else if expr.is_nil_literal() && target.is_pointer() {
            crate::expr::retype_literal(expr, target);
        }
    }
}
