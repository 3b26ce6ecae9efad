//! Call analysis and overload resolution.
//!
//! Candidate sets are built from the callee's shape: methods and
//! field-as-functor bindings for member calls, initializers for bare type
//! names, a synthetic foreign wrapper for function-typed values, and the
//! free functions of the name otherwise. Scoring walks candidates in
//! declaration order and the first match wins; literal retyping is planned
//! during scoring and applied only when a candidate accepts.

use velac_ast::{
    Argument, BindingRef, Expr, ExprKind, FieldRef, FuncDecl, FuncId, FuncKind, FuncParam, Type,
    TypeDeclId,
};
use velac_util::{Span, Symbol};

use crate::analysis::SemanticAnalyzer;
use crate::errors::SemError;
use crate::expr::retype_literal;
use crate::mutability::Mutability;

/// Result of member lookup on `base.name`.
pub(crate) enum MemberLookup {
    Field {
        parent: TypeDeclId,
        index: usize,
        /// True when the field holds a function whose signature exactly
        /// matches the call arguments; the call then goes through a
        /// synthetic wrapper rather than a method.
        functor: bool,
    },
    Methods(Vec<FuncId>),
    Error,
}

impl SemanticAnalyzer<'_> {
    /// Member lookup for `base.name`, with call arguments when the access
    /// is a callee.
    pub(crate) fn resolve_member(
        &self,
        base_ty: &Type,
        name: Symbol,
        call_args: Option<&[Argument]>,
        span: Span,
    ) -> MemberLookup {
        let canonical = self.context.canonical_type(base_ty);
        if canonical.is_function() {
            self.report(SemError::FieldOfFunctionType { name }, span);
            return MemberLookup::Error;
        }
        let Some(tid) = self.context.decl_for(&canonical, true) else {
            self.report(
                SemError::UnknownType {
                    ty: base_ty.clone(),
                },
                span,
            );
            return MemberLookup::Error;
        };

        // Field holding a function that exactly matches the arguments wins
        // over methods of the same name.
        if let Some(args) = call_args {
            if let Some((index, field_fn)) = self.functor_field(tid, name) {
                if self.exact_args_match(&field_fn, args) {
                    return MemberLookup::Field {
                        parent: tid,
                        index,
                        functor: true,
                    };
                }
            }
        }

        let decl = &self.module.types[tid];
        if let Some(index) = decl.fields.iter().position(|f| f.name == name) {
            return MemberLookup::Field {
                parent: tid,
                index,
                functor: false,
            };
        }

        let methods: Vec<FuncId> = decl
            .methods
            .iter()
            .copied()
            .filter(|&m| self.module.funcs[m].name == name)
            .collect();
        if !methods.is_empty() {
            return MemberLookup::Methods(methods);
        }

        self.report(
            SemError::UnknownField {
                ty: decl.name,
                name,
            },
            span,
        );
        MemberLookup::Error
    }

    /// A field of the type holding a function, by name.
    fn functor_field(&self, tid: TypeDeclId, name: Symbol) -> Option<(usize, Type)> {
        let decl = &self.module.types[tid];
        let (index, field) = decl
            .fields
            .iter()
            .enumerate()
            .find(|(_, f)| f.name == name)?;
        let ty = self.context.canonical_type(field.declared_ty.as_ref()?);
        ty.is_function().then_some((index, ty))
    }

    /// Exact argument-type match, no literal bias; the field-as-functor
    /// test.
    fn exact_args_match(&self, fn_ty: &Type, args: &[Argument]) -> bool {
        let Type::Function {
            args: params,
            var_args,
            ..
        } = fn_ty
        else {
            return false;
        };
        if *var_args {
            if args.len() < params.len() {
                return false;
            }
        } else if args.len() != params.len() {
            return false;
        }
        params.iter().zip(args).all(|(param, arg)| {
            self.context
                .canonical_type(&arg.value.ty())
                .matches(&self.context.canonical_type(param))
        })
    }

    /// Call hook: build candidates from the callee shape, resolve the
    /// overload, bind the `decl` slot, and produce the return type.
    pub(crate) fn visit_call(
        &mut self,
        callee: &mut Expr,
        args: &mut Vec<Argument>,
        decl_slot: &mut Option<FuncId>,
        span: Span,
    ) -> Type {
        for arg in args.iter_mut() {
            self.visit_expr(&mut arg.value);
        }

        let callee_span = callee.span;
        match &mut callee.kind {
            ExprKind::FieldAccess { base, name, field } => {
                self.visit_expr(base);
                let name = *name;
                let base_ty = base.ty();
                if base_ty.is_error() {
                    callee.ty = Some(Type::Error);
                    return Type::Error;
                }
                match self.resolve_member(&base_ty, name, Some(args.as_slice()), callee_span) {
                    MemberLookup::Field { parent, index, .. } => {
                        *field = Some(FieldRef::Field { parent, index });
                        let field_ty = self.module.types[parent].fields[index]
                            .declared_ty
                            .clone()
                            .unwrap_or(Type::Error);
                        callee.ty = Some(field_ty.clone());
                        self.call_value(&field_ty, name, args, decl_slot, span)
                    }
                    MemberLookup::Methods(candidates) => {
                        match self.select_overload(name, &candidates, args, span) {
                            Some(fid) => {
                                *field = Some(FieldRef::Method(fid));
                                callee.ty = Some(self.module.funcs[fid].fn_type());
                                *decl_slot = Some(fid);
                                if self.module.funcs[fid].is_mutating {
                                    if let Mutability::Immutable(culprit) =
                                        self.context.mutability(&self.module, base)
                                    {
                                        self.report(SemError::assign_to_constant(culprit), span);
                                    }
                                }
                                self.module.funcs[fid].ret_ty.clone()
                            }
                            None => {
                                callee.ty = Some(Type::Error);
                                Type::Error
                            }
                        }
                    }
                    MemberLookup::Error => {
                        callee.ty = Some(Type::Error);
                        Type::Error
                    }
                }
            }
            ExprKind::VarRef { name, binding } => {
                let name = *name;
                // A bare type name calls its initializers.
                if let Some(tid) = self.context.type_decl(name) {
                    let candidates = self.module.types[tid].initializers.clone();
                    return match self.select_overload(name, &candidates, args, span) {
                        Some(fid) => {
                            callee.ty = Some(self.module.funcs[fid].fn_type());
                            *decl_slot = Some(fid);
                            self.module.funcs[fid].ret_ty.clone()
                        }
                        None => {
                            callee.ty = Some(Type::Error);
                            Type::Error
                        }
                    };
                }
                // A binding or global of function type is called through a
                // synthetic wrapper; otherwise the free functions of the
                // name form the candidate set.
                if let Some((found, depth)) = self.scopes.resolve_with_depth(name) {
                    let bound = found.binding;
                    let ty = found.ty.clone();
                    *binding = Some(bound);
                    self.register_capture(name, bound, depth);
                    callee.ty = Some(ty.clone());
                    return self.call_value(&ty, name, args, decl_slot, span);
                }
                if let Some(gid) = self.context.global(name) {
                    *binding = Some(BindingRef::Global(gid));
                    let ty = self.module.globals[gid]
                        .declared_ty
                        .clone()
                        .unwrap_or(Type::Error);
                    callee.ty = Some(ty.clone());
                    return self.call_value(&ty, name, args, decl_slot, span);
                }
                let candidates = self.context.functions(name).to_vec();
                match self.select_overload(name, &candidates, args, span) {
                    Some(fid) => {
                        *binding = Some(BindingRef::Func(fid));
                        callee.ty = Some(self.module.funcs[fid].fn_type());
                        *decl_slot = Some(fid);
                        self.module.funcs[fid].ret_ty.clone()
                    }
                    None => {
                        callee.ty = Some(Type::Error);
                        Type::Error
                    }
                }
            }
            _ => {
                self.visit_expr(callee);
                let ty = callee.ty();
                let name = Symbol::empty();
                self.call_value(&ty, name, args, decl_slot, span)
            }
        }
    }

    /// Call a value of function type through a synthetic wrapper.
    fn call_value(
        &mut self,
        value_ty: &Type,
        name: Symbol,
        args: &mut [Argument],
        decl_slot: &mut Option<FuncId>,
        span: Span,
    ) -> Type {
        let canonical = self.context.canonical_type(value_ty);
        if canonical.is_error() {
            return Type::Error;
        }
        let Some(wrapper) = self.synthesize_wrapper(&canonical) else {
            self.report(
                SemError::CallNonFunction {
                    ty: value_ty.clone(),
                },
                span,
            );
            return Type::Error;
        };
        match self.select_overload(name, &[wrapper], args, span) {
            Some(fid) => {
                *decl_slot = Some(fid);
                self.module.funcs[fid].ret_ty.clone()
            }
            None => Type::Error,
        }
    }

    /// Manufacture the synthetic foreign wrapper for an anonymous callable:
    /// an empty-named foreign, implicit declaration carrying the signature
    /// types. It enters the function arena (so `decl` slots can refer to
    /// it) but never the name maps.
    pub(crate) fn synthesize_wrapper(&mut self, fn_ty: &Type) -> Option<FuncId> {
        let Type::Function {
            args,
            ret,
            var_args,
        } = fn_ty
        else {
            return None;
        };
        let mut decl = FuncDecl::new(Symbol::empty(), FuncKind::Free);
        decl.is_foreign = true;
        decl.is_implicit = true;
        decl.var_args = *var_args;
        decl.ret_ty = (**ret).clone();
        decl.params = args
            .iter()
            .map(|ty| FuncParam::new(Symbol::empty(), ty.clone()))
            .collect();
        Some(self.module.funcs.push(decl))
    }

    /// Walk the candidates in declaration order and pick the first that
    /// matches; apply the planned literal retypes only then. Emits
    /// `UnknownFunction` when there is nothing to try and `NoViableOverload`
    /// with a `Candidates` note when nothing fits.
    pub(crate) fn select_overload(
        &mut self,
        name: Symbol,
        candidates: &[FuncId],
        args: &mut [Argument],
        span: Span,
    ) -> Option<FuncId> {
        if candidates.is_empty() {
            self.report(SemError::UnknownFunction { name }, span);
            return None;
        }
        for &fid in candidates {
            let mut retypes = Vec::new();
            if self.candidate_matches(fid, args, &mut retypes) {
                for (index, ty) in retypes {
                    retype_literal(&mut args[index].value, ty);
                }
                return Some(fid);
            }
        }
        self.report(SemError::NoViableOverload { name }, span);
        let list: String = candidates
            .iter()
            .map(|&fid| format!("\n  {}", self.context.pretty_signature(&self.module, fid)))
            .collect();
        self.report(SemError::Candidates { list }, span);
        None
    }

    /// One candidate against the argument list: arity (exact, or a floor
    /// for varargs), external labels, then types under literal bias. The
    /// vararg tail is the foreign boundary, where anything goes.
    fn candidate_matches(
        &self,
        fid: FuncId,
        args: &[Argument],
        retypes: &mut Vec<(usize, Type)>,
    ) -> bool {
        let decl = &self.module.funcs[fid];
        let params = decl.explicit_params();
        if decl.var_args {
            if args.len() < params.len() {
                return false;
            }
        } else if args.len() != params.len() {
            return false;
        }
        for (index, arg) in args.iter().enumerate() {
            let Some(param) = params.get(index) else {
                continue;
            };
            if let Some(label) = param.label {
                if arg.label != Some(label) {
                    return false;
                }
            }
            let param_ty = self.context.canonical_type(&param.ty);
            if matches!(param_ty, Type::Any) {
                continue;
            }
            if arg.value.is_int_literal() && param_ty.is_integer() {
                retypes.push((index, param_ty));
                continue;
            }
            if arg.value.is_nil_literal() && param_ty.is_pointer() {
                retypes.push((index, param_ty));
                continue;
            }
            let arg_ty = self.context.canonical_type(&arg.value.ty());
            if !arg_ty.matches(&param_ty) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use velac_ast::{Block, Module, ReturnStmt, Stmt, VarDecl};
    use velac_util::{Handler, Level};

    fn sym(s: &str) -> Symbol {
        Symbol::intern(s)
    }

    fn returning(value: Expr) -> Block {
        Block::new(
            vec![Stmt::Return(ReturnStmt {
                value: Some(value),
                span: Span::DUMMY,
            })],
            Span::DUMMY,
        )
    }

    /// `func f(x: Int) -> Int` / `func f(x: Bool) -> Bool` plus a main body.
    fn module_with_overloads(stmts: Vec<Stmt>) -> (Module, FuncId) {
        let mut module = Module::new();

        let mut f_int = FuncDecl::new(sym("f"), FuncKind::Free);
        f_int.params = vec![FuncParam::new(sym("x"), Type::INT)];
        f_int.ret_ty = Type::INT;
        f_int.body = Some(returning(Expr::var("x")));
        module.add_func(f_int);

        let mut f_bool = FuncDecl::new(sym("f"), FuncKind::Free);
        f_bool.params = vec![FuncParam::new(sym("x"), Type::Bool)];
        f_bool.ret_ty = Type::Bool;
        f_bool.body = Some(returning(Expr::var("x")));
        module.add_func(f_bool);

        let mut main = FuncDecl::new(sym("main"), FuncKind::Free);
        main.body = Some(Block::new(stmts, Span::DUMMY));
        let main_id = module.add_func(main);
        (module, main_id)
    }

    fn call_result(module: &Module, main_id: FuncId, index: usize) -> (Option<FuncId>, Type) {
        match &module.funcs[main_id].body.as_ref().unwrap().stmts[index] {
            Stmt::Expr(e) => match &e.kind {
                ExprKind::Call { decl, .. } => (*decl, e.ty()),
                other => panic!("expected call, got {other:?}"),
            },
            other => panic!("expected expression statement, got {other:?}"),
        }
    }

    #[test]
    fn test_overload_picks_by_argument_type() {
        let (module, main_id) = module_with_overloads(vec![
            Stmt::Expr(Expr::call(
                Expr::var("f"),
                vec![Argument::positional(Expr::int_lit(1))],
            )),
            Stmt::Expr(Expr::call(
                Expr::var("f"),
                vec![Argument::positional(Expr::bool_lit(true))],
            )),
        ]);
        let handler = Handler::new();
        let analysis = analyze(module, &handler);
        assert!(!handler.has_errors());

        let (decl, ty) = call_result(&analysis.module, main_id, 0);
        assert_eq!(decl, Some(FuncId(0)));
        assert_eq!(ty, Type::INT);

        let (decl, ty) = call_result(&analysis.module, main_id, 1);
        assert_eq!(decl, Some(FuncId(1)));
        assert_eq!(ty, Type::Bool);
    }

    #[test]
    fn test_no_viable_overload_emits_candidates_note() {
        let (module, _) = module_with_overloads(vec![Stmt::Expr(Expr::call(
            Expr::var("f"),
            vec![Argument::positional(Expr::string_lit("x"))],
        ))]);
        let handler = Handler::new();
        analyze(module, &handler);

        let diags = handler.diagnostics();
        let err_index = diags
            .iter()
            .position(|d| d.code.map(|c| c.as_str()) == Some("E3117".into()))
            .expect("NoViableOverload");
        // The note follows its error and lists both signatures.
        let note = &diags[err_index + 1];
        assert_eq!(note.level, Level::Note);
        assert!(note.message.contains("f(Int) -> Int"));
        assert!(note.message.contains("f(Bool) -> Bool"));
    }

    #[test]
    fn test_unknown_function() {
        let (module, _) = module_with_overloads(vec![Stmt::Expr(Expr::call(
            Expr::var("ghost"),
            vec![],
        ))]);
        let handler = Handler::new();
        analyze(module, &handler);
        assert!(handler
            .diagnostics()
            .iter()
            .any(|d| d.code.map(|c| c.as_str()) == Some("E3105".into())
                || d.code.map(|c| c.as_str()) == Some("E3101".into())));
    }

    #[test]
    fn test_first_declared_candidate_wins_ties() {
        let mut module = Module::new();
        // Two identical free signatures; declaration order breaks the tie.
        for ret in [Type::INT, Type::INT32] {
            let mut f = FuncDecl::new(sym("dup"), FuncKind::Free);
            f.params = vec![FuncParam::new(sym("x"), Type::INT)];
            f.ret_ty = ret;
            f.body = Some(returning(Expr::int_lit(0)));
            module.add_func(f);
        }
        let mut main = FuncDecl::new(sym("main"), FuncKind::Free);
        main.body = Some(Block::new(
            vec![Stmt::Expr(Expr::call(
                Expr::var("dup"),
                vec![Argument::positional(Expr::int_lit(1))],
            ))],
            Span::DUMMY,
        ));
        let main_id = module.add_func(main);

        let handler = Handler::new();
        let analysis = analyze(module, &handler);
        let (decl, _) = call_result(&analysis.module, main_id, 0);
        assert_eq!(decl, Some(FuncId(0)));
    }

    #[test]
    fn test_labels_must_match() {
        let mut module = Module::new();
        let mut f = FuncDecl::new(sym("move"), FuncKind::Free);
        f.params = vec![FuncParam::labeled(sym("to"), sym("target"), Type::INT)];
        f.body = Some(Block::new(vec![], Span::DUMMY));
        module.add_func(f);

        let mut main = FuncDecl::new(sym("main"), FuncKind::Free);
        main.body = Some(Block::new(
            vec![
                Stmt::Expr(Expr::call(
                    Expr::var("move"),
                    vec![Argument::labeled("to", Expr::int_lit(1))],
                )),
                Stmt::Expr(Expr::call(
                    Expr::var("move"),
                    vec![Argument::positional(Expr::int_lit(1))],
                )),
            ],
            Span::DUMMY,
        ));
        module.add_func(main);

        let handler = Handler::new();
        analyze(module, &handler);
        let viable_failures = handler
            .diagnostics()
            .iter()
            .filter(|d| d.code.map(|c| c.as_str()) == Some("E3117".into()))
            .count();
        // Only the unlabeled call fails.
        assert_eq!(viable_failures, 1);
    }

    #[test]
    fn test_varargs_foreign_accepts_extra_arguments() {
        let mut module = Module::new();
        let mut printf = FuncDecl::new(sym("printf"), FuncKind::Free);
        printf.is_foreign = true;
        printf.var_args = true;
        printf.params = vec![FuncParam::new(sym("fmt"), Type::String)];
        printf.ret_ty = Type::INT32;
        module.add_func(printf);

        let mut main = FuncDecl::new(sym("main"), FuncKind::Free);
        main.body = Some(Block::new(
            vec![Stmt::Expr(Expr::call(
                Expr::var("printf"),
                vec![
                    Argument::positional(Expr::string_lit("%d %s")),
                    Argument::positional(Expr::int_lit(1)),
                    Argument::positional(Expr::string_lit("two")),
                ],
            ))],
            Span::DUMMY,
        ));
        module.add_func(main);

        let handler = Handler::new();
        analyze(module, &handler);
        assert!(!handler.has_errors());
    }

    #[test]
    fn test_calling_function_typed_local_through_wrapper() {
        let mut module = Module::new();
        let mut f = FuncDecl::new(sym("inc"), FuncKind::Free);
        f.params = vec![FuncParam::new(sym("x"), Type::INT)];
        f.ret_ty = Type::INT;
        f.body = Some(returning(Expr::var("x")));
        module.add_func(f);

        let mut main = FuncDecl::new(sym("main"), FuncKind::Free);
        main.body = Some(Block::new(
            vec![
                Stmt::Var(VarDecl::new(sym("g"), false, Span::DUMMY).with_init(Expr::var("inc"))),
                Stmt::Expr(Expr::call(
                    Expr::var("g"),
                    vec![Argument::positional(Expr::int_lit(3))],
                )),
            ],
            Span::DUMMY,
        ));
        let main_id = module.add_func(main);

        let handler = Handler::new();
        let analysis = analyze(module, &handler);
        assert!(!handler.has_errors());

        let (decl, ty) = call_result(&analysis.module, main_id, 1);
        assert_eq!(ty, Type::INT);
        // Resolved to a synthetic wrapper: implicit, foreign, unnamed.
        let wrapper = &analysis.module.funcs[decl.unwrap()];
        assert!(wrapper.is_implicit && wrapper.is_foreign);
        assert!(wrapper.name.is_empty());
    }

    #[test]
    fn test_calling_non_function_value() {
        let mut module = Module::new();
        let mut main = FuncDecl::new(sym("main"), FuncKind::Free);
        main.body = Some(Block::new(
            vec![
                Stmt::Var(VarDecl::new(sym("x"), false, Span::DUMMY).with_init(Expr::int_lit(1))),
                Stmt::Expr(Expr::call(Expr::var("x"), vec![])),
            ],
            Span::DUMMY,
        ));
        module.add_func(main);

        let handler = Handler::new();
        analyze(module, &handler);
        assert!(handler
            .diagnostics()
            .iter()
            .any(|d| d.code.map(|c| c.as_str()) == Some("E3103".into())));
    }

    #[test]
    fn test_int_literal_only_retyped_when_candidate_accepts() {
        let mut module = Module::new();
        let mut f = FuncDecl::new(sym("g"), FuncKind::Free);
        f.params = vec![FuncParam::new(sym("x"), Type::Bool)];
        f.body = Some(Block::new(vec![], Span::DUMMY));
        module.add_func(f);

        let mut main = FuncDecl::new(sym("main"), FuncKind::Free);
        main.body = Some(Block::new(
            vec![Stmt::Expr(Expr::call(
                Expr::var("g"),
                vec![Argument::positional(Expr::int_lit(1))],
            ))],
            Span::DUMMY,
        ));
        let main_id = module.add_func(main);

        let handler = Handler::new();
        let analysis = analyze(module, &handler);
        assert!(handler.has_errors());

        // The rejected literal keeps its default type.
        match &analysis.module.funcs[main_id].body.as_ref().unwrap().stmts[0] {
            Stmt::Expr(e) => match &e.kind {
                ExprKind::Call { args, .. } => assert_eq!(args[0].value.ty(), Type::INT),
                _ => panic!("expected call"),
            },
            _ => panic!("expected expression statement"),
        }
    }
}
