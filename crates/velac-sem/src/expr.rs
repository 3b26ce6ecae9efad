//! Expression hooks of the semantic analyzer.
//!
//! Each hook resolves names, checks operand types, applies literal
//! coercions, and produces the node's type, writing [`Type::Error`] after
//! reporting so sibling checks continue without cascades.

use velac_ast::{
    BindingRef, ClosureExpr, Expr, ExprKind, FieldRef, InfixOp, PrefixOp, Type,
};
use velac_util::{Span, Symbol};

use crate::analysis::{ClosureFrame, FuncFrame, SemanticAnalyzer};
use crate::call::MemberLookup;
use crate::errors::SemError;
use crate::mutability::Mutability;
use crate::scope::{RibKind, VarBinding};
use velac_ast::{Capture, FuncKind};

/// Retype a literal expression, following it through parentheses so the
/// inner node agrees with the outer annotation.
pub(crate) fn retype_literal(expr: &mut Expr, ty: Type) {
    expr.ty = Some(ty.clone());
    if let ExprKind::Paren(inner) = &mut expr.kind {
        retype_literal(inner, ty);
    }
}

impl SemanticAnalyzer<'_> {
    /// Analyze an expression, writing its `ty` slot exactly once.
    pub(crate) fn visit_expr(&mut self, expr: &mut Expr) {
        let span = expr.span;
        let ty = match &mut expr.kind {
            ExprKind::IntLit(_) => Type::INT,
            ExprKind::FloatLit(_) => Type::FLOAT,
            ExprKind::BoolLit(_) => Type::Bool,
            ExprKind::StringLit(_) => Type::String,
            // Context retypes nil to a concrete pointer type.
            ExprKind::NilLit => Type::pointer(Type::Void),
            ExprKind::VarRef { name, binding } => {
                let name = *name;
                self.visit_var_ref(name, binding, span)
            }
            ExprKind::FieldAccess { base, name, field } => {
                self.visit_expr(base);
                let name = *name;
                self.visit_field_access(base, name, field, span)
            }
            ExprKind::TupleField { base, index } => {
                self.visit_expr(base);
                let index = *index;
                self.visit_tuple_field(base, index, span)
            }
            ExprKind::Tuple(elements) => {
                for element in elements.iter_mut() {
                    self.visit_expr(element);
                }
                if elements.iter().any(|e| e.ty().is_error()) {
                    Type::Error
                } else {
                    Type::Tuple(elements.iter().map(|e| e.ty()).collect())
                }
            }
            ExprKind::Call { callee, args, decl } => self.visit_call(callee, args, decl, span),
            ExprKind::Infix { op, lhs, rhs } => {
                let op = *op;
                self.visit_infix(op, lhs, rhs, span)
            }
            ExprKind::Prefix { op, operand } => {
                let op = *op;
                self.visit_prefix(op, operand, span)
            }
            ExprKind::Cast { operand, target } => {
                self.visit_expr(operand);
                let target = target.clone();
                self.visit_cast(operand, target, span)
            }
            ExprKind::Subscript { base, index } => {
                self.visit_expr(base);
                self.visit_expr(index);
                self.visit_subscript(base, index, span)
            }
            ExprKind::Paren(inner) => {
                self.visit_expr(inner);
                inner.ty()
            }
            ExprKind::Closure(closure) => self.visit_closure(closure, span),
            ExprKind::SizeOf { operand, value_ty } => self.visit_sizeof(operand, value_ty),
            ExprKind::PoundFunction { name } => self.visit_pound_function(name, span),
        };
        expr.ty = Some(ty);
    }

    /// Variable reference: bindings, then globals, then functions. A
    /// resolution inside a closure registers a capture on the nearest
    /// enclosing closure.
    fn visit_var_ref(
        &mut self,
        name: Symbol,
        slot: &mut Option<BindingRef>,
        span: Span,
    ) -> Type {
        if let Some((found, depth)) = self.scopes.resolve_with_depth(name) {
            let binding = found.binding;
            let ty = found.ty.clone();
            *slot = Some(binding);
            self.register_capture(name, binding, depth);
            return ty;
        }
        if let Some(gid) = self.context.global(name) {
            *slot = Some(BindingRef::Global(gid));
            return self.module.globals[gid]
                .declared_ty
                .clone()
                .unwrap_or(Type::Error);
        }
        let candidates = self.context.functions(name);
        match candidates {
            [] => {
                self.report(SemError::UnknownVariableName { name }, span);
                Type::Error
            }
            [single] => {
                let fid = *single;
                *slot = Some(BindingRef::Func(fid));
                self.module.funcs[fid].fn_type()
            }
            _ => {
                self.report(SemError::AmbiguousReference { name }, span);
                Type::Error
            }
        }
    }

    pub(crate) fn register_capture(&mut self, name: Symbol, binding: BindingRef, depth: usize) {
        let Some(frame) = self.closure_frames.last_mut() else {
            return;
        };
        if depth >= frame.scope_depth {
            return;
        }
        // Globals and functions are reachable without capturing.
        if matches!(binding, BindingRef::Global(_) | BindingRef::Func(_)) {
            return;
        }
        if !frame.captures.iter().any(|c| c.name == name) {
            frame.captures.push(Capture { name, binding });
        }
    }

    /// Field lookup without call arguments.
    fn visit_field_access(
        &mut self,
        base: &Expr,
        name: Symbol,
        slot: &mut Option<FieldRef>,
        span: Span,
    ) -> Type {
        let base_ty = base.ty();
        if base_ty.is_error() {
            return Type::Error;
        }
        match self.resolve_member(&base_ty, name, None, span) {
            MemberLookup::Field { parent, index, .. } => {
                *slot = Some(FieldRef::Field { parent, index });
                self.module.types[parent].fields[index]
                    .declared_ty
                    .clone()
                    .unwrap_or(Type::Error)
            }
            MemberLookup::Methods(ids) => {
                if let [single] = ids.as_slice() {
                    *slot = Some(FieldRef::Method(*single));
                    self.module.funcs[*single].fn_type()
                } else {
                    self.report(SemError::AmbiguousReference { name }, span);
                    Type::Error
                }
            }
            MemberLookup::Error => Type::Error,
        }
    }

    fn visit_tuple_field(&mut self, base: &Expr, index: usize, span: Span) -> Type {
        match self.context.canonical_type(&base.ty()) {
            Type::Error => Type::Error,
            Type::Tuple(elements) => {
                if index < elements.len() {
                    elements[index].clone()
                } else {
                    self.report(
                        SemError::OutOfBoundsTupleField {
                            field: index,
                            max: elements.len(),
                        },
                        span,
                    );
                    Type::Error
                }
            }
            other => {
                self.report(SemError::IndexIntoNonTuple { ty: other }, span);
                Type::Error
            }
        }
    }

    fn visit_infix(&mut self, op: InfixOp, lhs: &mut Expr, rhs: &mut Expr, span: Span) -> Type {
        self.visit_expr(lhs);
        self.visit_expr(rhs);

        if op.is_assignment() {
            return self.visit_assignment(op, lhs, rhs, span);
        }
        if lhs.ty().is_error() || rhs.ty().is_error() {
            return Type::Error;
        }

        // Symmetric literal coercion: the literal takes the other side's
        // type when the categories agree.
        if lhs.is_int_literal() && !rhs.is_int_literal() {
            let rhs_ty = self.context.canonical_type(&rhs.ty());
            if rhs_ty.is_integer() {
                retype_literal(lhs, rhs_ty);
            }
        } else if rhs.is_int_literal() && !lhs.is_int_literal() {
            let lhs_ty = self.context.canonical_type(&lhs.ty());
            if lhs_ty.is_integer() {
                retype_literal(rhs, lhs_ty);
            }
        }
        if lhs.is_nil_literal() && !rhs.is_nil_literal() {
            let rhs_ty = self.context.canonical_type(&rhs.ty());
            if rhs_ty.is_pointer() {
                retype_literal(lhs, rhs_ty);
            }
        } else if rhs.is_nil_literal() && !lhs.is_nil_literal() {
            let lhs_ty = self.context.canonical_type(&lhs.ty());
            if lhs_ty.is_pointer() {
                retype_literal(rhs, lhs_ty);
            }
        }

        let lhs_ty = self.context.canonical_type(&lhs.ty());
        let rhs_ty = self.context.canonical_type(&rhs.ty());

        // Pointer arithmetic: pointer plus/minus integer keeps the pointer.
        if matches!(op, InfixOp::Add | InfixOp::Sub) && lhs_ty.is_pointer() && rhs_ty.is_integer()
        {
            return lhs_ty;
        }

        if !lhs_ty.matches(&rhs_ty) {
            self.report(
                SemError::invalid_operands(op.symbol(), &lhs_ty, Some(&rhs_ty)),
                span,
            );
            return Type::Void;
        }
        match self.context.operator_type(op, &lhs_ty) {
            Some(result) => result,
            None => {
                self.report(
                    SemError::invalid_operands(op.symbol(), &lhs_ty, Some(&rhs_ty)),
                    span,
                );
                Type::Void
            }
        }
    }

    fn visit_assignment(
        &mut self,
        op: InfixOp,
        lhs: &mut Expr,
        rhs: &mut Expr,
        span: Span,
    ) -> Type {
        let lhs_ty = lhs.ty();

        // Literal coercion into the slot type.
        if rhs.is_int_literal() {
            let target = self.context.canonical_type(&lhs_ty);
            if target.is_integer() {
                retype_literal(rhs, target);
            }
        }
        if rhs.is_nil_literal() {
            if lhs_ty.is_error() {
                rhs.ty = Some(Type::Error);
            } else if self.context.can_be_nil(&lhs_ty) {
                retype_literal(rhs, lhs_ty.clone());
            } else {
                self.report(SemError::NonPointerNil { ty: lhs_ty.clone() }, rhs.span);
                rhs.ty = Some(Type::Error);
            }
        }

        // Assignments to `self` storage are allowed while initializing. An
        // unresolved LHS already produced its own diagnostic.
        if !self.in_initializer() && !lhs_ty.is_error() {
            if let Mutability::Immutable(culprit) = self.context.mutability(&self.module, lhs) {
                self.report(SemError::assign_to_constant(culprit), span);
            }
        }

        // Compound forms must also satisfy the underlying operator.
        if let Some(base_op) = op.underlying() {
            let target = self.context.canonical_type(&lhs_ty);
            if !target.is_error() && self.context.operator_type(base_op, &target).is_none() {
                let rhs_ty = self.context.canonical_type(&rhs.ty());
                self.report(
                    SemError::invalid_operands(op.symbol(), &target, Some(&rhs_ty)),
                    span,
                );
            }
        }

        let rhs_ty = rhs.ty();
        if !rhs.is_nil_literal()
            && !lhs_ty.is_error()
            && !rhs_ty.is_error()
            && !self.context.can_coerce(&rhs_ty, &lhs_ty)
            && !self
                .context
                .canonical_type(&rhs_ty)
                .matches(&self.context.canonical_type(&lhs_ty))
        {
            self.report(
                SemError::CannotCoerce {
                    from: rhs_ty,
                    to: lhs_ty,
                },
                span,
            );
        }

        Type::Void
    }

    fn visit_prefix(&mut self, op: PrefixOp, operand: &mut Expr, span: Span) -> Type {
        self.visit_expr(operand);
        let operand_ty = self.context.canonical_type(&operand.ty());
        match op {
            PrefixOp::Deref => match operand_ty {
                Type::Error => Type::Error,
                Type::Pointer(pointee) => *pointee,
                other => {
                    self.report(SemError::DereferenceNonPointer { ty: other }, span);
                    Type::Error
                }
            },
            PrefixOp::AddressOf => {
                let is_place = matches!(
                    operand.unwrap_parens().kind,
                    ExprKind::VarRef { .. }
                        | ExprKind::Subscript { .. }
                        | ExprKind::FieldAccess { .. }
                );
                if !is_place {
                    self.report(SemError::AddressOfRValue, span);
                    return Type::Error;
                }
                if operand_ty.is_error() {
                    Type::Error
                } else {
                    Type::pointer(operand.ty())
                }
            }
            PrefixOp::Neg => {
                if operand_ty.is_error() {
                    Type::Error
                } else if operand_ty.is_numeric() {
                    operand_ty
                } else {
                    self.report(
                        SemError::invalid_operands(op.symbol(), &operand_ty, None),
                        span,
                    );
                    Type::Error
                }
            }
            PrefixOp::Not => {
                if operand_ty.is_error() {
                    Type::Error
                } else if operand_ty == Type::Bool {
                    Type::Bool
                } else {
                    self.report(
                        SemError::invalid_operands(op.symbol(), &operand_ty, None),
                        span,
                    );
                    Type::Error
                }
            }
            PrefixOp::BitNot => {
                if operand_ty.is_error() {
                    Type::Error
                } else if operand_ty.is_integer() {
                    operand_ty
                } else {
                    self.report(
                        SemError::invalid_operands(op.symbol(), &operand_ty, None),
                        span,
                    );
                    Type::Error
                }
            }
        }
    }

    fn visit_cast(&mut self, operand: &mut Expr, target: Type, span: Span) -> Type {
        if !self.context.is_valid_type(&target) {
            self.report(SemError::UnknownType { ty: target }, span);
            return Type::Error;
        }
        let operand_ty = operand.ty();
        if operand_ty.is_error() {
            return Type::Error;
        }
        if !self.context.can_cast(&operand_ty, &target) {
            self.report(
                SemError::CannotCoerce {
                    from: operand_ty,
                    to: target,
                },
                span,
            );
            return Type::Error;
        }
        target
    }

    fn visit_subscript(&mut self, base: &Expr, index: &mut Expr, span: Span) -> Type {
        if index.is_int_literal() {
            retype_literal(index, Type::INT);
        }
        let index_ty = self.context.canonical_type(&index.ty());
        if !index_ty.is_integer() && !index_ty.is_error() {
            self.report(
                SemError::CannotCoerce {
                    from: index_ty,
                    to: Type::INT,
                },
                index.span,
            );
        }
        match self.context.canonical_type(&base.ty()) {
            Type::Error => Type::Error,
            Type::Pointer(pointee) => *pointee,
            other => {
                self.report(SemError::CannotSubscript { ty: other }, span);
                Type::Error
            }
        }
    }

    /// Closure hook: analyze the body with a fresh capture frame, collect
    /// the referenced non-local bindings, and give the closure its function
    /// type.
    fn visit_closure(&mut self, closure: &mut ClosureExpr, span: Span) -> Type {
        for param in &closure.params {
            if !self.context.is_valid_type(&param.ty) {
                self.report(
                    SemError::UnknownType {
                        ty: param.ty.clone(),
                    },
                    span,
                );
                return Type::Error;
            }
        }
        if !self.context.is_valid_type(&closure.ret_ty) {
            self.report(
                SemError::UnknownType {
                    ty: closure.ret_ty.clone(),
                },
                span,
            );
            return Type::Error;
        }

        let pretty_name = self
            .func_stack
            .last()
            .map(|f| f.pretty_name)
            .unwrap_or_else(|| Symbol::intern("closure"));
        self.func_stack.push(FuncFrame {
            kind: FuncKind::Closure,
            ret_ty: closure.ret_ty.clone(),
            pretty_name,
        });
        self.closure_frames.push(ClosureFrame {
            captures: Vec::new(),
            scope_depth: self.scopes.depth(),
        });
        self.scopes.enter(RibKind::Closure);
        for param in &closure.params {
            let mutable = param.mutable || self.is_indirect(&param.ty);
            self.scopes.bind(VarBinding {
                name: param.name,
                ty: param.ty.clone(),
                binding: BindingRef::Param { mutable },
            });
        }

        self.visit_block(&mut closure.body);

        self.scopes.exit();
        if let Some(frame) = self.closure_frames.pop() {
            closure.captures = frame.captures;
        }
        self.func_stack.pop();

        if !closure.ret_ty.is_void() && !closure.body.has_return {
            self.report(
                SemError::NotAllPathsReturn {
                    name: Symbol::intern("closure"),
                    ret: closure.ret_ty.clone(),
                },
                span,
            );
        }

        Type::function(
            closure.params.iter().map(|p| p.ty.clone()).collect(),
            closure.ret_ty.clone(),
            false,
        )
    }

    /// `sizeof` takes a type operand when the (possibly parenthesized) bare
    /// name resolves to a valid type; otherwise the operand is an ordinary
    /// expression and its type is measured.
    fn visit_sizeof(&mut self, operand: &mut Expr, value_ty: &mut Option<Type>) -> Type {
        let type_name = match &operand.unwrap_parens().kind {
            ExprKind::VarRef { name, .. } => Some(*name),
            _ => None,
        };
        if let Some(name) = type_name {
            if let Some(named) = self.context.type_named(name) {
                *value_ty = Some(named.clone());
                retype_literal(operand, named);
                return Type::INT;
            }
        }
        self.visit_expr(operand);
        *value_ty = Some(operand.ty());
        Type::INT
    }

    fn visit_pound_function(&mut self, slot: &mut Option<Symbol>, span: Span) -> Type {
        match self.func_stack.last() {
            Some(frame) => {
                *slot = Some(frame.pretty_name);
                Type::String
            }
            None => {
                self.report(SemError::PoundFunctionOutsideFunction, span);
                Type::Error
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use velac_ast::{Block, FuncDecl, Module, Stmt, VarDecl};
    use velac_util::Handler;

    fn sym(s: &str) -> Symbol {
        Symbol::intern(s)
    }

    /// Wrap statements in `func main() { ... }` and analyze.
    fn analyze_body(stmts: Vec<Stmt>) -> (velac_ast::Module, Vec<velac_util::Diagnostic>, FuncDecl) {
        let mut module = Module::new();
        let mut main = FuncDecl::new(sym("main"), FuncKind::Free);
        main.body = Some(Block::new(stmts, Span::DUMMY));
        let fid = module.add_func(main);
        let handler = Handler::new();
        let analysis = analyze(module, &handler);
        let main = analysis.module.funcs[fid].clone();
        (analysis.module, handler.diagnostics(), main)
    }

    fn body_expr(main: &FuncDecl, index: usize) -> &Expr {
        match &main.body.as_ref().unwrap().stmts[index] {
            Stmt::Expr(e) => e,
            other => panic!("expected expression statement, got {other:?}"),
        }
    }

    fn has_code(diags: &[velac_util::Diagnostic], code: &str) -> bool {
        diags
            .iter()
            .any(|d| d.code.map(|c| c.as_str()) == Some(code.to_string()))
    }

    #[test]
    fn test_literal_types() {
        let (_, diags, main) = analyze_body(vec![
            Stmt::Expr(Expr::int_lit(1)),
            Stmt::Expr(Expr::float_lit(1.5)),
            Stmt::Expr(Expr::bool_lit(true)),
            Stmt::Expr(Expr::string_lit("s")),
        ]);
        assert!(diags.is_empty());
        assert_eq!(body_expr(&main, 0).ty(), Type::INT);
        assert_eq!(body_expr(&main, 1).ty(), Type::FLOAT);
        assert_eq!(body_expr(&main, 2).ty(), Type::Bool);
        assert_eq!(body_expr(&main, 3).ty(), Type::String);
    }

    #[test]
    fn test_arithmetic_and_comparison_types() {
        let (_, diags, main) = analyze_body(vec![
            Stmt::Expr(Expr::infix(InfixOp::Add, Expr::int_lit(1), Expr::int_lit(2))),
            Stmt::Expr(Expr::infix(InfixOp::Lt, Expr::int_lit(1), Expr::int_lit(2))),
        ]);
        assert!(diags.is_empty());
        assert_eq!(body_expr(&main, 0).ty(), Type::INT);
        assert_eq!(body_expr(&main, 1).ty(), Type::Bool);
    }

    #[test]
    fn test_int_literal_takes_other_operand_type() {
        let (_, diags, main) = analyze_body(vec![
            Stmt::Var(
                VarDecl::new(sym("b"), false, Span::DUMMY)
                    .with_type(Type::INT8)
                    .with_init(Expr::int_lit(1)),
            ),
            Stmt::Expr(Expr::infix(InfixOp::Add, Expr::var("b"), Expr::int_lit(2))),
        ]);
        assert!(diags.is_empty());
        let add = body_expr(&main, 1);
        assert_eq!(add.ty(), Type::INT8);
        if let ExprKind::Infix { rhs, .. } = &add.kind {
            assert_eq!(rhs.ty(), Type::INT8);
        } else {
            panic!("expected infix");
        }
    }

    #[test]
    fn test_logical_on_ints_is_invalid_operands() {
        let (_, diags, main) = analyze_body(vec![Stmt::Expr(Expr::infix(
            InfixOp::And,
            Expr::int_lit(1),
            Expr::int_lit(2),
        ))]);
        assert!(has_code(&diags, "E3106"));
        // Category failure defaults the node to Void.
        assert_eq!(body_expr(&main, 0).ty(), Type::Void);
    }

    #[test]
    fn test_unknown_variable() {
        let (_, diags, main) = analyze_body(vec![Stmt::Expr(Expr::var("ghost"))]);
        assert!(has_code(&diags, "E3105"));
        assert_eq!(body_expr(&main, 0).ty(), Type::Error);
    }

    #[test]
    fn test_deref_requires_pointer() {
        let (_, diags, _) = analyze_body(vec![Stmt::Expr(Expr::prefix(
            PrefixOp::Deref,
            Expr::int_lit(1),
        ))]);
        assert!(has_code(&diags, "E3113"));
    }

    #[test]
    fn test_deref_of_pointer_yields_pointee() {
        let (_, diags, main) = analyze_body(vec![
            Stmt::Var(
                VarDecl::new(sym("p"), false, Span::DUMMY)
                    .with_type(Type::pointer(Type::INT))
                    .with_init(Expr::nil_lit()),
            ),
            Stmt::Expr(Expr::prefix(PrefixOp::Deref, Expr::var("p"))),
        ]);
        assert!(diags.is_empty());
        assert_eq!(body_expr(&main, 1).ty(), Type::INT);
    }

    #[test]
    fn test_address_of_literal_is_rvalue_error() {
        let (_, diags, _) = analyze_body(vec![Stmt::Expr(Expr::prefix(
            PrefixOp::AddressOf,
            Expr::int_lit(3),
        ))]);
        assert!(has_code(&diags, "E3119"));
    }

    #[test]
    fn test_address_of_variable() {
        let (_, diags, main) = analyze_body(vec![
            Stmt::Var(VarDecl::new(sym("x"), true, Span::DUMMY).with_init(Expr::int_lit(1))),
            Stmt::Expr(Expr::prefix(PrefixOp::AddressOf, Expr::var("x"))),
        ]);
        assert!(diags.is_empty());
        assert_eq!(body_expr(&main, 1).ty(), Type::pointer(Type::INT));
    }

    #[test]
    fn test_tuple_field_types_and_bounds() {
        let tuple = Expr::new(
            ExprKind::Tuple(vec![Expr::int_lit(1), Expr::bool_lit(true)]),
            Span::DUMMY,
        );
        let (_, diags, main) = analyze_body(vec![
            Stmt::Var(VarDecl::new(sym("t"), false, Span::DUMMY).with_init(tuple)),
            Stmt::Expr(Expr::new(
                ExprKind::TupleField {
                    base: Box::new(Expr::var("t")),
                    index: 1,
                },
                Span::DUMMY,
            )),
            Stmt::Expr(Expr::new(
                ExprKind::TupleField {
                    base: Box::new(Expr::var("t")),
                    index: 2,
                },
                Span::DUMMY,
            )),
        ]);
        assert_eq!(body_expr(&main, 1).ty(), Type::Bool);
        assert!(has_code(&diags, "E3130"));
        assert!(diags
            .iter()
            .any(|d| d.message.contains("index 2") && d.message.contains("2 elements")));
    }

    #[test]
    fn test_tuple_index_on_non_tuple() {
        let (_, diags, _) = analyze_body(vec![Stmt::Expr(Expr::new(
            ExprKind::TupleField {
                base: Box::new(Expr::int_lit(1)),
                index: 0,
            },
            Span::DUMMY,
        ))]);
        assert!(has_code(&diags, "E3129"));
    }

    #[test]
    fn test_assign_to_let_is_constant_error() {
        let (_, diags, _) = analyze_body(vec![
            Stmt::Var(VarDecl::new(sym("x"), false, Span::DUMMY).with_init(Expr::int_lit(1))),
            Stmt::Expr(Expr::infix(InfixOp::Assign, Expr::var("x"), Expr::int_lit(2))),
        ]);
        assert!(has_code(&diags, "E3127"));
        assert!(diags.iter().any(|d| d.message.contains("`x`")));
    }

    #[test]
    fn test_assign_to_var_is_fine_and_void() {
        let (_, diags, main) = analyze_body(vec![
            Stmt::Var(VarDecl::new(sym("x"), true, Span::DUMMY).with_init(Expr::int_lit(1))),
            Stmt::Expr(Expr::infix(InfixOp::Assign, Expr::var("x"), Expr::int_lit(2))),
        ]);
        assert!(diags.is_empty());
        assert_eq!(body_expr(&main, 1).ty(), Type::Void);
    }

    #[test]
    fn test_assign_nil_to_non_pointer() {
        let (_, diags, _) = analyze_body(vec![
            Stmt::Var(VarDecl::new(sym("x"), true, Span::DUMMY).with_init(Expr::int_lit(1))),
            Stmt::Expr(Expr::infix(InfixOp::Assign, Expr::var("x"), Expr::nil_lit())),
        ]);
        assert!(has_code(&diags, "E3115"));
    }

    #[test]
    fn test_pointer_arithmetic_keeps_pointer_type() {
        let (_, diags, main) = analyze_body(vec![
            Stmt::Var(
                VarDecl::new(sym("p"), false, Span::DUMMY)
                    .with_type(Type::pointer(Type::INT8))
                    .with_init(Expr::nil_lit()),
            ),
            Stmt::Expr(Expr::infix(InfixOp::Add, Expr::var("p"), Expr::int_lit(4))),
        ]);
        assert!(diags.is_empty());
        assert_eq!(body_expr(&main, 1).ty(), Type::pointer(Type::INT8));
    }

    #[test]
    fn test_cast_pointer_to_pointer_is_permitted() {
        let (_, diags, main) = analyze_body(vec![
            Stmt::Var(
                VarDecl::new(sym("p"), false, Span::DUMMY)
                    .with_type(Type::pointer(Type::INT8))
                    .with_init(Expr::nil_lit()),
            ),
            Stmt::Expr(Expr::new(
                ExprKind::Cast {
                    operand: Box::new(Expr::var("p")),
                    target: Type::pointer(Type::Bool),
                },
                Span::DUMMY,
            )),
        ]);
        assert!(diags.is_empty());
        assert_eq!(body_expr(&main, 1).ty(), Type::pointer(Type::Bool));
    }

    #[test]
    fn test_cast_string_to_int_cannot_coerce() {
        let (_, diags, _) = analyze_body(vec![Stmt::Expr(Expr::new(
            ExprKind::Cast {
                operand: Box::new(Expr::string_lit("s")),
                target: Type::INT,
            },
            Span::DUMMY,
        ))]);
        assert!(has_code(&diags, "E3108"));
    }

    #[test]
    fn test_subscript_pointer_yields_pointee() {
        let (_, diags, main) = analyze_body(vec![
            Stmt::Var(
                VarDecl::new(sym("p"), false, Span::DUMMY)
                    .with_type(Type::pointer(Type::INT8))
                    .with_init(Expr::nil_lit()),
            ),
            Stmt::Expr(Expr::new(
                ExprKind::Subscript {
                    base: Box::new(Expr::var("p")),
                    index: Box::new(Expr::int_lit(0)),
                },
                Span::DUMMY,
            )),
        ]);
        assert!(diags.is_empty());
        assert_eq!(body_expr(&main, 1).ty(), Type::INT8);
    }

    #[test]
    fn test_subscript_non_pointer() {
        let (_, diags, _) = analyze_body(vec![Stmt::Expr(Expr::new(
            ExprKind::Subscript {
                base: Box::new(Expr::int_lit(1)),
                index: Box::new(Expr::int_lit(0)),
            },
            Span::DUMMY,
        ))]);
        assert!(has_code(&diags, "E3107"));
    }

    #[test]
    fn test_sizeof_type_operand() {
        let sizeof = Expr::new(
            ExprKind::SizeOf {
                operand: Box::new(Expr::var("Int32")),
                value_ty: None,
            },
            Span::DUMMY,
        );
        let (_, diags, main) = analyze_body(vec![Stmt::Expr(sizeof)]);
        assert!(diags.is_empty());
        let e = body_expr(&main, 0);
        assert_eq!(e.ty(), Type::INT);
        match &e.kind {
            ExprKind::SizeOf { value_ty, .. } => assert_eq!(value_ty.as_ref(), Some(&Type::INT32)),
            _ => panic!("expected sizeof"),
        }
    }

    #[test]
    fn test_sizeof_expression_operand() {
        let sizeof = Expr::new(
            ExprKind::SizeOf {
                operand: Box::new(Expr::bool_lit(true)),
                value_ty: None,
            },
            Span::DUMMY,
        );
        let (_, diags, main) = analyze_body(vec![Stmt::Expr(sizeof)]);
        assert!(diags.is_empty());
        match &body_expr(&main, 0).kind {
            ExprKind::SizeOf { value_ty, .. } => assert_eq!(value_ty.as_ref(), Some(&Type::Bool)),
            _ => panic!("expected sizeof"),
        }
    }

    #[test]
    fn test_pound_function_inside_function() {
        let (_, diags, main) = analyze_body(vec![Stmt::Expr(Expr::new(
            ExprKind::PoundFunction { name: None },
            Span::DUMMY,
        ))]);
        assert!(diags.is_empty());
        let e = body_expr(&main, 0);
        assert_eq!(e.ty(), Type::String);
        match &e.kind {
            ExprKind::PoundFunction { name } => assert_eq!(*name, Some(sym("main"))),
            _ => panic!("expected #function"),
        }
    }

    #[test]
    fn test_pound_function_in_global_initializer_errors() {
        let mut module = Module::new();
        module.add_global(VarDecl::new(sym("g"), false, Span::DUMMY).with_init(Expr::new(
            ExprKind::PoundFunction { name: None },
            Span::DUMMY,
        )));
        let handler = Handler::new();
        analyze(module, &handler);
        assert!(has_code(&handler.diagnostics(), "E3126"));
    }
}
