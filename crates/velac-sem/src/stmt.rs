//! Statement hooks and control-flow reachability.
//!
//! Each block runs a small reachability machine: any return, break,
//! continue or call to a `noreturn` function moves the block into a
//! terminated state. Statements encountered in a terminated state get the
//! unreachable-code warning but are still analyzed for further errors. A
//! block "has return" when it ends terminated by return or by a call that
//! never returns.

use velac_ast::{
    Block, ElseArm, Expr, ExprKind, IfStmt, InfixOp, ReturnStmt, Stmt, SwitchStmt, Type, WhileStmt,
};

use crate::analysis::{BreakTarget, SemanticAnalyzer};
use crate::errors::SemError;
use crate::expr::retype_literal;
use crate::scope::RibKind;

/// Reachability state of a position inside a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Reachability {
    Reachable,
    TerminatedByReturn,
    TerminatedByBreak,
    TerminatedByContinue,
    TerminatedByNoreturn,
}

impl Reachability {
    fn terminator(self) -> &'static str {
        match self {
            Reachability::Reachable => "this statement",
            Reachability::TerminatedByReturn => "`return`",
            Reachability::TerminatedByBreak => "`break`",
            Reachability::TerminatedByContinue => "`continue`",
            Reachability::TerminatedByNoreturn => "a call that never returns",
        }
    }
}

impl SemanticAnalyzer<'_> {
    /// Analyze a compound statement, tracking reachability and restoring
    /// the scope on exit.
    pub(crate) fn visit_block(&mut self, block: &mut Block) {
        self.scopes.enter(RibKind::Block);
        let mut state = Reachability::Reachable;
        for stmt in &mut block.stmts {
            if state != Reachability::Reachable {
                self.report(
                    SemError::UnreachableCode {
                        after: state.terminator(),
                    },
                    stmt.span(),
                );
            }
            let next = self.visit_stmt(stmt);
            if state == Reachability::Reachable {
                state = next;
            }
        }
        block.has_return = matches!(
            state,
            Reachability::TerminatedByReturn | Reachability::TerminatedByNoreturn
        );
        self.scopes.exit();
    }

    fn visit_stmt(&mut self, stmt: &mut Stmt) -> Reachability {
        match stmt {
            Stmt::Expr(expr) => {
                self.visit_expr(expr);
                if self.is_noreturn_call(expr) {
                    Reachability::TerminatedByNoreturn
                } else {
                    Reachability::Reachable
                }
            }
            Stmt::Var(decl) => {
                self.check_var_decl(
                    decl.name,
                    decl.is_foreign,
                    &mut decl.declared_ty,
                    &mut decl.init,
                    decl.span,
                );
                let ty = decl.declared_ty.clone().unwrap_or(Type::Error);
                self.scopes.bind(crate::scope::VarBinding {
                    name: decl.name,
                    ty,
                    binding: velac_ast::BindingRef::Local {
                        mutable: decl.mutable,
                    },
                });
                Reachability::Reachable
            }
            Stmt::Return(ret) => {
                self.visit_return(ret);
                Reachability::TerminatedByReturn
            }
            Stmt::If(stmt) => {
                self.visit_if(stmt);
                if stmt.all_branches_return() {
                    Reachability::TerminatedByReturn
                } else {
                    Reachability::Reachable
                }
            }
            Stmt::While(stmt) => {
                self.visit_while(stmt);
                Reachability::Reachable
            }
            Stmt::Switch(stmt) => {
                self.visit_switch(stmt);
                Reachability::Reachable
            }
            Stmt::Break(span) => {
                if self.break_targets.is_empty() {
                    self.report(SemError::BreakNotAllowed, *span);
                }
                Reachability::TerminatedByBreak
            }
            Stmt::Continue(span) => {
                if self.break_targets.is_empty() {
                    self.report(SemError::ContinueNotAllowed, *span);
                }
                Reachability::TerminatedByContinue
            }
            Stmt::Block(block) => {
                self.visit_block(block);
                if block.has_return {
                    Reachability::TerminatedByReturn
                } else {
                    Reachability::Reachable
                }
            }
        }
    }

    fn is_noreturn_call(&self, expr: &Expr) -> bool {
        match &expr.unwrap_parens().kind {
            ExprKind::Call {
                decl: Some(fid), ..
            } => self.module.funcs[*fid].is_noreturn,
            _ => false,
        }
    }

    /// Return statement: literal coercions against the enclosing function
    /// or closure return type, then a coercibility check.
    fn visit_return(&mut self, ret: &mut ReturnStmt) {
        let Some(frame) = self.func_stack.last().cloned() else {
            if let Some(value) = &mut ret.value {
                self.visit_expr(value);
            }
            return;
        };
        match &mut ret.value {
            Some(value) => {
                self.visit_expr(value);
                if value.is_nil_literal() {
                    if self.context.can_be_nil(&frame.ret_ty) {
                        retype_literal(value, frame.ret_ty.clone());
                    } else if !frame.ret_ty.is_error() {
                        self.report(
                            SemError::NonPointerNil {
                                ty: frame.ret_ty.clone(),
                            },
                            value.span,
                        );
                        value.ty = Some(Type::Error);
                    }
                    return;
                }
                self.coerce_literal_to(value, &frame.ret_ty);
                let value_ty = value.ty();
                if !value_ty.is_error()
                    && !frame.ret_ty.is_error()
                    && !self.context.can_coerce(&value_ty, &frame.ret_ty)
                    && !self
                        .context
                        .canonical_type(&value_ty)
                        .matches(&self.context.canonical_type(&frame.ret_ty))
                {
                    self.report(
                        SemError::CannotCoerce {
                            from: value_ty,
                            to: frame.ret_ty.clone(),
                        },
                        value.span,
                    );
                }
            }
            None => {
                if !frame.ret_ty.is_void() && !frame.ret_ty.is_error() {
                    self.report(
                        SemError::CannotCoerce {
                            from: Type::Void,
                            to: frame.ret_ty.clone(),
                        },
                        ret.span,
                    );
                }
            }
        }
    }

    fn check_bool_cond(&mut self, cond: &Expr) {
        let ty = self.context.canonical_type(&cond.ty());
        if !ty.is_error() && ty != Type::Bool {
            self.report(
                SemError::CannotCoerce {
                    from: ty,
                    to: Type::Bool,
                },
                cond.span,
            );
        }
    }

    fn visit_if(&mut self, stmt: &mut IfStmt) {
        self.visit_expr(&mut stmt.cond);
        self.check_bool_cond(&stmt.cond);
        self.visit_block(&mut stmt.then_block);
        match &mut stmt.else_arm {
            Some(ElseArm::Else(block)) => self.visit_block(block),
            Some(ElseArm::ElseIf(nested)) => self.visit_if(nested),
            None => {}
        }
    }

    fn visit_while(&mut self, stmt: &mut WhileStmt) {
        self.visit_expr(&mut stmt.cond);
        self.check_bool_cond(&stmt.cond);
        self.break_targets.push(BreakTarget::Loop);
        self.visit_block(&mut stmt.body);
        self.break_targets.pop();
    }

    /// Switch: the subject must support `==` and must not be a pointer
    /// (pointer-identity switches are disallowed); case values take the
    /// subject's type under literal coercion.
    fn visit_switch(&mut self, stmt: &mut SwitchStmt) {
        self.visit_expr(&mut stmt.subject);
        let subject_ty = self.context.canonical_type(&stmt.subject.ty());
        if !subject_ty.is_error() {
            let equatable = self.context.operator_type(InfixOp::Eq, &subject_ty);
            if equatable.is_none() || subject_ty.is_pointer() {
                self.report(
                    SemError::CannotSwitch {
                        ty: stmt.subject.ty(),
                    },
                    stmt.subject.span,
                );
            }
        }
        self.break_targets.push(BreakTarget::Switch);
        for case in &mut stmt.cases {
            self.visit_expr(&mut case.value);
            if case.value.is_int_literal() && subject_ty.is_integer() {
                retype_literal(&mut case.value, subject_ty.clone());
            }
            let case_ty = self.context.canonical_type(&case.value.ty());
            if !case_ty.is_error() && !subject_ty.is_error() && !case_ty.matches(&subject_ty) {
                self.report(
                    SemError::CannotCoerce {
                        from: case.value.ty(),
                        to: stmt.subject.ty(),
                    },
                    case.value.span,
                );
            }
            self.visit_block(&mut case.body);
        }
        if let Some(default) = &mut stmt.default {
            self.visit_block(default);
        }
        self.break_targets.pop();
    }
}
