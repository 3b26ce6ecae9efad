//! Statements and blocks.

use crate::decl::VarDecl;
use crate::expr::Expr;
use velac_util::Span;

/// A compound statement.
///
/// `has_return` is written by the analyzer: true when control cannot fall
/// off the end of the block (a return, a call to a `noreturn` function, or
/// an if/else whose branches all return).
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub has_return: bool,
    pub span: Span,
}

impl Block {
    pub fn new(stmts: Vec<Stmt>, span: Span) -> Self {
        Self {
            stmts,
            has_return: false,
            span,
        }
    }
}

/// A statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Expr(Expr),
    /// Local `let`/`var` declaration.
    Var(VarDecl),
    Return(ReturnStmt),
    If(IfStmt),
    While(WhileStmt),
    Switch(SwitchStmt),
    Break(Span),
    Continue(Span),
    /// A nested compound statement.
    Block(Block),
}

impl Stmt {
    /// The source location of this statement.
    pub fn span(&self) -> Span {
        match self {
            Stmt::Expr(e) => e.span,
            Stmt::Var(v) => v.span,
            Stmt::Return(r) => r.span,
            Stmt::If(i) => i.span,
            Stmt::While(w) => w.span,
            Stmt::Switch(s) => s.span,
            Stmt::Break(span) | Stmt::Continue(span) => *span,
            Stmt::Block(b) => b.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStmt {
    pub value: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub cond: Expr,
    pub then_block: Block,
    pub else_arm: Option<ElseArm>,
    pub span: Span,
}

impl IfStmt {
    /// True when every branch returns, which requires an else arm.
    pub fn all_branches_return(&self) -> bool {
        let else_returns = match &self.else_arm {
            Some(ElseArm::Else(block)) => block.has_return,
            Some(ElseArm::ElseIf(nested)) => nested.all_branches_return(),
            None => return false,
        };
        self.then_block.has_return && else_returns
    }
}

/// The `else` of an if statement: a block or a chained `else if`.
#[derive(Debug, Clone, PartialEq)]
pub enum ElseArm {
    Else(Block),
    ElseIf(Box<IfStmt>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileStmt {
    pub cond: Expr,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchStmt {
    pub subject: Expr,
    pub cases: Vec<SwitchCase>,
    pub default: Option<Block>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    pub value: Expr,
    pub body: Block,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_starts_without_return() {
        let b = Block::new(vec![], Span::DUMMY);
        assert!(!b.has_return);
    }

    #[test]
    fn test_all_branches_return_requires_else() {
        let mut then_block = Block::new(vec![], Span::DUMMY);
        then_block.has_return = true;
        let stmt = IfStmt {
            cond: Expr::bool_lit(true),
            then_block,
            else_arm: None,
            span: Span::DUMMY,
        };
        assert!(!stmt.all_branches_return());
    }

    #[test]
    fn test_all_branches_return_chained_else_if() {
        let mut ret_block = Block::new(vec![], Span::DUMMY);
        ret_block.has_return = true;

        let inner = IfStmt {
            cond: Expr::bool_lit(false),
            then_block: ret_block.clone(),
            else_arm: Some(ElseArm::Else(ret_block.clone())),
            span: Span::DUMMY,
        };
        let outer = IfStmt {
            cond: Expr::bool_lit(true),
            then_block: ret_block,
            else_arm: Some(ElseArm::ElseIf(Box::new(inner))),
            span: Span::DUMMY,
        };
        assert!(outer.all_branches_return());
    }

    #[test]
    fn test_stmt_span() {
        let span = Span::new(3, 9, 2, 1);
        assert_eq!(Stmt::Break(span).span(), span);
        assert_eq!(Stmt::Block(Block::new(vec![], span)).span(), span);
    }
}
