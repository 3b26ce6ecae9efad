//! The semantic error taxonomy.
//!
//! Every diagnostic the analyzer can produce is one of these kinds. Errors
//! are accumulated in the [`Handler`], never thrown: after reporting an
//! error for a node the analyzer short-circuits that node, annotates it with
//! [`Type::Error`] and moves on to siblings. Warnings never short-circuit.
//! [`SemError::Candidates`] is a note-severity record emitted immediately
//! after its `NoViableOverload` error.
//!
//! Codes follow the compiler-wide scheme: `E31xx` for semantic errors,
//! `W31xx` for semantic warnings. Notes carry no code.

use thiserror::Error;
use velac_ast::Type;
use velac_util::{Diagnostic, DiagnosticCode, Handler, Level, Span, Symbol};

/// A semantic diagnostic kind.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SemError {
    #[error("unknown function `{name}`")]
    UnknownFunction { name: Symbol },

    #[error("unknown type `{ty}`")]
    UnknownType { ty: Type },

    #[error("cannot call value of non-function type `{ty}`")]
    CallNonFunction { ty: Type },

    #[error("type `{ty}` has no member named `{name}`")]
    UnknownField { ty: Symbol, name: Symbol },

    #[error("unknown variable `{name}`")]
    UnknownVariableName { name: Symbol },

    #[error("invalid operands to `{op}`: {operands}")]
    InvalidOperands { op: &'static str, operands: String },

    #[error("cannot subscript value of type `{ty}`")]
    CannotSubscript { ty: Type },

    #[error("cannot coerce `{from}` to `{to}`")]
    CannotCoerce { from: Type, to: Type },

    #[error("only foreign functions may take variadic arguments")]
    VarArgsInNonForeignDecl,

    #[error("foreign function `{name}` must not have a body")]
    ForeignFunctionWithBody { name: Symbol },

    #[error("function `{name}` must have a body")]
    NonForeignFunctionWithoutBody { name: Symbol },

    #[error("foreign variable `{name}` must not have an initializer")]
    ForeignVarWithRHS { name: Symbol },

    #[error("cannot dereference value of non-pointer type `{ty}`")]
    DereferenceNonPointer { ty: Type },

    #[error("cannot switch over value of type `{ty}`")]
    CannotSwitch { ty: Type },

    #[error("cannot use `nil` as a value of non-pointer type `{ty}`")]
    NonPointerNil { ty: Type },

    #[error("function `{name}` does not return `{ret}` on all paths")]
    NotAllPathsReturn { name: Symbol, ret: Type },

    #[error("no viable overload of `{name}` for the given arguments")]
    NoViableOverload { name: Symbol },

    /// Note attached to the preceding `NoViableOverload` error.
    #[error("candidates:{list}")]
    Candidates { list: String },

    #[error("ambiguous reference to `{name}`")]
    AmbiguousReference { name: Symbol },

    #[error("cannot take the address of an r-value")]
    AddressOfRValue,

    #[error("`break` is only allowed inside a loop or switch")]
    BreakNotAllowed,

    #[error("`continue` is only allowed inside a loop or switch")]
    ContinueNotAllowed,

    #[error("cannot access member `{name}` of a function value")]
    FieldOfFunctionType { name: Symbol },

    #[error("duplicate definition of method `{name}` on type `{ty}`")]
    DuplicateMethod { name: Symbol, ty: Symbol },

    #[error("duplicate field `{name}` in type `{ty}`")]
    DuplicateField { name: Symbol, ty: Symbol },

    #[error("type `{ty}` cannot directly store a value of its own type; mark it `indirect` or store a pointer")]
    ReferenceSelfInProp { ty: Symbol },

    #[error("`#function` is only valid inside a function")]
    PoundFunctionOutsideFunction,

    #[error("cannot mutate {what}")]
    AssignToConstant { what: String },

    #[error("deinitializers are only allowed on indirect types; `{ty}` is a value type")]
    DeinitOnStruct { ty: Symbol },

    #[error("cannot index into value of non-tuple type `{ty}`")]
    IndexIntoNonTuple { ty: Type },

    #[error("tuple field index {field} is out of bounds for a tuple of {max} elements")]
    OutOfBoundsTupleField { field: usize, max: usize },

    #[error("code after {after} will not be executed")]
    UnreachableCode { after: &'static str },
}

impl SemError {
    /// Build an `InvalidOperands` for a binary (both operands) or prefix
    /// (single operand) operator.
    pub fn invalid_operands(op: &'static str, lhs: &Type, rhs: Option<&Type>) -> Self {
        let operands = match rhs {
            Some(rhs) => format!("`{lhs}` and `{rhs}`"),
            None => format!("`{lhs}`"),
        };
        SemError::InvalidOperands { op, operands }
    }

    /// Build an `AssignToConstant`, naming the culprit binding when the
    /// mutability oracle identified one.
    pub fn assign_to_constant(culprit: Option<Symbol>) -> Self {
        let what = match culprit {
            Some(name) => format!("`{name}`; it is declared with `let`"),
            None => "immutable value".to_string(),
        };
        SemError::AssignToConstant { what }
    }

    /// Diagnostic severity of this kind.
    pub fn level(&self) -> Level {
        match self {
            SemError::Candidates { .. } => Level::Note,
            SemError::UnreachableCode { .. } => Level::Warning,
            _ => Level::Error,
        }
    }

    /// Stable diagnostic code; notes carry none.
    pub fn code(&self) -> Option<DiagnosticCode> {
        let number = match self {
            SemError::UnknownFunction { .. } => 3101,
            SemError::UnknownType { .. } => 3102,
            SemError::CallNonFunction { .. } => 3103,
            SemError::UnknownField { .. } => 3104,
            SemError::UnknownVariableName { .. } => 3105,
            SemError::InvalidOperands { .. } => 3106,
            SemError::CannotSubscript { .. } => 3107,
            SemError::CannotCoerce { .. } => 3108,
            SemError::VarArgsInNonForeignDecl => 3109,
            SemError::ForeignFunctionWithBody { .. } => 3110,
            SemError::NonForeignFunctionWithoutBody { .. } => 3111,
            SemError::ForeignVarWithRHS { .. } => 3112,
            SemError::DereferenceNonPointer { .. } => 3113,
            SemError::CannotSwitch { .. } => 3114,
            SemError::NonPointerNil { .. } => 3115,
            SemError::NotAllPathsReturn { .. } => 3116,
            SemError::NoViableOverload { .. } => 3117,
            SemError::Candidates { .. } => return None,
            SemError::AmbiguousReference { .. } => 3118,
            SemError::AddressOfRValue => 3119,
            SemError::BreakNotAllowed => 3120,
            SemError::ContinueNotAllowed => 3121,
            SemError::FieldOfFunctionType { .. } => 3122,
            SemError::DuplicateMethod { .. } => 3123,
            SemError::DuplicateField { .. } => 3124,
            SemError::ReferenceSelfInProp { .. } => 3125,
            SemError::PoundFunctionOutsideFunction => 3126,
            SemError::AssignToConstant { .. } => 3127,
            SemError::DeinitOnStruct { .. } => 3128,
            SemError::IndexIntoNonTuple { .. } => 3129,
            SemError::OutOfBoundsTupleField { .. } => 3130,
            SemError::UnreachableCode { .. } => return Some(DiagnosticCode::new("W", 3101)),
        };
        Some(DiagnosticCode::new("E", number))
    }

    /// Convert to a diagnostic record at the given location.
    pub fn into_diagnostic(self, span: Span) -> Diagnostic {
        let level = self.level();
        let code = self.code();
        let mut diag = Diagnostic::new(level, self.to_string(), span);
        diag.code = code;
        diag
    }

    /// Emit directly into a handler.
    pub fn emit(self, handler: &Handler, span: Span) {
        handler.emit_diagnostic(self.into_diagnostic(span));
    }
}
