//! Declarations and the translation-unit arena.
//!
//! A [`Module`] holds every top-level declaration of one translation unit.
//! Functions live in a single arena regardless of where they were declared;
//! type declarations and extensions refer to their methods by [`FuncId`].
//! Use-sites in expression trees refer back into these arenas by id, never by
//! ownership.

use crate::expr::Expr;
use crate::stmt::Block;
use crate::types::Type;
use velac_util::{define_idx, IndexVec, Span, Symbol};

define_idx!(
    /// Index of a type declaration in [`Module::types`].
    TypeDeclId
);
define_idx!(
    /// Index of a function declaration in [`Module::funcs`].
    FuncId
);
define_idx!(
    /// Index of a global variable in [`Module::globals`].
    GlobalId
);

/// One parsed translation unit.
#[derive(Debug, Clone, Default)]
pub struct Module {
    pub types: IndexVec<TypeDeclId, TypeDecl>,
    pub funcs: IndexVec<FuncId, FuncDecl>,
    pub globals: IndexVec<GlobalId, VarDecl>,
    pub extensions: Vec<ExtensionDecl>,
    pub aliases: Vec<TypeAliasDecl>,
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_type(&mut self, decl: TypeDecl) -> TypeDeclId {
        self.types.push(decl)
    }

    pub fn add_func(&mut self, decl: FuncDecl) -> FuncId {
        self.funcs.push(decl)
    }

    pub fn add_global(&mut self, decl: VarDecl) -> GlobalId {
        self.globals.push(decl)
    }

    pub fn add_alias(&mut self, decl: TypeAliasDecl) {
        self.aliases.push(decl);
    }

    pub fn add_extension(&mut self, decl: ExtensionDecl) {
        self.extensions.push(decl);
    }
}

/// A nominal aggregate type declaration.
///
/// Non-indirect declarations have value semantics; `indirect` declarations
/// have reference semantics, hold identity, and may declare a deinitializer.
#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub name: Symbol,
    pub indirect: bool,
    /// Fields, in declaration order. Owned here; their `parent` backpointer
    /// is set during top-level registration.
    pub fields: Vec<VarDecl>,
    pub methods: Vec<FuncId>,
    pub initializers: Vec<FuncId>,
    pub deinitializer: Option<FuncId>,
    /// Names of conformed protocols.
    pub protocols: Vec<Symbol>,
    pub span: Span,
}

impl TypeDecl {
    pub fn new(name: Symbol, span: Span) -> Self {
        Self {
            name,
            indirect: false,
            fields: Vec::new(),
            methods: Vec::new(),
            initializers: Vec::new(),
            deinitializer: None,
            protocols: Vec::new(),
            span,
        }
    }
}

/// What position a function declaration occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuncKind {
    Free,
    Method,
    Initializer,
    Deinitializer,
    Closure,
}

/// A function declaration.
///
/// The name is empty for synthetic foreign handles manufactured during call
/// resolution; those never participate in name-based lookup.
#[derive(Debug, Clone)]
pub struct FuncDecl {
    pub name: Symbol,
    pub params: Vec<FuncParam>,
    pub ret_ty: Type,
    /// Absent for foreign and implicit declarations. Detached by the
    /// analyzer while the body is walked so arena reads cannot alias it.
    pub body: Option<Block>,
    pub kind: FuncKind,
    pub parent: Option<TypeDeclId>,
    pub is_foreign: bool,
    pub is_implicit: bool,
    pub is_mutating: bool,
    pub is_noreturn: bool,
    pub var_args: bool,
    pub span: Span,
}

impl FuncDecl {
    pub fn new(name: Symbol, kind: FuncKind) -> Self {
        Self {
            name,
            params: Vec::new(),
            ret_ty: Type::Void,
            body: None,
            kind,
            parent: None,
            is_foreign: false,
            is_implicit: false,
            is_mutating: false,
            is_noreturn: false,
            var_args: false,
            span: Span::DUMMY,
        }
    }

    /// Parameters without the implicit `self`, the view overload scoring
    /// compares against call arguments.
    pub fn explicit_params(&self) -> &[FuncParam] {
        match self.params.first() {
            Some(first) if first.is_self => &self.params[1..],
            _ => &self.params,
        }
    }

    /// The function type of this declaration, `self` excluded.
    pub fn fn_type(&self) -> Type {
        Type::function(
            self.explicit_params().iter().map(|p| p.ty.clone()).collect(),
            self.ret_ty.clone(),
            self.var_args,
        )
    }
}

/// A function parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct FuncParam {
    /// External argument label, checked at call sites when present.
    pub label: Option<Symbol>,
    /// Internal binding name.
    pub name: Symbol,
    pub ty: Type,
    pub is_self: bool,
    pub default: Option<Expr>,
    /// Parameter bindings are immutable unless the type is an indirect
    /// aggregate; the analyzer marks those mutable before walking bodies.
    pub mutable: bool,
}

impl FuncParam {
    pub fn new(name: Symbol, ty: Type) -> Self {
        Self {
            label: None,
            name,
            ty,
            is_self: false,
            default: None,
            mutable: false,
        }
    }

    pub fn labeled(label: Symbol, name: Symbol, ty: Type) -> Self {
        Self {
            label: Some(label),
            name,
            ty,
            is_self: false,
            default: None,
            mutable: false,
        }
    }

    /// The implicit `self` parameter of a method on `ty`.
    pub fn self_param(ty: Type) -> Self {
        Self {
            label: None,
            name: Symbol::intern("self"),
            ty,
            is_self: true,
            default: None,
            mutable: false,
        }
    }
}

/// A `let`/`var` declaration: global, local, or aggregate field.
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub name: Symbol,
    /// Declared type if annotated; filled in by inference otherwise.
    pub declared_ty: Option<Type>,
    pub init: Option<Expr>,
    /// `var` is mutable, `let` is not.
    pub mutable: bool,
    /// Foreign variables have no initializer.
    pub is_foreign: bool,
    /// Containing type declaration, for fields. Set during registration.
    pub parent: Option<TypeDeclId>,
    pub span: Span,
}

impl VarDecl {
    pub fn new(name: Symbol, mutable: bool, span: Span) -> Self {
        Self {
            name,
            declared_ty: None,
            init: None,
            mutable,
            is_foreign: false,
            parent: None,
            span,
        }
    }

    pub fn with_type(mut self, ty: Type) -> Self {
        self.declared_ty = Some(ty);
        self
    }

    pub fn with_init(mut self, init: Expr) -> Self {
        self.init = Some(init);
        self
    }
}

/// An extension adding methods to an existing nominal type.
#[derive(Debug, Clone)]
pub struct ExtensionDecl {
    pub target: Type,
    pub methods: Vec<FuncId>,
    pub span: Span,
}

/// A type alias; the bound type must resolve to a valid type.
#[derive(Debug, Clone)]
pub struct TypeAliasDecl {
    pub name: Symbol,
    pub bound: Type,
    pub span: Span,
}
