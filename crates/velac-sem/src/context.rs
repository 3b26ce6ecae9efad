//! The semantic context: global symbol table and type queries.
//!
//! Built from a parsed [`Module`] by [`SemanticContext::register_top_level`],
//! which also performs the structural checks that must precede the tree walk:
//! attaching extension methods, setting field backpointers, rejecting
//! duplicate fields and duplicate mangled method signatures, detecting
//! structural cycles, and synthesizing memberwise initializers for types
//! that declare none.
//!
//! All maps are declaration-ordered, so overload tie-breaks are
//! deterministic and re-registering an unchanged module produces an
//! identical context.

use indexmap::IndexMap;
use velac_ast::{
    FuncDecl, FuncId, FuncKind, FuncParam, GlobalId, InfixOp, Module, OpCategory, Type, TypeDeclId,
};
use velac_util::{FxHashMap, FxHashSet, Handler, Span, Symbol};

use crate::errors::SemError;

/// Global symbol table for one translation unit.
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticContext {
    types: IndexMap<Symbol, TypeDeclId>,
    functions: IndexMap<Symbol, Vec<FuncId>>,
    globals: IndexMap<Symbol, GlobalId>,
    aliases: IndexMap<Symbol, Type>,
}

impl SemanticContext {
    /// Register every top-level declaration of the module and run the
    /// structural checks. Diagnostics go to the handler; registration always
    /// completes so the tree walk can proceed over whatever is valid.
    pub fn register_top_level(module: &mut Module, handler: &Handler) -> Self {
        let mut ctx = SemanticContext {
            types: IndexMap::new(),
            functions: IndexMap::new(),
            globals: IndexMap::new(),
            aliases: IndexMap::new(),
        };

        // Name maps first, so extension targets and alias bounds can refer
        // forward.
        for (id, decl) in module.types.iter_enumerated() {
            ctx.types.insert(decl.name, id);
        }
        for alias in &module.aliases {
            ctx.aliases.insert(alias.name, alias.bound.clone());
        }
        for (id, decl) in module.globals.iter_enumerated() {
            ctx.globals.insert(decl.name, id);
        }
        for (id, decl) in module.funcs.iter_enumerated() {
            if decl.kind == FuncKind::Free && !decl.name.is_empty() {
                ctx.functions.entry(decl.name).or_default().push(id);
            }
        }

        // Step 1: attach extension methods to their target declarations.
        let extensions = module.extensions.clone();
        for ext in &extensions {
            match ctx.decl_for(&ext.target, false) {
                Some(tid) => {
                    for &fid in &ext.methods {
                        module.funcs[fid].parent = Some(tid);
                        module.types[tid].methods.push(fid);
                    }
                }
                None => SemError::UnknownType {
                    ty: ext.target.clone(),
                }
                .emit(handler, ext.span),
            }
        }

        // Step 2: per-type structural checks.
        let type_ids: Vec<TypeDeclId> = module.types.indices().collect();
        for tid in type_ids {
            ctx.register_type_decl(module, tid, handler);
        }

        // Step 3: alias bounds must name real types.
        for alias in &module.aliases {
            if !ctx.is_valid_type(&alias.bound) {
                SemError::UnknownType {
                    ty: alias.bound.clone(),
                }
                .emit(handler, alias.span);
            }
        }

        ctx
    }

    fn register_type_decl(&self, module: &mut Module, tid: TypeDeclId, handler: &Handler) {
        let name = module.types[tid].name;
        let self_ty = Type::Custom(name);

        // Field backpointers and duplicate field names.
        let mut seen_fields: FxHashMap<Symbol, Span> = FxHashMap::default();
        for i in 0..module.types[tid].fields.len() {
            module.types[tid].fields[i].parent = Some(tid);
            let field_name = module.types[tid].fields[i].name;
            let field_span = module.types[tid].fields[i].span;
            if let Some(&first) = seen_fields.get(&field_name) {
                handler.emit_diagnostic(
                    SemError::DuplicateField {
                        name: field_name,
                        ty: name,
                    }
                    .into_diagnostic(field_span)
                    .with_highlight(first),
                );
            } else {
                seen_fields.insert(field_name, field_span);
            }
        }

        // Every member takes an implicit self parameter.
        let members: Vec<FuncId> = {
            let decl = &module.types[tid];
            decl.initializers
                .iter()
                .chain(&decl.methods)
                .copied()
                .chain(decl.deinitializer)
                .collect()
        };
        for fid in members {
            module.funcs[fid].parent = Some(tid);
            let needs_self = module.funcs[fid]
                .params
                .first()
                .map_or(true, |p| !p.is_self);
            if needs_self {
                module.funcs[fid]
                    .params
                    .insert(0, FuncParam::self_param(self_ty.clone()));
            }
        }

        // Initializers produce the declared type.
        let initializers = module.types[tid].initializers.clone();
        for fid in initializers {
            module.funcs[fid].ret_ty = self_ty.clone();
        }

        // Memberwise initializer for types that declare none.
        if module.types[tid].initializers.is_empty() {
            let mut init = FuncDecl::new(Symbol::intern("init"), FuncKind::Initializer);
            init.parent = Some(tid);
            init.is_implicit = true;
            init.ret_ty = self_ty.clone();
            init.span = module.types[tid].span;
            init.params.push(FuncParam::self_param(self_ty.clone()));
            for field in &module.types[tid].fields {
                let ty = field.declared_ty.clone().unwrap_or(Type::Error);
                init.params.push(FuncParam::labeled(field.name, field.name, ty));
            }
            let fid = module.funcs.push(init);
            module.types[tid].initializers.push(fid);
        }

        // Duplicate mangled method signatures. Legitimate overloads mangle
        // differently; exact parameter-list duplicates do not. Extension
        // methods were attached in step 1, so they participate here.
        let mut seen_sigs: FxHashMap<String, Span> = FxHashMap::default();
        let methods = module.types[tid].methods.clone();
        for fid in methods {
            let key = self.signature_key(module, fid);
            let span = module.funcs[fid].span;
            if let Some(&first) = seen_sigs.get(&key) {
                handler.emit_diagnostic(
                    SemError::DuplicateMethod {
                        name: module.funcs[fid].name,
                        ty: name,
                    }
                    .into_diagnostic(span)
                    .with_highlight(first),
                );
            } else {
                seen_sigs.insert(key, span);
            }
        }

        // Structural cycles through non-indirect fields.
        if self.is_circular_type(module, tid) {
            SemError::ReferenceSelfInProp { ty: name }.emit(handler, module.types[tid].span);
        }
    }

    /// Nominal lookup of a type declaration by name.
    pub fn type_decl(&self, name: Symbol) -> Option<TypeDeclId> {
        self.types.get(&name).copied()
    }

    /// The declaration behind a nominal type, canonicalizing first unless
    /// the caller already did.
    pub fn decl_for(&self, ty: &Type, canonicalized: bool) -> Option<TypeDeclId> {
        let canonical;
        let ty = if canonicalized {
            ty
        } else {
            canonical = self.canonical_type(ty);
            &canonical
        };
        match ty {
            Type::Custom(name) => self.type_decl(*name),
            _ => None,
        }
    }

    /// Free functions registered under a name, in declaration order.
    pub fn functions(&self, name: Symbol) -> &[FuncId] {
        self.functions.get(&name).map_or(&[], |v| v.as_slice())
    }

    /// Global variable registered under a name.
    pub fn global(&self, name: Symbol) -> Option<GlobalId> {
        self.globals.get(&name).copied()
    }

    /// Resolve a bare name to a type: builtin, alias, or declared nominal.
    pub fn type_named(&self, name: Symbol) -> Option<Type> {
        if let Some(builtin) = Type::builtin(name.as_str()) {
            return Some(builtin);
        }
        if self.aliases.contains_key(&name) {
            return Some(self.canonical_type(&Type::Custom(name)));
        }
        self.types
            .contains_key(&name)
            .then_some(Type::Custom(name))
    }

    /// True when every nominal component of the type resolves.
    pub fn is_valid_type(&self, ty: &Type) -> bool {
        match ty {
            Type::Custom(name) => {
                self.types.contains_key(name) || self.aliases.contains_key(name)
            }
            Type::Pointer(pointee) => self.is_valid_type(pointee),
            Type::Tuple(elements) => elements.iter().all(|e| self.is_valid_type(e)),
            Type::Function { args, ret, .. } => {
                args.iter().all(|a| self.is_valid_type(a)) && self.is_valid_type(ret)
            }
            _ => true,
        }
    }

    /// Collapse alias chains and recurse into composites. The result
    /// contains no aliases; alias cycles degrade to [`Type::Error`].
    /// Idempotent: canonicalizing a canonical type is the identity.
    pub fn canonical_type(&self, ty: &Type) -> Type {
        let mut seen = FxHashSet::default();
        self.canonicalize(ty, &mut seen)
    }

    fn canonicalize(&self, ty: &Type, seen: &mut FxHashSet<Symbol>) -> Type {
        match ty {
            Type::Custom(name) => match self.aliases.get(name) {
                Some(bound) => {
                    if !seen.insert(*name) {
                        return Type::Error;
                    }
                    self.canonicalize(bound, seen)
                }
                None => ty.clone(),
            },
            Type::Pointer(pointee) => Type::Pointer(Box::new(self.canonicalize(pointee, seen))),
            Type::Tuple(elements) => {
                Type::Tuple(elements.iter().map(|e| self.canonicalize(e, seen)).collect())
            }
            Type::Function {
                args,
                ret,
                var_args,
            } => Type::Function {
                args: args.iter().map(|a| self.canonicalize(a, seen)).collect(),
                ret: Box::new(self.canonicalize(ret, seen)),
                var_args: *var_args,
            },
            _ => ty.clone(),
        }
    }

    /// Implicit coercibility: identity, integer widening of the same
    /// signedness, integers into floats of sufficient width, and `Any` as a
    /// universal target (the foreign-call boundary). Never narrowing.
    pub fn can_coerce(&self, from: &Type, to: &Type) -> bool {
        let from = self.canonical_type(from);
        let to = self.canonical_type(to);
        if from.is_error() || to.is_error() {
            return true;
        }
        if from == to {
            return true;
        }
        match (&from, &to) {
            (
                Type::Int {
                    width: fw,
                    signed: fs,
                },
                Type::Int {
                    width: tw,
                    signed: ts,
                },
            ) => fs == ts && fw < tw,
            (Type::Int { width: fw, .. }, Type::Float { width: tw }) => fw <= tw,
            (_, Type::Any) => true,
            _ => false,
        }
    }

    /// Explicit (`as`) coercibility: everything implicit, plus
    /// pointer-to-pointer and any numeric conversion.
    pub fn can_cast(&self, from: &Type, to: &Type) -> bool {
        let from = self.canonical_type(from);
        let to = self.canonical_type(to);
        if self.can_coerce(&from, &to) {
            return true;
        }
        (from.is_pointer() && to.is_pointer()) || (from.is_numeric() && to.is_numeric())
    }

    /// True iff `nil` is a valid value of the type.
    pub fn can_be_nil(&self, ty: &Type) -> bool {
        self.canonical_type(ty).is_pointer()
    }

    /// Result type of a builtin operator applied to an operand type, or
    /// `None` when the category rejects the operand.
    pub fn operator_type(&self, op: InfixOp, operand: &Type) -> Option<Type> {
        let operand = self.canonical_type(operand);
        match op.category() {
            OpCategory::Arithmetic => {
                if operand.is_numeric() {
                    Some(operand)
                } else {
                    None
                }
            }
            OpCategory::Equality => {
                let equatable = matches!(
                    operand,
                    Type::Bool | Type::Int { .. } | Type::Float { .. } | Type::String
                ) || operand.is_pointer();
                if equatable {
                    Some(Type::Bool)
                } else {
                    None
                }
            }
            OpCategory::Ordering => {
                if operand.is_numeric() || operand == Type::String {
                    Some(Type::Bool)
                } else {
                    None
                }
            }
            OpCategory::Logical => {
                if operand == Type::Bool {
                    Some(Type::Bool)
                } else {
                    None
                }
            }
            OpCategory::Bitwise => {
                if operand.is_integer() {
                    Some(operand)
                } else {
                    None
                }
            }
            OpCategory::Assignment => Some(Type::Void),
        }
    }

    /// Structural cycle check: DFS over non-indirect field nominal targets.
    /// Indirect declarations and pointer fields break cycles; a non-indirect
    /// type storing itself (directly or through other value types) is
    /// circular.
    pub fn is_circular_type(&self, module: &Module, tid: TypeDeclId) -> bool {
        if module.types[tid].indirect {
            return false;
        }
        let mut seen = FxHashSet::default();
        module.types[tid].fields.iter().any(|field| {
            field
                .declared_ty
                .as_ref()
                .is_some_and(|ty| self.stores_inline(module, ty, tid, &mut seen))
        })
    }

    fn stores_inline(
        &self,
        module: &Module,
        ty: &Type,
        target: TypeDeclId,
        seen: &mut FxHashSet<TypeDeclId>,
    ) -> bool {
        match self.canonical_type(ty) {
            Type::Custom(name) => match self.type_decl(name) {
                Some(tid) => {
                    if module.types[tid].indirect {
                        return false;
                    }
                    if tid == target {
                        return true;
                    }
                    if !seen.insert(tid) {
                        return false;
                    }
                    module.types[tid].fields.iter().any(|field| {
                        field
                            .declared_ty
                            .as_ref()
                            .is_some_and(|t| self.stores_inline(module, t, target, seen))
                    })
                }
                None => false,
            },
            Type::Tuple(elements) => elements
                .iter()
                .any(|e| self.stores_inline(module, e, target, seen)),
            _ => false,
        }
    }

    /// The mangled signature key used for duplicate detection: the name plus
    /// the canonical explicit parameter types.
    pub fn signature_key(&self, module: &Module, fid: FuncId) -> String {
        let decl = &module.funcs[fid];
        let params: Vec<String> = decl
            .explicit_params()
            .iter()
            .map(|p| self.canonical_type(&p.ty).to_string())
            .collect();
        format!("{}({})", decl.name, params.join(","))
    }

    /// Human-readable signature for candidate listings.
    pub fn pretty_signature(&self, module: &Module, fid: FuncId) -> String {
        let decl = &module.funcs[fid];
        let mut params: Vec<String> = decl
            .explicit_params()
            .iter()
            .map(|p| match p.label {
                Some(label) => format!("{label}: {}", p.ty),
                None => p.ty.to_string(),
            })
            .collect();
        if decl.var_args {
            params.push("...".to_string());
        }
        format!("{}({}) -> {}", decl.name, params.join(", "), decl.ret_ty)
    }
}
