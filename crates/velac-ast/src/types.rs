//! The Vela type model.
//!
//! Types are structural except for [`Type::Custom`], which is nominal and
//! resolved through the semantic context. [`Type::Error`] is the sentinel the
//! analyzer assigns when a node fails to type-check; it suppresses cascade
//! diagnostics downstream.

use std::fmt;
use velac_util::Symbol;

/// A type in the Vela type system.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// The empty type of statements and value-less returns
    Void,
    /// Boolean type
    Bool,
    /// Sized integer type
    Int { width: u8, signed: bool },
    /// Sized floating-point type
    Float { width: u8 },
    /// String type
    String,
    /// Matches any type on one side of a match test; used for variadic
    /// foreign arguments, never implicitly coerced both ways
    Any,
    /// C-like pointer
    Pointer(Box<Type>),
    /// Ordered tuple; length may be zero
    Tuple(Vec<Type>),
    /// Function type
    Function {
        args: Vec<Type>,
        ret: Box<Type>,
        var_args: bool,
    },
    /// Nominal reference to a type declaration or alias, by name
    Custom(Symbol),
    /// Sentinel for failed checks (suppresses cascade diagnostics)
    Error,
}

impl Type {
    /// The default integer type (64-bit signed).
    pub const INT: Type = Type::Int {
        width: 64,
        signed: true,
    };
    pub const INT8: Type = Type::Int {
        width: 8,
        signed: true,
    };
    pub const INT16: Type = Type::Int {
        width: 16,
        signed: true,
    };
    pub const INT32: Type = Type::Int {
        width: 32,
        signed: true,
    };
    pub const UINT: Type = Type::Int {
        width: 64,
        signed: false,
    };
    pub const UINT8: Type = Type::Int {
        width: 8,
        signed: false,
    };
    pub const UINT16: Type = Type::Int {
        width: 16,
        signed: false,
    };
    pub const UINT32: Type = Type::Int {
        width: 32,
        signed: false,
    };
    /// The default floating-point type (64-bit).
    pub const FLOAT: Type = Type::Float { width: 64 };
    pub const FLOAT32: Type = Type::Float { width: 32 };

    /// Build a pointer type.
    pub fn pointer(pointee: Type) -> Type {
        Type::Pointer(Box::new(pointee))
    }

    /// Build a function type.
    pub fn function(args: Vec<Type>, ret: Type, var_args: bool) -> Type {
        Type::Function {
            args,
            ret: Box::new(ret),
            var_args,
        }
    }

    /// Build a nominal reference from a name.
    pub fn custom(name: &str) -> Type {
        Type::Custom(Symbol::intern(name))
    }

    /// Look up a built-in type by its source-level name.
    pub fn builtin(name: &str) -> Option<Type> {
        Some(match name {
            "Void" => Type::Void,
            "Bool" => Type::Bool,
            "Int" | "Int64" => Type::INT,
            "Int8" => Type::INT8,
            "Int16" => Type::INT16,
            "Int32" => Type::INT32,
            "UInt" | "UInt64" => Type::UINT,
            "UInt8" => Type::UINT8,
            "UInt16" => Type::UINT16,
            "UInt32" => Type::UINT32,
            "Float" | "Double" => Type::FLOAT,
            "Float32" => Type::FLOAT32,
            "String" => Type::String,
            "Any" => Type::Any,
            _ => return None,
        })
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Type::Int { .. })
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Type::Float { .. })
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_float()
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Type::Pointer(_))
    }

    pub fn is_function(&self) -> bool {
        matches!(self, Type::Function { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Type::Error)
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Type::Void)
    }

    /// The pointee of a pointer type, if any.
    pub fn pointee(&self) -> Option<&Type> {
        match self {
            Type::Pointer(p) => Some(p),
            _ => None,
        }
    }

    /// Match test: structural equality, except that [`Type::Any`] matches
    /// every type on either side and [`Type::Error`] matches everything so
    /// failed nodes do not cascade.
    pub fn matches(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::Any, _) | (_, Type::Any) => true,
            (Type::Error, _) | (_, Type::Error) => true,
            (Type::Pointer(a), Type::Pointer(b)) => a.matches(b),
            (Type::Tuple(a), Type::Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.matches(y))
            }
            (
                Type::Function {
                    args: a,
                    ret: ar,
                    var_args: av,
                },
                Type::Function {
                    args: b,
                    ret: br,
                    var_args: bv,
                },
            ) => {
                av == bv
                    && a.len() == b.len()
                    && a.iter().zip(b).all(|(x, y)| x.matches(y))
                    && ar.matches(br)
            }
            _ => self == other,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Void => write!(f, "Void"),
            Type::Bool => write!(f, "Bool"),
            Type::Int { width: 64, signed: true } => write!(f, "Int"),
            Type::Int { width, signed: true } => write!(f, "Int{width}"),
            Type::Int { width: 64, signed: false } => write!(f, "UInt"),
            Type::Int { width, signed: false } => write!(f, "UInt{width}"),
            Type::Float { width: 64 } => write!(f, "Float"),
            Type::Float { width } => write!(f, "Float{width}"),
            Type::String => write!(f, "String"),
            Type::Any => write!(f, "Any"),
            Type::Pointer(pointee) => write!(f, "*{pointee}"),
            Type::Tuple(elements) => {
                write!(f, "(")?;
                for (i, e) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{e}")?;
                }
                write!(f, ")")
            }
            Type::Function {
                args,
                ret,
                var_args,
            } => {
                write!(f, "(")?;
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{a}")?;
                }
                if *var_args {
                    if !args.is_empty() {
                        write!(f, ", ")?;
                    }
                    write!(f, "...")?;
                }
                write!(f, ") -> {ret}")
            }
            Type::Custom(name) => write!(f, "{name}"),
            Type::Error => write!(f, "<error>"),
        }
    }
}
