use crate::frontend::ast::{TypeExpr, TypeExprKind};

/// The types the resolver distinguishes. Identity is plain equality; the
/// analysis only ever asks "is this exactly the predeclared `error`
/// interface", so everything it cannot prove is folded into `Unknown`,
/// which is never flagged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Type {
    /// The predeclared `error` interface, the error-carrier type.
    Error,
    Basic(BasicType),
    /// A type defined in the analyzed file. Defined types over `error`
    /// (`type myErr error`) are distinct from `Error` by identity.
    Named(String),
    Pointer(Box<Type>),
    Slice(Box<Type>),
    Array(Box<Type>),
    Map(Box<Type>, Box<Type>),
    Chan(Box<Type>),
    Func,
    Interface,
    Struct(String),
    Unknown,
}

impl Type {
    pub fn is_error(&self) -> bool {
        matches!(self, Type::Error)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BasicType {
    Bool,
    String,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Float32,
    Float64,
    Complex64,
    Complex128,
    Byte,
    Rune,
}

pub fn basic_from_name(name: &str) -> Option<BasicType> {
    let basic = match name {
        "bool" => BasicType::Bool,
        "string" => BasicType::String,
        "int" => BasicType::Int,
        "int8" => BasicType::Int8,
        "int16" => BasicType::Int16,
        "int32" => BasicType::Int32,
        "int64" => BasicType::Int64,
        "uint" => BasicType::Uint,
        "uint8" => BasicType::Uint8,
        "uint16" => BasicType::Uint16,
        "uint32" => BasicType::Uint32,
        "uint64" => BasicType::Uint64,
        "uintptr" => BasicType::Uintptr,
        "float32" => BasicType::Float32,
        "float64" => BasicType::Float64,
        "complex64" => BasicType::Complex64,
        "complex128" => BasicType::Complex128,
        "byte" => BasicType::Byte,
        "rune" => BasicType::Rune,
        _ => return None,
    };
    Some(basic)
}

/// Lowers a syntactic type to the resolver's type representation. Names are
/// taken at face value: `error` is the predeclared interface unless the file
/// shadows it, which the subset does not model.
pub fn lower_type(ty: &TypeExpr) -> Type {
    match &ty.kind {
        TypeExprKind::Named(name) => {
            if name == "error" {
                Type::Error
            } else if name == "any" {
                Type::Interface
            } else if let Some(basic) = basic_from_name(name) {
                Type::Basic(basic)
            } else {
                Type::Named(name.clone())
            }
        }
        TypeExprKind::Qualified(_, _) => Type::Unknown,
        TypeExprKind::Pointer(inner) => Type::Pointer(Box::new(lower_type(inner))),
        TypeExprKind::Slice(inner) => Type::Slice(Box::new(lower_type(inner))),
        TypeExprKind::Array(inner) => Type::Array(Box::new(lower_type(inner))),
        TypeExprKind::Map(key, value) => {
            Type::Map(Box::new(lower_type(key)), Box::new(lower_type(value)))
        }
        TypeExprKind::Chan(inner) => Type::Chan(Box::new(lower_type(inner))),
        TypeExprKind::Func { .. } => Type::Func,
        TypeExprKind::Struct(_) => Type::Struct(String::new()),
        TypeExprKind::Interface => Type::Interface,
        TypeExprKind::Ellipsis(inner) => Type::Slice(Box::new(lower_type(inner))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::ast::Span;

    fn named(name: &str) -> TypeExpr {
        TypeExpr {
            kind: TypeExprKind::Named(name.to_string()),
            span: Span {
                start: 0,
                end: 0,
                line: 1,
                column: 1,
            },
        }
    }

    #[test]
    fn error_name_is_the_error_carrier() {
        assert_eq!(lower_type(&named("error")), Type::Error);
        assert!(lower_type(&named("error")).is_error());
    }

    #[test]
    fn defined_type_over_error_is_not_the_error_carrier() {
        // `type myErr error` yields Named, never Error: identity, not
        // structural compatibility.
        assert_eq!(
            lower_type(&named("myErr")),
            Type::Named("myErr".to_string())
        );
        assert!(!lower_type(&named("myErr")).is_error());
    }

    #[test]
    fn basic_names_lower_to_basics() {
        assert_eq!(lower_type(&named("int")), Type::Basic(BasicType::Int));
        assert_eq!(lower_type(&named("string")), Type::Basic(BasicType::String));
    }
}
