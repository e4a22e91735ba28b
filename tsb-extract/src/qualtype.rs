use std::fmt::Display;

use serde::Serialize;

use crate::error::Error;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Primitive {
    Void,
    Bool,
    /// Double precision
    Number,
    Float,
    Integer,
    Int64,
    UInt,
    SizeT,
    /// Owning text
    String,
    /// Borrowed view of text owned elsewhere
    StringView,
    /// Raw null-terminated buffer
    CString,
    /// Dynamic script value
    Any,
}

impl Primitive {
    /// The primitive named `name` in declaration files
    pub fn from_name(name: &str) -> Option<Primitive> {
        let p = match name {
            "void" => Primitive::Void,
            "boolean" => Primitive::Bool,
            "number" => Primitive::Number,
            "float" => Primitive::Float,
            "integer" | "int" => Primitive::Integer,
            "int64" => Primitive::Int64,
            "uint" => Primitive::UInt,
            "size_t" => Primitive::SizeT,
            "string" => Primitive::String,
            "string_view" => Primitive::StringView,
            "cstring" => Primitive::CString,
            "any" | "ArrayBuffer" => Primitive::Any,
            _ => return None,
        };
        Some(p)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum TypeDescriptor {
    Primitive(Primitive),
    /// An integer at the boundary
    Enum {
        name: String,
        namespace: Vec<String>,
        /// Apply a narrowing cast rather than an implicit conversion
        explicit_cast: bool,
    },
    Array(Box<QualType>),
    Optional(Box<QualType>),
    /// Non-owning alias of a value
    Reference(Box<QualType>),
    /// Non-owning handle, `depth` levels of indirection deep
    Pointer { pointee: Box<QualType>, depth: u32 },
    /// String-keyed map
    Map(Box<QualType>),
    /// Opaque type owned by native code, passed through by its (dotted) name
    Named(String),
}

/// A resolved type together with the native expression for its static type, if one exists
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct QualType {
    pub descriptor: TypeDescriptor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access: Option<String>,
}

impl QualType {
    pub fn new(descriptor: TypeDescriptor, access: Option<String>) -> QualType {
        QualType { descriptor, access }
    }

    pub fn void() -> QualType {
        QualType::new(TypeDescriptor::Primitive(Primitive::Void), None)
    }

    pub fn is_void(&self) -> bool {
        matches!(self.descriptor, TypeDescriptor::Primitive(Primitive::Void))
    }

    pub fn is_optional(&self) -> bool {
        matches!(self.descriptor, TypeDescriptor::Optional(_))
    }

    /// Apply an `@cast` tag. Integers become the named enum, enums get the explicit cast flag.
    pub fn with_cast(self, enum_name: &str) -> Result<QualType, Error> {
        let descriptor = match self.descriptor {
            TypeDescriptor::Primitive(Primitive::Integer) => {
                let mut segments: Vec<String> = enum_name.split('.').map(|s| s.to_string()).collect();
                let name = segments.pop().unwrap_or_default();
                TypeDescriptor::Enum {
                    name,
                    namespace: segments,
                    explicit_cast: true,
                }
            }
            TypeDescriptor::Enum {
                name, namespace, ..
            } => TypeDescriptor::Enum {
                name,
                namespace,
                explicit_cast: true,
            },
            other => {
                return Err(Error::InvalidTag {
                    tag: "cast".to_string(),
                    reason: format!("only integer or enum types can be cast, not {other}"),
                })
            }
        };

        Ok(QualType::new(descriptor, self.access))
    }

    /// Ignore equivalent access expressions when comparing getter and setter types
    pub fn same_type(&self, other: &QualType) -> bool {
        self.descriptor.without_access() == other.descriptor.without_access()
    }
}

impl TypeDescriptor {
    fn without_access(&self) -> TypeDescriptor {
        let strip = |q: &QualType| Box::new(QualType::new(q.descriptor.without_access(), None));
        match self {
            TypeDescriptor::Array(q) => TypeDescriptor::Array(strip(q)),
            TypeDescriptor::Optional(q) => TypeDescriptor::Optional(strip(q)),
            TypeDescriptor::Reference(q) => TypeDescriptor::Reference(strip(q)),
            TypeDescriptor::Map(q) => TypeDescriptor::Map(strip(q)),
            TypeDescriptor::Pointer { pointee, depth } => TypeDescriptor::Pointer {
                pointee: strip(pointee),
                depth: *depth,
            },
            other => other.clone(),
        }
    }
}

impl Display for TypeDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeDescriptor::Primitive(p) => write!(f, "{p:?}"),
            TypeDescriptor::Enum {
                name,
                explicit_cast,
                ..
            } => {
                write!(f, "Enum({name}")?;
                if *explicit_cast {
                    write!(f, ", cast")?;
                }
                write!(f, ")")
            }
            TypeDescriptor::Array(q) => write!(f, "Array({q})"),
            TypeDescriptor::Optional(q) => write!(f, "Optional({q})"),
            TypeDescriptor::Reference(q) => write!(f, "Reference({q})"),
            TypeDescriptor::Pointer { pointee, depth } => write!(f, "Pointer({pointee}, {depth})"),
            TypeDescriptor::Map(q) => write!(f, "Map({q})"),
            TypeDescriptor::Named(name) => write!(f, "Named({name})"),
        }
    }
}

impl Display for QualType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cast_integer_to_enum() {
        let q = QualType::new(
            TypeDescriptor::Primitive(Primitive::Integer),
            Some("decltype(krit::Sprite::mode)".to_string()),
        );
        let cast = q.with_cast("gfx.BlendMode").unwrap();
        assert_eq!(
            cast.descriptor,
            TypeDescriptor::Enum {
                name: "BlendMode".into(),
                namespace: vec!["gfx".into()],
                explicit_cast: true
            }
        );
        assert_eq!(cast.access.as_deref(), Some("decltype(krit::Sprite::mode)"));
        assert_eq!(cast.to_string(), "Enum(BlendMode, cast)");

        let s = QualType::new(TypeDescriptor::Primitive(Primitive::String), None);
        assert!(matches!(s.with_cast("E"), Err(Error::InvalidTag { .. })));
    }

    #[test]
    fn same_type_ignores_access() {
        let a = QualType::new(
            TypeDescriptor::Array(Box::new(QualType::new(
                TypeDescriptor::Primitive(Primitive::Float),
                Some("A::value_type".into()),
            ))),
            Some("A".into()),
        );
        let b = QualType::new(
            TypeDescriptor::Array(Box::new(QualType::new(
                TypeDescriptor::Primitive(Primitive::Float),
                None,
            ))),
            None,
        );
        assert!(a.same_type(&b));
        assert_ne!(a, b);
    }
}
