//! Owned declaration tree lowered from the parser's arena AST.
//!
//! Only the subset of the declaration language the binding generator cares about is modelled. Everything else is
//! kept as an `Other`/`Unsupported` placeholder carrying a short description so the extractor can report it.

use std::fmt::Display;

use crate::source::Span;

/// Contents of a `/** ... */` block with the delimiters removed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Doc {
    pub span: Span,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct Decl {
    pub name: String,
    pub span: Span,
    pub doc: Option<Doc>,
    pub kind: DeclKind,
}

#[derive(Debug, Clone)]
pub enum DeclKind {
    Class(ClassDecl),
    Enum(EnumDecl),
    Function(Signature),
    Variable(VariableDecl),
    TypeAlias(TypeAliasDecl),
    Namespace(Vec<Decl>),
}

impl DeclKind {
    pub fn describe(&self) -> &'static str {
        match self {
            DeclKind::Class(c) if c.is_interface => "interface",
            DeclKind::Class(_) => "class",
            DeclKind::Enum(_) => "enum",
            DeclKind::Function(_) => "function",
            DeclKind::Variable(_) => "variable",
            DeclKind::TypeAlias(_) => "type alias",
            DeclKind::Namespace(_) => "namespace",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub is_interface: bool,
    pub type_params: Vec<String>,
    pub heritage: Vec<Heritage>,
    pub members: Vec<Member>,
}

/// One entry of an `extends` or `implements` clause
#[derive(Debug, Clone)]
pub struct Heritage {
    /// Dotted name of the parent, or `None` if the clause is not a plain (qualified) name
    pub name: Option<String>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct EnumDecl {
    pub is_const: bool,
    pub members: Vec<EnumMember>,
}

#[derive(Debug, Clone)]
pub struct EnumMember {
    pub name: String,
    pub span: Span,
    pub doc: Option<Doc>,
    pub has_initializer: bool,
}

#[derive(Debug, Clone)]
pub struct VariableDecl {
    pub ty: Option<TypeNode>,
}

#[derive(Debug, Clone)]
pub struct TypeAliasDecl {
    pub type_params: Vec<String>,
    pub ty: TypeNode,
}

#[derive(Debug, Clone)]
pub struct Member {
    pub name: String,
    pub span: Span,
    pub doc: Option<Doc>,
    pub is_static: bool,
    pub is_readonly: bool,
    pub is_optional: bool,
    pub kind: MemberKind,
}

#[derive(Debug, Clone)]
pub enum MemberKind {
    Property(Option<TypeNode>),
    Method(Signature),
    Getter(Option<TypeNode>),
    Setter(Option<Param>),
    Constructor(Signature),
    Unsupported(&'static str),
}

#[derive(Debug, Clone)]
pub struct Signature {
    pub span: Span,
    pub type_params: Vec<String>,
    pub params: Vec<Param>,
    pub ret: Option<TypeNode>,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub span: Span,
    pub doc: Option<Doc>,
    pub ty: Option<TypeNode>,
    pub optional: bool,
    pub rest: bool,
}

#[derive(Debug, Clone)]
pub struct TypeNode {
    pub span: Span,
    pub kind: TypeKind,
}

#[derive(Debug, Clone)]
pub enum TypeKind {
    Keyword(Keyword),
    Array(Box<TypeNode>),
    Function(Box<Signature>),
    Literal(String),
    /// `?T` or `T?`
    Optional(Box<TypeNode>),
    Union(Vec<TypeNode>),
    Reference { name: String, args: Vec<TypeNode> },
    Object(Vec<Member>),
    Other(&'static str),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Keyword {
    Any,
    Unknown,
    Never,
    Boolean,
    Number,
    BigInt,
    String,
    Symbol,
    Object,
    Void,
    Undefined,
    Null,
    This,
    Intrinsic,
}

impl Keyword {
    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Any => "any",
            Keyword::Unknown => "unknown",
            Keyword::Never => "never",
            Keyword::Boolean => "boolean",
            Keyword::Number => "number",
            Keyword::BigInt => "bigint",
            Keyword::String => "string",
            Keyword::Symbol => "symbol",
            Keyword::Object => "object",
            Keyword::Void => "void",
            Keyword::Undefined => "undefined",
            Keyword::Null => "null",
            Keyword::This => "this",
            Keyword::Intrinsic => "intrinsic",
        }
    }
}

impl TypeNode {
    /// Whether this node denotes absence (`undefined` or `null`)
    pub fn is_absent(&self) -> bool {
        matches!(
            self.kind,
            TypeKind::Keyword(Keyword::Undefined) | TypeKind::Keyword(Keyword::Null)
        )
    }

    /// The name of a type reference, if this is one
    pub fn reference_name(&self) -> Option<&str> {
        match &self.kind {
            TypeKind::Reference { name, .. } => Some(name),
            _ => None,
        }
    }
}

impl Display for TypeNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            TypeKind::Keyword(k) => write!(f, "{}", k.as_str()),
            TypeKind::Array(e) => {
                if matches!(e.kind, TypeKind::Union(_) | TypeKind::Function(_)) {
                    write!(f, "({e})[]")
                } else {
                    write!(f, "{e}[]")
                }
            }
            TypeKind::Function(sig) => {
                write!(f, "(")?;
                for (i, p) in sig.params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}{}", if p.rest { "..." } else { "" }, p.name)?;
                    if p.optional {
                        write!(f, "?")?;
                    }
                    if let Some(ty) = &p.ty {
                        write!(f, ": {ty}")?;
                    }
                }
                write!(f, ") => ")?;
                match &sig.ret {
                    Some(ret) => write!(f, "{ret}"),
                    None => write!(f, "void"),
                }
            }
            TypeKind::Literal(text) => write!(f, "{text}"),
            TypeKind::Optional(inner) => write!(f, "{inner}?"),
            TypeKind::Union(arms) => {
                for (i, arm) in arms.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{arm}")?;
                }
                Ok(())
            }
            TypeKind::Reference { name, args } => {
                write!(f, "{name}")?;
                if !args.is_empty() {
                    write!(f, "<")?;
                    for (i, a) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{a}")?;
                    }
                    write!(f, ">")?;
                }
                Ok(())
            }
            TypeKind::Object(members) => {
                write!(f, "{{")?;
                for m in members {
                    write!(f, " {};", m.name)?;
                }
                write!(f, " }}")
            }
            TypeKind::Other(desc) => write!(f, "<{desc}>"),
        }
    }
}
