use std::path::PathBuf;

use tsb_ts::{Diagnostic, Span};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("type resolution failed for \"{0}\"")]
    UnresolvedType(String),
    #[error("unsupported type \"{ty}\": {reason}")]
    UnsupportedType { ty: String, reason: String },
    #[error("\"{0}\" has multiple constructors; only one constructor is supported")]
    MultipleConstructors(String),
    #[error("\"{0}\" has more than one parent; only single inheritance is supported")]
    MultipleHeritage(String),
    #[error("couldn't resolve parent \"{parent}\" of \"{class}\" to a declared class or interface")]
    UnresolvedHeritage { class: String, parent: String },
    #[error("property \"{property}\" already has a {accessor}")]
    DuplicateAccessor { property: String, accessor: String },
    #[error("\"{0}\" is declared more than once; overloads are not supported")]
    DuplicateMember(String),
    #[error("\"{0}\" is declared more than once; merged declarations are not supported")]
    DuplicateDeclaration(String),
    #[error("\"{member}\" in namespace \"{namespace}\" is a nested namespace; namespaces may only contain functions")]
    NestedNamespace { namespace: String, member: String },
    #[error("\"{member}\" in namespace \"{namespace}\" is not a function")]
    NonCallableNamespaceMember { namespace: String, member: String },
    #[error("invalid @{tag} tag: {reason}")]
    InvalidTag { tag: String, reason: String },
    #[error("couldn't determine the native namespace for \"{}\"; mapped paths: {mapped}", path.display())]
    NoNamespaceMapping { path: PathBuf, mapped: String },
    #[error("invalid namespace mapping \"{0}\", expected <dotted.namespace>:<path>")]
    InvalidNamespaceMapping(String),
    #[error("invalid signature: {0}")]
    InvalidSignature(String),
    #[error("unsupported member \"{name}\": {what}")]
    UnsupportedMember { name: String, what: String },
    #[error("enum member \"{0}\" has an explicit value; enum values are their declaration order")]
    UnsupportedEnumValue(String),
}

/// An [`Error`] recorded against the declaration or member it was found on
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionError {
    pub span: Span,
    pub error: Error,
}

impl ExtractionError {
    pub fn new(span: Span, error: Error) -> ExtractionError {
        ExtractionError { span, error }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::new(self.span, self.error.to_string())
    }
}

impl std::fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl std::error::Error for ExtractionError {}
