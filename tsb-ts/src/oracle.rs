use crate::decl::{Decl, Keyword, Member, TypeNode};
use crate::source::FileId;

/// Where a name is being looked up from: a file and the script namespace path enclosing the lookup site
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Scope {
    pub file: FileId,
    pub namespace: Vec<String>,
}

impl Scope {
    pub fn new(file: FileId, namespace: Vec<String>) -> Scope {
        Scope { file, namespace }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Class,
    Interface,
    Enum { is_const: bool },
    TypeAlias,
    Function,
    Variable,
    Namespace,
    /// Part of the standard declaration library rather than the inputs
    Builtin,
}

impl SymbolKind {
    /// Whether a symbol of this kind can appear in type position
    pub fn is_type(&self) -> bool {
        !matches!(
            self,
            SymbolKind::Function | SymbolKind::Variable | SymbolKind::Namespace
        )
    }
}

#[derive(Copy, Clone, Debug)]
pub struct Symbol<'o> {
    pub name: &'o str,
    pub kind: SymbolKind,
    pub namespace: &'o [String],
    pub file: Option<FileId>,
    pub decl: Option<&'o Decl>,
}

#[derive(Debug)]
pub enum ResolvedType<'o> {
    /// The node refers to something that does not exist or is not a type
    Error,
    Intrinsic(Keyword),
    Declared(Symbol<'o>),
    Alias {
        symbol: Symbol<'o>,
        target: &'o TypeNode,
        scope: Scope,
    },
    /// Anonymous shapes: object literals, function types, unions and the like
    Structural,
}

/// The semantic questions the schema extractor asks about declaration files.
///
/// [`crate::Program`] answers them from the parsed inputs; tests can substitute their own implementation.
pub trait Oracle {
    /// Look up a (possibly dotted) name from `scope`, innermost namespace first
    fn resolve_symbol(&self, name: &str, scope: &Scope) -> Option<Symbol<'_>>;

    fn resolve_type_of_node(&self, node: &TypeNode, scope: &Scope) -> ResolvedType<'_>;

    /// Members of an object type literal, or of the class or interface a node refers to
    fn properties_of_type<'a>(&'a self, node: &'a TypeNode, scope: &Scope) -> Option<&'a [Member]>;
}
