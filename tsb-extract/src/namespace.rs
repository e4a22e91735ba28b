//! Native namespace mapping and namespace markers.
//!
//! A namespace marker is a documented `declare const X: { ... }` carrying a bare `@namespace` tag. Each callable
//! member becomes a free function in namespace `X`. Markers only nest one level: a member that is itself an object
//! is reported instead of being flattened.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use tsb_ts::{Decl, MemberKind, TypeKind, TypeNode, VariableDecl};

use crate::error::{Error, ExtractionError};
use crate::function::{extract_function_signature, FunctionSchema};
use crate::tags::Tags;
use crate::Extractor;

type Result<T, E = ExtractionError> = std::result::Result<T, E>;

/// One `<dotted.namespace>:<path-prefix>` mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceEntry {
    pub namespace: Vec<String>,
    pub prefix: PathBuf,
}

impl FromStr for NamespaceEntry {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let invalid = || Error::InvalidNamespaceMapping(s.to_string());

        let (namespace, prefix) = s.split_once(':').ok_or_else(invalid)?;
        let namespace: Vec<String> = namespace.split('.').map(|s| s.trim().to_string()).collect();
        if namespace.iter().any(|s| s.is_empty()) {
            return Err(invalid());
        }

        Ok(NamespaceEntry {
            namespace,
            prefix: PathBuf::from(prefix),
        })
    }
}

/// Decides which native namespace an input file's bindings live in. The first matching prefix wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceMapping {
    entries: Vec<NamespaceEntry>,
}

impl NamespaceMapping {
    pub fn new() -> NamespaceMapping {
        NamespaceMapping::default()
    }

    pub fn push(&mut self, entry: NamespaceEntry) {
        self.entries.push(entry);
    }

    pub fn with(mut self, namespace: &str, prefix: impl Into<PathBuf>) -> NamespaceMapping {
        self.push(NamespaceEntry {
            namespace: namespace.split('.').map(|s| s.to_string()).collect(),
            prefix: prefix.into(),
        });
        self
    }

    pub fn entries(&self) -> &[NamespaceEntry] {
        &self.entries
    }

    pub fn pick(&self, path: &Path) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|e| path.starts_with(&e.prefix))
            .map(|e| e.namespace.as_slice())
    }

    /// Prefixes for error messages
    pub(crate) fn describe(&self) -> String {
        if self.entries.is_empty() {
            return "(none)".to_string();
        }
        self.entries
            .iter()
            .map(|e| format!("{}:{}", e.namespace.join("."), e.prefix.display()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Extract the functions of the namespace marker `decl`
pub(crate) fn extract_namespace_marker(
    ex: &mut Extractor,
    decl: &Decl,
    var: &VariableDecl,
    namespace: &[String],
    tags: &Tags,
) -> Result<Vec<FunctionSchema>> {
    let ty = var.ty.as_ref().ok_or_else(|| {
        ExtractionError::new(
            decl.span,
            Error::InvalidSignature(format!("namespace \"{}\" has no type annotation", decl.name)),
        )
    })?;

    let native_namespace = ex.native_namespace(tags, decl.span)?;
    let scope = ex.scope(namespace);
    let oracle = ex.resolver.oracle();
    let members = oracle.properties_of_type(ty, &scope).ok_or_else(|| {
        ExtractionError::new(
            ty.span,
            Error::UnsupportedType {
                ty: ty.to_string(),
                reason: "namespaces must have an object or interface type".to_string(),
            },
        )
    })?;

    let mut fn_namespace = namespace.to_vec();
    fn_namespace.push(decl.name.clone());

    let mut functions = Vec::new();
    for member in members {
        let member_tags = match ex.tags(member.doc.as_ref(), member.span) {
            Ok(tags) => tags,
            Err(e) => {
                ex.record(e);
                continue;
            }
        };
        if member_tags.skip {
            continue;
        }

        let sig = match &member.kind {
            MemberKind::Method(sig) => sig,
            MemberKind::Property(Some(TypeNode {
                kind: TypeKind::Function(sig),
                ..
            })) => sig.as_ref(),
            MemberKind::Property(Some(TypeNode {
                kind: TypeKind::Object(_),
                ..
            })) => {
                ex.record(ExtractionError::new(
                    member.span,
                    Error::NestedNamespace {
                        namespace: decl.name.clone(),
                        member: member.name.clone(),
                    },
                ));
                continue;
            }
            _ => {
                ex.record(ExtractionError::new(
                    member.span,
                    Error::NonCallableNamespaceMember {
                        namespace: decl.name.clone(),
                        member: member.name.clone(),
                    },
                ));
                continue;
            }
        };

        match extract_function_signature(
            ex,
            &member.name,
            member.span,
            sig,
            &fn_namespace,
            &native_namespace,
            member_tags,
        ) {
            Ok(f) => functions.push(f),
            Err(e) => ex.record(e),
        }
    }

    Ok(functions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_entries() {
        let e: NamespaceEntry = "krit.math:/src/krit/math".parse().unwrap();
        assert_eq!(e.namespace, ["krit", "math"]);
        assert_eq!(e.prefix, Path::new("/src/krit/math"));

        assert!("nocolon".parse::<NamespaceEntry>().is_err());
        assert!("a..b:/x".parse::<NamespaceEntry>().is_err());
    }

    #[test]
    fn first_matching_prefix_wins() {
        let mapping = NamespaceMapping::new()
            .with("krit.math", "/src/krit/math")
            .with("krit", "/src/krit")
            .with("other", "/src/krit/math");

        assert_eq!(
            mapping.pick(Path::new("/src/krit/math/Point.d.ts")),
            Some(&["krit".to_string(), "math".to_string()][..])
        );
        assert_eq!(
            mapping.pick(Path::new("/src/krit/Sprite.d.ts")),
            Some(&["krit".to_string()][..])
        );
        // component-wise, not textual
        assert_eq!(mapping.pick(Path::new("/src/kritter/A.d.ts")), None);
        assert_eq!(
            mapping.describe(),
            "krit.math:/src/krit/math, krit:/src/krit, other:/src/krit/math"
        );
    }
}
