//! The type descriptor resolver.
//!
//! Turns a declaration [`TypeNode`] into a [`QualType`]. The recognized forms are tried in a fixed order and the
//! first match wins:
//!
//! 1. `T[]` or `Array<T>`
//! 2. function types, which become opaque callbacks
//! 3. literal types (rejected)
//! 4. explicit optional wrappers
//! 5. two-armed unions with one `undefined` or `null` arm
//! 6. the `Reference`, `Pointer` and `Map` generic aliases (`Partial` is rejected here)
//! 7. primitive names
//! 8. enums
//! 9. any other declared type, passed through by name
//!
//! Type aliases declared in the inputs are followed to their targets before steps 8 and 9 apply.

use tracing::instrument;
use tsb_ts::{Keyword, Oracle, ResolvedType, Scope, SymbolKind, TypeKind, TypeNode, MAX_ALIAS_DEPTH};

use crate::error::{Error, ExtractionError};
use crate::qualtype::{Primitive, QualType, TypeDescriptor};

type Result<T, E = ExtractionError> = std::result::Result<T, E>;

pub const CALLBACK: &str = "callback";

pub struct Resolver<'o> {
    oracle: &'o dyn Oracle,
}

impl<'o> Resolver<'o> {
    pub fn new(oracle: &'o dyn Oracle) -> Resolver<'o> {
        Resolver { oracle }
    }

    pub fn oracle(&self) -> &'o dyn Oracle {
        self.oracle
    }

    /// Resolve `node` as seen from `scope`. `access` is the native expression for the static type of the value
    /// being resolved; element and target types get derived expressions.
    #[instrument(level = "trace", skip(self, node), fields(node = %node))]
    pub fn resolve(&self, node: &TypeNode, scope: &Scope, access: Option<&str>) -> Result<QualType> {
        self.resolve_at(node, scope, access.map(|a| a.to_string()), 0)
    }

    fn resolve_at(
        &self,
        node: &TypeNode,
        scope: &Scope,
        access: Option<String>,
        depth: u32,
    ) -> Result<QualType> {
        // 1. arrays
        if let TypeKind::Array(element) = &node.kind {
            let element = self.resolve_at(element, scope, derive(&access, |a| format!("{a}::value_type")), depth)?;
            return Ok(QualType::new(TypeDescriptor::Array(Box::new(element)), access));
        }
        if let TypeKind::Reference { name, args } = &node.kind {
            if name == "Array" {
                let [element] = args.as_slice() else {
                    return Err(unsupported(node, "Array takes exactly one type argument"));
                };
                let element = self.resolve_at(element, scope, derive(&access, |a| format!("{a}::value_type")), depth)?;
                return Ok(QualType::new(TypeDescriptor::Array(Box::new(element)), access));
            }
        }

        match &node.kind {
            // 2. callbacks
            TypeKind::Function(_) => {
                return Ok(QualType::new(TypeDescriptor::Named(CALLBACK.to_string()), access))
            }
            // 3. literals
            TypeKind::Literal(_) => {
                return Err(unsupported(node, "literal types have no native representation"))
            }
            // 4. explicit optional
            TypeKind::Optional(inner) => {
                let inner = self.resolve_at(inner, scope, derive(&access, |a| format!("{a}::value_type")), depth)?;
                return Ok(optional(inner, access));
            }
            // 5. unions
            TypeKind::Union(arms) => {
                let present: Vec<&TypeNode> = arms.iter().filter(|a| !a.is_absent()).collect();
                return match (arms.len(), present.as_slice()) {
                    (2, [inner]) => {
                        let inner =
                            self.resolve_at(inner, scope, derive(&access, |a| format!("{a}::value_type")), depth)?;
                        Ok(optional(inner, access))
                    }
                    _ => Err(unsupported(
                        node,
                        "only unions of a type with undefined or null are supported",
                    )),
                };
            }
            _ => {}
        }

        // 6. generic aliases
        if let TypeKind::Reference { name, args } = &node.kind {
            match name.as_str() {
                "Reference" => {
                    let [target] = args.as_slice() else {
                        return Err(unsupported(node, "Reference takes exactly one type argument"));
                    };
                    let target = self.resolve_at(
                        target,
                        scope,
                        derive(&access, |a| format!("std::remove_reference_t<{a}>")),
                        depth,
                    )?;
                    return Ok(QualType::new(TypeDescriptor::Reference(Box::new(target)), access));
                }
                "Pointer" => {
                    let [target] = args.as_slice() else {
                        return Err(unsupported(node, "Pointer takes exactly one type argument"));
                    };
                    let target = self.resolve_at(
                        target,
                        scope,
                        derive(&access, |a| format!("std::remove_pointer_t<{a}>")),
                        depth,
                    )?;
                    let descriptor = match target.descriptor {
                        TypeDescriptor::Reference(_) => {
                            return Err(unsupported(node, "pointers to references are not supported"))
                        }
                        TypeDescriptor::Pointer { pointee, depth } => TypeDescriptor::Pointer {
                            pointee,
                            depth: depth + 1,
                        },
                        _ => TypeDescriptor::Pointer {
                            pointee: Box::new(target),
                            depth: 1,
                        },
                    };
                    return Ok(QualType::new(descriptor, access));
                }
                "Map" | "StringMap" => {
                    let value = match args.as_slice() {
                        [value] => value,
                        [key, value] if name == "Map" => {
                            if !matches!(key.kind, TypeKind::Keyword(Keyword::String)) {
                                return Err(unsupported(node, "map keys must be strings"));
                            }
                            value
                        }
                        _ => return Err(unsupported(node, "expected Map<T> or Map<string, T>")),
                    };
                    let value = self.resolve_at(value, scope, derive(&access, |a| format!("{a}::mapped_type")), depth)?;
                    return Ok(QualType::new(TypeDescriptor::Map(Box::new(value)), access));
                }
                "Partial" => {
                    return Err(unsupported(
                        node,
                        "Partial<T> is only supported as a parameter type",
                    ))
                }
                _ => {}
            }
        }

        // 7. primitives
        let primitive_name = match &node.kind {
            TypeKind::Keyword(k) => Some(k.as_str()),
            TypeKind::Reference { name, args } if args.is_empty() => Some(name.as_str()),
            _ => None,
        };
        if let Some(p) = primitive_name.and_then(Primitive::from_name) {
            return Ok(QualType::new(TypeDescriptor::Primitive(p), access));
        }

        // 8, 9. whatever the oracle knows about
        match self.oracle.resolve_type_of_node(node, scope) {
            ResolvedType::Error => Err(ExtractionError::new(
                node.span,
                Error::UnresolvedType(node.to_string()),
            )),
            ResolvedType::Alias {
                symbol,
                target,
                scope: alias_scope,
            } => {
                let generic = matches!(
                    symbol.decl.map(|d| &d.kind),
                    Some(tsb_ts::DeclKind::TypeAlias(alias)) if !alias.type_params.is_empty()
                );
                if generic {
                    return Err(unsupported(node, "generic type aliases are not supported"));
                }
                if depth >= MAX_ALIAS_DEPTH {
                    return Err(unsupported(node, "type alias chain is too deep"));
                }
                self.resolve_at(target, &alias_scope, access, depth + 1)
            }
            ResolvedType::Declared(symbol) => {
                if !matches!(&node.kind, TypeKind::Reference { args, .. } if args.is_empty()) {
                    return Err(unsupported(node, "generic types are not supported"));
                }

                let descriptor = match symbol.kind {
                    SymbolKind::Enum { .. } => TypeDescriptor::Enum {
                        name: symbol.name.to_string(),
                        namespace: symbol.namespace.to_vec(),
                        explicit_cast: false,
                    },
                    _ => TypeDescriptor::Named(qualified(symbol.namespace, symbol.name)),
                };
                Ok(QualType::new(descriptor, access))
            }
            ResolvedType::Intrinsic(k) => Err(unsupported(
                node,
                &format!("\"{}\" has no native representation", k.as_str()),
            )),
            ResolvedType::Structural => Err(unsupported(
                node,
                "anonymous types are not supported, declare an interface instead",
            )),
        }
    }
}

/// Optionals never nest
fn optional(inner: QualType, access: Option<String>) -> QualType {
    if inner.is_optional() {
        QualType::new(inner.descriptor, access)
    } else {
        QualType::new(TypeDescriptor::Optional(Box::new(inner)), access)
    }
}

fn derive(access: &Option<String>, f: impl Fn(&str) -> String) -> Option<String> {
    access.as_deref().map(f)
}

fn unsupported(node: &TypeNode, reason: &str) -> ExtractionError {
    ExtractionError::new(
        node.span,
        Error::UnsupportedType {
            ty: node.to_string(),
            reason: reason.to_string(),
        },
    )
}

pub(crate) fn qualified(namespace: &[String], name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", namespace.join("."), name)
    }
}
