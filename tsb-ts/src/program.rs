use std::path::PathBuf;

use tracing::{debug, instrument};
use ustr::ustr;

use crate::decl::{Decl, DeclKind, Member, TypeKind, TypeNode};
use crate::diagnostic::Diagnostic;
use crate::error::Error;
use crate::index_map::{IndexMapKey, UstrIndexMap};
use crate::lower::parse_file;
use crate::oracle::{Oracle, ResolvedType, Scope, Symbol, SymbolKind};
use crate::source::{FileId, SourceMap};

type Result<T, E = Error> = std::result::Result<T, E>;

/// Alias chains longer than this are treated as cycles
pub const MAX_ALIAS_DEPTH: u32 = 16;

/// Names provided by the standard declaration library. They resolve as opaque builtin symbols when no input
/// declares a type of the same name.
const BUILTINS: &[&str] = &[
    "Array",
    "ReadonlyArray",
    "ArrayBuffer",
    "SharedArrayBuffer",
    "DataView",
    "Int8Array",
    "Uint8Array",
    "Uint8ClampedArray",
    "Int16Array",
    "Uint16Array",
    "Int32Array",
    "Uint32Array",
    "Float32Array",
    "Float64Array",
    "BigInt64Array",
    "BigUint64Array",
    "Promise",
    "PromiseLike",
    "Partial",
    "Required",
    "Readonly",
    "Record",
    "Pick",
    "Omit",
    "Map",
    "Set",
    "WeakMap",
    "WeakSet",
    "Number",
    "String",
    "Boolean",
    "Object",
    "Function",
    "Symbol",
    "Date",
    "Error",
    "RegExp",
    "Iterable",
    "Iterator",
    "IterableIterator",
];

#[derive(Debug)]
pub struct ParsedFile {
    pub id: FileId,
    pub decls: Vec<Decl>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SymbolId(usize);

impl IndexMapKey for SymbolId {
    fn get(&self) -> usize {
        self.0
    }

    fn from_index(index: usize) -> Self {
        SymbolId(index)
    }
}

struct SymbolEntry {
    name: String,
    kind: SymbolKind,
    namespace: Vec<String>,
    file: FileId,
    file_index: usize,
    /// Indices through nested namespace bodies down to the declaration
    path: Vec<usize>,
}

/// All parsed declaration files of one run plus the symbol index over them
pub struct Program {
    sources: SourceMap,
    files: Vec<ParsedFile>,
    symbols: UstrIndexMap<SymbolEntry, SymbolId>,
}

impl std::fmt::Debug for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Program files={} symbols={}", self.files.len(), self.symbols.len())
    }
}

impl Program {
    /// Read and parse every file in `paths`
    pub fn load(paths: &[PathBuf]) -> Result<Program> {
        let mut inputs = Vec::with_capacity(paths.len());
        for path in paths {
            let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
                path: path.clone(),
                source,
            })?;
            inputs.push((path.clone(), text));
        }

        Program::from_sources(inputs)
    }

    /// Parse in-memory sources. Parse errors from every file are collected before failing.
    #[instrument(level = "trace", skip(inputs))]
    pub fn from_sources(inputs: Vec<(PathBuf, String)>) -> Result<Program> {
        let mut sources = SourceMap::default();
        let mut files = Vec::new();
        let mut diagnostics: Vec<Diagnostic> = Vec::new();

        for (path, text) in inputs {
            let id = sources.add(path, text);
            match parse_file(id, sources.get(id)) {
                Ok(decls) => files.push(ParsedFile { id, decls }),
                Err(mut errors) => diagnostics.append(&mut errors),
            }
        }

        if !diagnostics.is_empty() {
            return Err(Error::Parse {
                sources: Box::new(sources),
                diagnostics,
            });
        }

        let mut symbols = UstrIndexMap::new();
        for (file_index, file) in files.iter().enumerate() {
            index_decls(
                &mut symbols,
                file_index,
                file.id,
                &file.decls,
                &mut Vec::new(),
                &mut Vec::new(),
            );
        }
        debug!("indexed {} symbols in {} files", symbols.len(), files.len());

        Ok(Program {
            sources,
            files,
            symbols,
        })
    }

    pub fn sources(&self) -> &SourceMap {
        &self.sources
    }

    pub fn files(&self) -> &[ParsedFile] {
        &self.files
    }

    fn decl_at(&self, entry: &SymbolEntry) -> Option<&Decl> {
        let (last, init) = entry.path.split_last()?;
        let mut decls = &self.files.get(entry.file_index)?.decls;
        for i in init {
            match &decls.get(*i)?.kind {
                DeclKind::Namespace(body) => decls = body,
                _ => return None,
            }
        }
        decls.get(*last)
    }

    fn symbol<'p>(&'p self, entry: &'p SymbolEntry) -> Symbol<'p> {
        Symbol {
            name: &entry.name,
            kind: entry.kind,
            namespace: &entry.namespace,
            file: Some(entry.file),
            decl: self.decl_at(entry),
        }
    }

    fn properties_in<'a>(
        &'a self,
        node: &'a TypeNode,
        scope: &Scope,
        depth: u32,
    ) -> Option<&'a [Member]> {
        match &node.kind {
            TypeKind::Object(members) => Some(members),
            TypeKind::Reference { name, .. } => {
                let symbol = self.resolve_symbol(name, scope)?;
                match &symbol.decl?.kind {
                    DeclKind::Class(class) => Some(&class.members),
                    DeclKind::TypeAlias(alias) if depth < MAX_ALIAS_DEPTH => {
                        let scope = Scope::new(
                            symbol.file.unwrap_or(scope.file),
                            symbol.namespace.to_vec(),
                        );
                        self.properties_in(&alias.ty, &scope, depth + 1)
                    }
                    _ => None,
                }
            }
            _ => None,
        }
    }
}

fn index_decls(
    symbols: &mut UstrIndexMap<SymbolEntry, SymbolId>,
    file_index: usize,
    file: FileId,
    decls: &[Decl],
    namespace: &mut Vec<String>,
    path: &mut Vec<usize>,
) {
    for (i, decl) in decls.iter().enumerate() {
        path.push(i);

        let kind = match &decl.kind {
            DeclKind::Class(c) if c.is_interface => SymbolKind::Interface,
            DeclKind::Class(_) => SymbolKind::Class,
            DeclKind::Enum(e) => SymbolKind::Enum {
                is_const: e.is_const,
            },
            DeclKind::Function(_) => SymbolKind::Function,
            DeclKind::Variable(_) => SymbolKind::Variable,
            DeclKind::TypeAlias(_) => SymbolKind::TypeAlias,
            DeclKind::Namespace(_) => SymbolKind::Namespace,
        };

        let qualified = qualify(namespace, &decl.name);
        symbols.insert(
            ustr(&qualified),
            SymbolEntry {
                name: decl.name.clone(),
                kind,
                namespace: namespace.clone(),
                file,
                file_index,
                path: path.clone(),
            },
        );

        if let DeclKind::Namespace(body) = &decl.kind {
            namespace.push(decl.name.clone());
            index_decls(symbols, file_index, file, body, namespace, path);
            namespace.pop();
        }

        path.pop();
    }
}

fn qualify(namespace: &[String], name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", namespace.join("."), name)
    }
}

impl Oracle for Program {
    fn resolve_symbol(&self, name: &str, scope: &Scope) -> Option<Symbol<'_>> {
        for depth in (0..=scope.namespace.len()).rev() {
            let qualified = qualify(&scope.namespace[..depth], name);
            if let Some(entry) = self.symbols.get(&ustr(&qualified)) {
                return Some(self.symbol(entry));
            }
        }

        BUILTINS.iter().find(|b| **b == name).map(|b| Symbol {
            name: b,
            kind: SymbolKind::Builtin,
            namespace: &[],
            file: None,
            decl: None,
        })
    }

    fn resolve_type_of_node(&self, node: &TypeNode, scope: &Scope) -> ResolvedType<'_> {
        match &node.kind {
            TypeKind::Keyword(k) => ResolvedType::Intrinsic(*k),
            TypeKind::Reference { name, .. } => {
                let Some(symbol) = self.resolve_symbol(name, scope) else {
                    return ResolvedType::Error;
                };

                match (symbol.kind, symbol.decl.map(|d| &d.kind)) {
                    (SymbolKind::TypeAlias, Some(DeclKind::TypeAlias(alias))) => ResolvedType::Alias {
                        symbol,
                        target: &alias.ty,
                        scope: Scope::new(
                            symbol.file.unwrap_or(scope.file),
                            symbol.namespace.to_vec(),
                        ),
                    },
                    (kind, _) if kind.is_type() && kind != SymbolKind::TypeAlias => {
                        ResolvedType::Declared(symbol)
                    }
                    _ => ResolvedType::Error,
                }
            }
            _ => ResolvedType::Structural,
        }
    }

    fn properties_of_type<'a>(&'a self, node: &'a TypeNode, scope: &Scope) -> Option<&'a [Member]> {
        self.properties_in(node, scope, 0)
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    fn program(src: &str) -> Program {
        Program::from_sources(vec![("test.d.ts".into(), src.to_string())]).expect("parse failed")
    }

    fn reference(name: &str, file: FileId) -> TypeNode {
        TypeNode {
            span: crate::Span::new(file, 0, 0),
            kind: TypeKind::Reference {
                name: name.to_string(),
                args: Vec::new(),
            },
        }
    }

    #[test]
    fn resolve_from_nested_scope() {
        let p = program(indoc!(
            r#"
            declare namespace a {
                class Outer {}
                namespace b {
                    class Inner {}
                }
            }
            declare function notAType(): void;
            "#
        ));
        let file = p.files()[0].id;
        let scope = Scope::new(file, vec!["a".into(), "b".into()]);

        let outer = p.resolve_symbol("Outer", &scope).unwrap();
        assert_eq!(outer.kind, SymbolKind::Class);
        assert_eq!(outer.namespace, ["a".to_string()]);
        assert_eq!(outer.decl.unwrap().name, "Outer");

        let inner = p.resolve_symbol("b.Inner", &Scope::new(file, vec!["a".into()])).unwrap();
        assert_eq!(inner.namespace, ["a".to_string(), "b".to_string()]);

        assert!(p.resolve_symbol("Inner", &Scope::new(file, vec![])).is_none());
        assert_eq!(
            p.resolve_symbol("Promise", &scope).unwrap().kind,
            SymbolKind::Builtin
        );

        assert!(matches!(
            p.resolve_type_of_node(&reference("notAType", file), &scope),
            ResolvedType::Error
        ));
        assert!(matches!(
            p.resolve_type_of_node(&reference("Missing", file), &scope),
            ResolvedType::Error
        ));
    }

    #[test]
    fn aliases_and_properties() {
        let p = program(indoc!(
            r#"
            type Numbers = number[];
            type Api = { f(): void; g: number };
            interface Shape { area(): number }
            "#
        ));
        let file = p.files()[0].id;
        let scope = Scope::new(file, vec![]);

        match p.resolve_type_of_node(&reference("Numbers", file), &scope) {
            ResolvedType::Alias { symbol, target, .. } => {
                assert_eq!(symbol.name, "Numbers");
                assert!(matches!(target.kind, TypeKind::Array(_)));
            }
            other => panic!("expected an alias, got {other:?}"),
        }

        let api = reference("Api", file);
        let members = p.properties_of_type(&api, &scope).unwrap();
        assert_eq!(members.len(), 2);

        let shape = reference("Shape", file);
        let members = p.properties_of_type(&shape, &scope).unwrap();
        assert_eq!(members[0].name, "area");

        assert!(matches!(
            p.resolve_type_of_node(&shape, &scope),
            ResolvedType::Declared(Symbol {
                kind: SymbolKind::Interface,
                ..
            })
        ));
    }

    #[test]
    fn parse_errors_from_all_files() {
        let err = Program::from_sources(vec![
            ("a.d.ts".into(), "declare class {".to_string()),
            ("b.d.ts".into(), "declare class B {}".to_string()),
            ("c.d.ts".into(), "interface {".to_string()),
        ])
        .unwrap_err();

        match err {
            Error::Parse {
                sources,
                diagnostics,
            } => {
                assert_eq!(sources.len(), 3);
                let files: Vec<usize> = diagnostics.iter().map(|d| d.span.file.index()).collect();
                assert!(files.contains(&0) && files.contains(&2));
                assert!(!files.contains(&1));
            }
            other => panic!("expected parse errors, got {other:?}"),
        }
    }
}
