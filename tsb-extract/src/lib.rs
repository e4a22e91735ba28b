//! Schema extraction.
//!
//! Walks the declarations of a [`Program`] and builds the in-memory [`Schema`]: classes, enums and free functions
//! with every type resolved to a [`QualType`]. Only documented declarations are considered. Errors are collected
//! per declaration rather than returned, so one run reports everything that is wrong with the inputs.

use std::path::Path;

use tracing::{debug, instrument};
use tsb_ts::{Decl, DeclKind, Doc, FileId, Program, Scope, Span};

pub mod class;
pub mod enm;
pub mod error;
pub mod function;
pub mod namespace;
pub mod qualtype;
pub mod resolve;
pub mod schema;
pub mod tags;

pub use class::{ClassSchema, ParentRef, PropertySchema};
pub use enm::EnumSchema;
pub use error::{Error, ExtractionError};
pub use function::{FunctionSchema, MethodSchema, ParamSchema};
pub use namespace::{NamespaceEntry, NamespaceMapping};
pub use qualtype::{Primitive, QualType, TypeDescriptor};
pub use resolve::Resolver;
pub use schema::{Schema, SchemaUnit};
pub use tags::{read_tags, NamespaceTag, TagMap, TagValue, Tags};

type Result<T, E = ExtractionError> = std::result::Result<T, E>;

#[derive(Debug)]
pub struct Extraction {
    pub schema: Schema,
    pub errors: Vec<ExtractionError>,
}

impl Extraction {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Per-file extraction state
pub(crate) struct Extractor<'p> {
    pub(crate) resolver: Resolver<'p>,
    pub(crate) file: FileId,
    mapping: &'p NamespaceMapping,
    path: &'p Path,
    errors: Vec<ExtractionError>,
}

impl<'p> Extractor<'p> {
    pub(crate) fn record(&mut self, error: ExtractionError) {
        debug!("{}", error);
        self.errors.push(error);
    }

    pub(crate) fn tags(&self, doc: Option<&Doc>, span: Span) -> Result<Tags> {
        Tags::parse(&read_tags(doc)).map_err(|e| ExtractionError::new(doc.map(|d| d.span).unwrap_or(span), e))
    }

    pub(crate) fn scope(&self, namespace: &[String]) -> Scope {
        Scope::new(self.file, namespace.to_vec())
    }

    /// The `@namespace` tag if there is one, otherwise the namespace mapped to this file
    pub(crate) fn native_namespace(&self, tags: &Tags, span: Span) -> Result<Vec<String>> {
        if let Some(NamespaceTag::Path(path)) = &tags.namespace {
            return Ok(path.clone());
        }

        self.mapping.pick(self.path).map(|ns| ns.to_vec()).ok_or_else(|| {
            ExtractionError::new(
                span,
                Error::NoNamespaceMapping {
                    path: self.path.to_path_buf(),
                    mapped: self.mapping.describe(),
                },
            )
        })
    }

    fn extract_decls(&mut self, decls: &[Decl], namespace: &mut Vec<String>, unit: &mut SchemaUnit) {
        for decl in decls {
            if let DeclKind::Namespace(body) = &decl.kind {
                if decl.doc.is_some() {
                    match self.tags(decl.doc.as_ref(), decl.span) {
                        Ok(tags) if tags.skip => {
                            debug!("skipping namespace {}", decl.name);
                            continue;
                        }
                        Ok(_) => {}
                        Err(e) => {
                            self.record(e);
                            continue;
                        }
                    }
                }
                namespace.push(decl.name.clone());
                self.extract_decls(body, namespace, unit);
                namespace.pop();
                continue;
            }

            // only documented declarations are bound
            if decl.doc.is_none() {
                continue;
            }

            if let Err(e) = self.extract_decl(decl, namespace, unit) {
                self.record(e);
            }
        }
    }

    fn extract_decl(&mut self, decl: &Decl, namespace: &[String], unit: &mut SchemaUnit) -> Result<()> {
        match &decl.kind {
            DeclKind::Class(class) => {
                if let Some(c) = class::extract_class(self, decl, class, namespace)? {
                    unit.classes.push(c);
                }
            }
            DeclKind::Enum(enm) => {
                if let Some(e) = enm::extract_enum(self, decl, enm, namespace)? {
                    unit.enums.push(e);
                }
            }
            DeclKind::Function(sig) => {
                if let Some(f) = function::extract_function(self, decl, sig, namespace)? {
                    unit.functions.push(f);
                }
            }
            DeclKind::Variable(var) => {
                let tags = self.tags(decl.doc.as_ref(), decl.span)?;
                if tags.namespace == Some(NamespaceTag::Marker) && !tags.skip {
                    let mut functions = namespace::extract_namespace_marker(self, decl, var, namespace, &tags)?;
                    unit.functions.append(&mut functions);
                }
            }
            DeclKind::TypeAlias(_) | DeclKind::Namespace(_) => {}
        }

        Ok(())
    }
}

/// Extract the schema of every file in `program`
#[instrument(level = "trace", skip_all)]
pub fn extract(program: &Program, mapping: &NamespaceMapping) -> Extraction {
    let mut units = Vec::with_capacity(program.files().len());
    let mut errors = Vec::new();

    for file in program.files() {
        let path = program.sources().path(file.id);
        let mut ex = Extractor {
            resolver: Resolver::new(program),
            file: file.id,
            mapping,
            path,
            errors: Vec::new(),
        };

        let mut unit = SchemaUnit::new(file.id, path.to_path_buf());
        ex.extract_decls(&file.decls, &mut Vec::new(), &mut unit);
        errors.append(&mut ex.errors);
        units.push(unit);
    }

    let schema = Schema { units };
    check_duplicate_classes(&schema, &mut errors);
    check_duplicate_functions(&schema, &mut errors);

    debug!(
        "extracted {} classes, {} enums, {} functions with {} errors",
        schema.classes().count(),
        schema.enums().count(),
        schema.functions().count(),
        errors.len()
    );

    Extraction { schema, errors }
}

/// Each class is registered under its script path, so a class or interface merged across declarations would be
/// generated twice
fn check_duplicate_classes(schema: &Schema, errors: &mut Vec<ExtractionError>) {
    let mut seen = hashbrown::HashSet::new();
    for c in schema.classes() {
        let path = c.script_path();
        if !seen.insert(path.clone()) {
            errors.push(ExtractionError::new(c.span, Error::DuplicateDeclaration(path)));
        }
    }
}

/// Free functions share one bridge namespace tree across all files, so names must be unique per namespace
fn check_duplicate_functions(schema: &Schema, errors: &mut Vec<ExtractionError>) {
    let mut seen: hashbrown::HashSet<(&[String], &str)> = hashbrown::HashSet::new();
    for f in schema.functions() {
        if !seen.insert((f.namespace.as_slice(), f.name.as_str())) {
            errors.push(ExtractionError::new(
                f.span,
                Error::DuplicateMember(resolve::qualified(&f.namespace, &f.name)),
            ));
        }
    }
}
