use serde::Serialize;
use tracing::{debug, instrument};
use tsb_ts::{
    ClassDecl, Decl, FileId, Member, MemberKind, Oracle, Param, Scope, Signature, Span, SymbolKind, TypeKind,
    TypeNode,
};

use crate::error::{Error, ExtractionError};
use crate::function::{apply_type_tags, extract_signature, native_name, MethodSchema};
use crate::qualtype::QualType;
use crate::resolve::qualified;
use crate::tags::Tags;
use crate::Extractor;

type Result<T, E = ExtractionError> = std::result::Result<T, E>;

/// Named back-reference to a parent class, resolved when emitting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParentRef {
    pub name: String,
    pub namespace: Vec<String>,
    #[serde(skip)]
    pub file: Option<FileId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertySchema {
    pub name: String,
    pub ty: QualType,
    pub readonly: bool,
    /// Backed by a `get` accessor
    pub get: bool,
    /// Backed by a `set` accessor
    pub set: bool,
    /// Native getter method name from `@getter`
    pub getter: Option<String>,
    /// Native setter method name from `@setter`
    pub setter: Option<String>,
    pub tags: Tags,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassSchema {
    pub name: String,
    /// Script namespace path
    pub namespace: Vec<String>,
    pub native_namespace: Vec<String>,
    #[serde(skip)]
    pub file: FileId,
    #[serde(skip)]
    pub span: Span,
    pub is_interface: bool,
    pub parent: Option<ParentRef>,
    pub properties: Vec<PropertySchema>,
    pub static_properties: Vec<PropertySchema>,
    pub methods: Vec<MethodSchema>,
    pub static_methods: Vec<MethodSchema>,
    pub ctor: Option<MethodSchema>,
    pub partial: bool,
    pub clone: bool,
    pub from: bool,
    pub tags: Tags,
}

impl ClassSchema {
    /// `native::ns::script::ns::Name`
    pub fn native_name(&self) -> String {
        native_name(&self.native_namespace, &self.namespace, &self.name)
    }

    /// `script.ns.Name`
    pub fn script_path(&self) -> String {
        qualified(&self.namespace, &self.name)
    }
}

/// Accessors seen for one property name, paired after all members are collected
struct AccessorPair {
    name: String,
    is_static: bool,
    span: Span,
    getter: Option<(QualType, Tags)>,
    setter: Option<(QualType, Tags)>,
}

#[derive(Default)]
struct Members {
    properties: Vec<(PropertySchema, bool, Span)>,
    accessors: Vec<AccessorPair>,
    methods: Vec<MethodSchema>,
    static_methods: Vec<MethodSchema>,
    ctor: Option<MethodSchema>,
    partial: bool,
    clone: bool,
    from: bool,
}

/// A documented class or interface
#[instrument(level = "trace", skip(ex, decl, class), fields(name = %decl.name))]
pub(crate) fn extract_class(
    ex: &mut Extractor,
    decl: &Decl,
    class: &ClassDecl,
    namespace: &[String],
) -> Result<Option<ClassSchema>> {
    let tags = ex.tags(decl.doc.as_ref(), decl.span)?;
    if tags.skip {
        debug!("skipping {}", decl.name);
        return Ok(None);
    }

    let native_namespace = ex.native_namespace(&tags, decl.span)?;
    let native = native_name(&native_namespace, namespace, &decl.name);
    let scope = ex.scope(namespace);

    let parent = extract_parent(ex.resolver.oracle(), decl, class, &scope)?;

    let mut members = Members::default();
    for member in &class.members {
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

        if let Err(e) = extract_member(ex, decl, &native, member, member_tags, &scope, &mut members) {
            ex.record(e);
        }
    }

    let (properties, static_properties) = pair_accessors(ex, members.properties, members.accessors);

    let mut ctor = members.ctor;
    if members.partial && ctor.is_none() {
        ctor = Some(MethodSchema {
            name: "constructor".to_string(),
            params: Vec::new(),
            optional_args: 0,
            ret: QualType::void(),
            is_static: false,
            tags: Tags::default(),
        });
    }

    Ok(Some(ClassSchema {
        name: decl.name.clone(),
        namespace: namespace.to_vec(),
        native_namespace,
        file: ex.file,
        span: decl.span,
        is_interface: class.is_interface,
        parent,
        properties,
        static_properties,
        methods: members.methods,
        static_methods: members.static_methods,
        ctor,
        partial: members.partial,
        clone: members.clone,
        from: members.from,
        tags,
    }))
}

fn extract_parent(
    oracle: &dyn Oracle,
    decl: &Decl,
    class: &ClassDecl,
    scope: &Scope,
) -> Result<Option<ParentRef>> {
    let heritage = match class.heritage.as_slice() {
        [] => return Ok(None),
        [heritage] => heritage,
        [_, second, ..] => {
            return Err(ExtractionError::new(
                second.span,
                Error::MultipleHeritage(decl.name.clone()),
            ))
        }
    };

    let unresolved = |parent: &str| {
        ExtractionError::new(
            heritage.span,
            Error::UnresolvedHeritage {
                class: decl.name.clone(),
                parent: parent.to_string(),
            },
        )
    };

    let name = heritage.name.as_deref().ok_or_else(|| unresolved("<expression>"))?;
    let symbol = oracle.resolve_symbol(name, scope).ok_or_else(|| unresolved(name))?;
    if !matches!(symbol.kind, SymbolKind::Class | SymbolKind::Interface) || symbol.file.is_none() {
        return Err(unresolved(name));
    }

    Ok(Some(ParentRef {
        name: symbol.name.to_string(),
        namespace: symbol.namespace.to_vec(),
        file: symbol.file,
    }))
}

fn extract_member(
    ex: &Extractor,
    decl: &Decl,
    native: &str,
    member: &Member,
    tags: Tags,
    scope: &Scope,
    out: &mut Members,
) -> Result<()> {
    match &member.kind {
        MemberKind::Constructor(sig) => {
            if is_partial_ctor(sig, &decl.name) {
                out.partial = true;
                return Ok(());
            }
            if out.ctor.is_some() {
                return Err(ExtractionError::new(
                    member.span,
                    Error::MultipleConstructors(decl.name.clone()),
                ));
            }
            let access = format!("decltype(&{native}::create)");
            out.ctor = Some(method(ex, member, sig, tags, scope, &access)?);
        }
        MemberKind::Method(sig) => {
            if member.name == "clone" && !member.is_static {
                out.clone = true;
                return Ok(());
            }
            if member.name == "from" && member.is_static {
                out.from = true;
                return Ok(());
            }

            let list = if member.is_static {
                &mut out.static_methods
            } else {
                &mut out.methods
            };
            if list.iter().any(|m| m.name == member.name) {
                return Err(ExtractionError::new(
                    member.span,
                    Error::DuplicateMember(member.name.clone()),
                ));
            }

            let access = format!("decltype(&{native}::{})", member.name);
            let m = method(ex, member, sig, tags, scope, &access)?;
            list.push(m);
        }
        MemberKind::Property(ty) => {
            let ty = annotation(member, ty.as_ref())?;
            if out
                .properties
                .iter()
                .any(|(p, is_static, _)| p.name == member.name && *is_static == member.is_static)
            {
                return Err(ExtractionError::new(
                    member.span,
                    Error::DuplicateMember(member.name.clone()),
                ));
            }

            let access = format!("decltype({native}::{})", member.name);
            let resolved = ex.resolver.resolve(ty, scope, Some(&access))?;
            let resolved = apply_type_tags(resolved, &tags, member.span)?;

            out.properties.push((
                PropertySchema {
                    name: member.name.clone(),
                    ty: resolved,
                    readonly: member.is_readonly || tags.readonly,
                    get: false,
                    set: false,
                    getter: tags.getter.clone(),
                    setter: tags.setter.clone(),
                    tags,
                },
                member.is_static,
                member.span,
            ));
        }
        MemberKind::Getter(ty) => {
            let ty = annotation(member, ty.as_ref())?;
            let resolved = ex.resolver.resolve(ty, scope, None)?;
            let resolved = apply_type_tags(resolved, &tags, member.span)?;

            let pair = accessor_pair(out, member);
            if pair.getter.is_some() {
                return Err(ExtractionError::new(
                    member.span,
                    Error::DuplicateAccessor {
                        property: member.name.clone(),
                        accessor: "getter".to_string(),
                    },
                ));
            }
            pair.getter = Some((resolved, tags));
        }
        MemberKind::Setter(param) => {
            let ty = setter_type(member, param.as_ref())?;
            let resolved = ex.resolver.resolve(ty, scope, None)?;
            let resolved = apply_type_tags(resolved, &tags, member.span)?;

            let pair = accessor_pair(out, member);
            if pair.setter.is_some() {
                return Err(ExtractionError::new(
                    member.span,
                    Error::DuplicateAccessor {
                        property: member.name.clone(),
                        accessor: "setter".to_string(),
                    },
                ));
            }
            pair.setter = Some((resolved, tags));
        }
        MemberKind::Unsupported(what) => {
            return Err(ExtractionError::new(
                member.span,
                Error::UnsupportedMember {
                    name: member.name.clone(),
                    what: what.to_string(),
                },
            ))
        }
    }

    Ok(())
}

fn method(
    ex: &Extractor,
    member: &Member,
    sig: &Signature,
    tags: Tags,
    scope: &Scope,
    access: &str,
) -> Result<MethodSchema> {
    let sig = extract_signature(ex, &member.name, sig, scope, Some(access))?;
    Ok(MethodSchema {
        name: member.name.clone(),
        params: sig.params,
        optional_args: sig.optional_args,
        ret: sig.ret,
        is_static: member.is_static,
        tags,
    })
}

/// `constructor(values: Partial<Self>)`
fn is_partial_ctor(sig: &Signature, class_name: &str) -> bool {
    let [param] = sig.params.as_slice() else {
        return false;
    };
    match param.ty.as_ref().map(|t| &t.kind) {
        Some(TypeKind::Reference { name, args }) if name == "Partial" => {
            matches!(args.as_slice(), [arg] if arg.reference_name() == Some(class_name))
        }
        _ => false,
    }
}

fn accessor_pair<'m>(out: &'m mut Members, member: &Member) -> &'m mut AccessorPair {
    let idx = match out
        .accessors
        .iter()
        .position(|a| a.name == member.name && a.is_static == member.is_static)
    {
        Some(idx) => idx,
        None => {
            out.accessors.push(AccessorPair {
                name: member.name.clone(),
                is_static: member.is_static,
                span: member.span,
                getter: None,
                setter: None,
            });
            out.accessors.len() - 1
        }
    };
    &mut out.accessors[idx]
}

fn annotation<'a>(member: &Member, ty: Option<&'a TypeNode>) -> Result<&'a TypeNode> {
    ty.ok_or_else(|| {
        ExtractionError::new(
            member.span,
            Error::InvalidSignature(format!("\"{}\" has no type annotation", member.name)),
        )
    })
}

fn setter_type<'a>(member: &Member, param: Option<&'a Param>) -> Result<&'a TypeNode> {
    annotation(member, param.and_then(|p| p.ty.as_ref()))
}

/// Merge get/set accessors into properties. Both lists keep declaration order; an accessor pair sits where its
/// first half was declared.
fn pair_accessors(
    ex: &mut Extractor,
    properties: Vec<(PropertySchema, bool, Span)>,
    accessors: Vec<AccessorPair>,
) -> (Vec<PropertySchema>, Vec<PropertySchema>) {
    let mut merged: Vec<(u32, bool, PropertySchema)> = properties
        .iter()
        .map(|(p, is_static, span)| (span.start, *is_static, p.clone()))
        .collect();

    for pair in accessors {
        if properties
            .iter()
            .any(|(p, is_static, _)| p.name == pair.name && *is_static == pair.is_static)
        {
            ex.record(ExtractionError::new(
                pair.span,
                Error::DuplicateAccessor {
                    property: pair.name.clone(),
                    accessor: "plain property declaration".to_string(),
                },
            ));
            continue;
        }

        let property = match (pair.getter, pair.setter) {
            (Some((get_ty, get_tags)), Some((set_ty, set_tags))) => {
                if !get_ty.same_type(&set_ty) {
                    ex.record(ExtractionError::new(
                        pair.span,
                        Error::InvalidSignature(format!(
                            "getter and setter of \"{}\" have different types ({get_ty} and {set_ty})",
                            pair.name
                        )),
                    ));
                    continue;
                }
                PropertySchema {
                    name: pair.name,
                    ty: get_ty,
                    readonly: get_tags.readonly,
                    get: true,
                    set: true,
                    getter: get_tags.getter.clone(),
                    setter: set_tags.setter.clone(),
                    tags: get_tags,
                }
            }
            (Some((ty, tags)), None) => PropertySchema {
                name: pair.name,
                ty,
                readonly: true,
                get: true,
                set: false,
                getter: tags.getter.clone(),
                setter: None,
                tags,
            },
            (None, Some((ty, tags))) => PropertySchema {
                name: pair.name,
                ty,
                readonly: false,
                get: false,
                set: true,
                getter: None,
                setter: tags.setter.clone(),
                tags,
            },
            (None, None) => continue,
        };

        merged.push((pair.span.start, pair.is_static, property));
    }

    merged.sort_by_key(|(start, ..)| *start);

    let mut instance = Vec::new();
    let mut statics = Vec::new();
    for (_, is_static, property) in merged {
        if is_static {
            statics.push(property);
        } else {
            instance.push(property);
        }
    }

    (instance, statics)
}
