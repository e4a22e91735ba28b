use serde::Serialize;
use tracing::instrument;
use tsb_ts::{Decl, FileId, Scope, Signature, Span, TypeKind};

use crate::error::{Error, ExtractionError};
use crate::qualtype::{QualType, TypeDescriptor};
use crate::tags::Tags;
use crate::Extractor;

type Result<T, E = ExtractionError> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamSchema {
    pub name: String,
    pub ty: QualType,
    pub optional: bool,
    /// Constructible from a subset of the type's fields
    pub partial: bool,
    /// Consumes all remaining arguments
    pub rest: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodSchema {
    pub name: String,
    pub params: Vec<ParamSchema>,
    /// Number of trailing optional parameters
    pub optional_args: usize,
    pub ret: QualType,
    pub is_static: bool,
    pub tags: Tags,
}

impl MethodSchema {
    pub fn required_args(&self) -> usize {
        required_args(&self.params, self.optional_args)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionSchema {
    pub name: String,
    /// Script namespace path
    pub namespace: Vec<String>,
    pub native_namespace: Vec<String>,
    #[serde(skip)]
    pub file: FileId,
    #[serde(skip)]
    pub span: Span,
    pub params: Vec<ParamSchema>,
    pub optional_args: usize,
    pub ret: QualType,
    /// Implemented on the script-runtime side rather than by a native symbol
    pub jsfunc: bool,
    pub tags: Tags,
}

impl FunctionSchema {
    /// `native::ns::script::ns::name`
    pub fn native_name(&self) -> String {
        native_name(&self.native_namespace, &self.namespace, &self.name)
    }

    pub fn required_args(&self) -> usize {
        required_args(&self.params, self.optional_args)
    }
}

fn required_args(params: &[ParamSchema], optional_args: usize) -> usize {
    let rest = params.last().map_or(0, |p| p.rest as usize);
    params.len().saturating_sub(optional_args + rest)
}

pub(crate) fn native_name(native_namespace: &[String], namespace: &[String], name: &str) -> String {
    native_namespace
        .iter()
        .chain(namespace.iter())
        .map(|s| s.as_str())
        .chain(std::iter::once(name))
        .collect::<Vec<_>>()
        .join("::")
}

pub(crate) struct ExtractedSignature {
    pub params: Vec<ParamSchema>,
    pub optional_args: usize,
    pub ret: QualType,
}

/// Resolve the parameters and return type of `sig`. `access` names the native callable, if there is one.
#[instrument(level = "trace", skip(ex, sig, scope))]
pub(crate) fn extract_signature(
    ex: &Extractor,
    owner: &str,
    sig: &Signature,
    scope: &Scope,
    access: Option<&str>,
) -> Result<ExtractedSignature> {
    let mut params = Vec::with_capacity(sig.params.len());
    let mut optional_args = 0;

    for (i, param) in sig.params.iter().enumerate() {
        let invalid = |msg: String| ExtractionError::new(param.span, Error::InvalidSignature(msg));

        let ty = param.ty.as_ref().ok_or_else(|| {
            invalid(format!(
                "parameter \"{}\" of \"{owner}\" has no type annotation",
                param.name
            ))
        })?;

        if param.rest && optional_args > 0 {
            return Err(invalid(format!(
                "rest parameter \"{}\" of \"{owner}\" can't be combined with optional parameters",
                param.name
            )));
        } else if param.optional {
            optional_args += 1;
        } else if optional_args > 0 && !param.rest {
            return Err(invalid(format!(
                "required parameter \"{}\" of \"{owner}\" follows an optional parameter",
                param.name
            )));
        }

        let arg_access = access.map(|a| format!("std::tuple_element_t<{i}, FunctionInfo<{a}>::ArgTypes>"));
        let (resolved, partial) = match &ty.kind {
            TypeKind::Reference { name, args } if name == "Partial" => {
                let [inner] = args.as_slice() else {
                    return Err(ExtractionError::new(
                        ty.span,
                        Error::UnsupportedType {
                            ty: ty.to_string(),
                            reason: "Partial takes exactly one type argument".to_string(),
                        },
                    ));
                };
                (ex.resolver.resolve(inner, scope, arg_access.as_deref())?, true)
            }
            _ => (ex.resolver.resolve(ty, scope, arg_access.as_deref())?, false),
        };

        let tags = ex.tags(param.doc.as_ref(), param.span)?;
        let resolved = apply_type_tags(resolved, &tags, param.span)?;

        params.push(ParamSchema {
            name: param.name.clone(),
            ty: resolved,
            optional: param.optional,
            partial,
            rest: param.rest,
        });
    }

    let ret = match &sig.ret {
        Some(ret) => {
            let ret_access = access.map(|a| format!("FunctionInfo<{a}>::ReturnType"));
            ex.resolver.resolve(ret, scope, ret_access.as_deref())?
        }
        None => QualType::void(),
    };

    Ok(ExtractedSignature {
        params,
        optional_args,
        ret,
    })
}

/// Apply the `@cppType` and `@cast` tags of a member or parameter to its resolved type
pub(crate) fn apply_type_tags(ty: QualType, tags: &Tags, span: Span) -> Result<QualType> {
    let ty = match &tags.cpp_type {
        Some(cpp_type) => QualType::new(TypeDescriptor::Named(cpp_type.clone()), ty.access),
        None => ty,
    };

    match &tags.cast {
        Some(enum_name) => ty
            .with_cast(enum_name)
            .map_err(|e| ExtractionError::new(span, e)),
        None => Ok(ty),
    }
}

/// A documented `declare function`
pub(crate) fn extract_function(
    ex: &Extractor,
    decl: &Decl,
    sig: &Signature,
    namespace: &[String],
) -> Result<Option<FunctionSchema>> {
    let tags = ex.tags(decl.doc.as_ref(), decl.span)?;
    if tags.skip {
        return Ok(None);
    }

    let native_namespace = ex.native_namespace(&tags, decl.span)?;
    extract_function_signature(ex, &decl.name, decl.span, sig, namespace, &native_namespace, tags).map(Some)
}

pub(crate) fn extract_function_signature(
    ex: &Extractor,
    name: &str,
    span: Span,
    sig: &Signature,
    namespace: &[String],
    native_namespace: &[String],
    tags: Tags,
) -> Result<FunctionSchema> {
    let access = if tags.jsfunc {
        None
    } else {
        Some(format!(
            "decltype(&{})",
            native_name(native_namespace, namespace, name)
        ))
    };

    let scope = ex.scope(namespace);
    let sig = extract_signature(ex, name, sig, &scope, access.as_deref())?;

    Ok(FunctionSchema {
        name: name.to_string(),
        namespace: namespace.to_vec(),
        native_namespace: native_namespace.to_vec(),
        file: ex.file,
        span,
        params: sig.params,
        optional_args: sig.optional_args,
        ret: sig.ret,
        jsfunc: tags.jsfunc,
        tags,
    })
}
