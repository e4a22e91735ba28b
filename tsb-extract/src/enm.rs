use serde::Serialize;
use tracing::debug;
use tsb_ts::{Decl, EnumDecl, FileId, Span};

use crate::error::{Error, ExtractionError};
use crate::function::native_name;
use crate::resolve::qualified;
use crate::tags::Tags;
use crate::Extractor;

type Result<T, E = ExtractionError> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumSchema {
    pub name: String,
    pub namespace: Vec<String>,
    pub native_namespace: Vec<String>,
    #[serde(skip)]
    pub file: FileId,
    #[serde(skip)]
    pub span: Span,
    /// Member names in declaration order. A member's value is its position.
    pub members: Vec<String>,
    pub tags: Tags,
}

impl EnumSchema {
    pub fn native_name(&self) -> String {
        native_name(&self.native_namespace, &self.namespace, &self.name)
    }

    pub fn script_path(&self) -> String {
        qualified(&self.namespace, &self.name)
    }

    /// Members paired with their integer values
    pub fn values(&self) -> impl Iterator<Item = (&str, usize)> {
        self.members.iter().enumerate().map(|(i, m)| (m.as_str(), i))
    }
}

/// A documented, non-const enum
pub(crate) fn extract_enum(
    ex: &mut Extractor,
    decl: &Decl,
    enm: &EnumDecl,
    namespace: &[String],
) -> Result<Option<EnumSchema>> {
    let tags = ex.tags(decl.doc.as_ref(), decl.span)?;
    if tags.skip {
        return Ok(None);
    }
    if enm.is_const {
        debug!("{} is a const enum, not emitting", decl.name);
        return Ok(None);
    }

    let native_namespace = ex.native_namespace(&tags, decl.span)?;

    let mut members = Vec::with_capacity(enm.members.len());
    for member in &enm.members {
        if member.has_initializer {
            ex.record(ExtractionError::new(
                member.span,
                Error::UnsupportedEnumValue(member.name.clone()),
            ));
            continue;
        }
        members.push(member.name.clone());
    }

    Ok(Some(EnumSchema {
        name: decl.name.clone(),
        namespace: namespace.to_vec(),
        native_namespace,
        file: ex.file,
        span: decl.span,
        members,
        tags,
    }))
}
