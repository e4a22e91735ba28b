//! Documentation-comment tags.
//!
//! [`read_tags`] turns a `/** ... */` block into a raw [`TagMap`] without interpreting anything. [`Tags::parse`]
//! then validates the tags the extractor understands into typed switches and keeps everything else as passthrough
//! values for templates.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Serialize, Serializer};
use tracing::warn;
use tsb_ts::Doc;

use crate::error::Error;

type Result<T, E = Error> = std::result::Result<T, E>;

lazy_static! {
    static ref TAG_RE: Regex = Regex::new(r"(?:^|\s)@([A-Za-z_][A-Za-z0-9_]*)").unwrap();
}

/// Tags with a meaning to the extractor
const KNOWN_TAGS: &[&str] = &[
    "skip",
    "jsfunc",
    "namespace",
    "readonly",
    "cast",
    "cppType",
    "import",
    "pointerOnly",
    "getter",
    "setter",
    "convert",
    "convertFrom",
];

/// Ordinary documentation tags, accepted and ignored
const DOC_TAGS: &[&str] = &[
    "param",
    "returns",
    "return",
    "deprecated",
    "see",
    "example",
    "default",
    "internal",
    "remarks",
    "throws",
];

#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    /// The tag was given without a body
    Flag,
    Literal(serde_json::Value),
    Text(String),
}

impl TagValue {
    fn parse(body: &str) -> TagValue {
        let body = body.trim();
        if body.is_empty() {
            TagValue::Flag
        } else if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
            TagValue::Literal(value)
        } else {
            TagValue::Text(body.to_string())
        }
    }

    /// The value as text, if it has one
    pub fn as_text(&self) -> Option<String> {
        match self {
            TagValue::Flag => None,
            TagValue::Literal(serde_json::Value::String(s)) => Some(s.clone()),
            TagValue::Literal(v) => Some(v.to_string()),
            TagValue::Text(t) => Some(t.clone()),
        }
    }

    pub fn is_true(&self) -> bool {
        matches!(
            self,
            TagValue::Flag | TagValue::Literal(serde_json::Value::Bool(true))
        )
    }
}

impl Serialize for TagValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TagValue::Flag => serializer.serialize_bool(true),
            TagValue::Literal(v) => v.serialize(serializer),
            TagValue::Text(t) => serializer.serialize_str(t),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawTag {
    pub name: String,
    pub value: TagValue,
}

/// Every tag of one documentation block, in source order. Repeated tags are all kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagMap {
    tags: Vec<RawTag>,
}

impl TagMap {
    /// The value of the last occurrence of `name`
    pub fn get(&self, name: &str) -> Option<&TagValue> {
        self.tags.iter().rev().find(|t| t.name == name).map(|t| &t.value)
    }

    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a TagValue> + 'a {
        self.tags.iter().filter(move |t| t.name == name).map(|t| &t.value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RawTag> {
        self.tags.iter()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

/// Read the raw tags of a documentation block
pub fn read_tags(doc: Option<&Doc>) -> TagMap {
    let Some(doc) = doc else {
        return TagMap::default();
    };

    // drop the leading `*` gutter of each line
    let text = doc
        .text
        .lines()
        .map(|l| {
            let l = l.trim_start();
            l.strip_prefix('*').unwrap_or(l).trim()
        })
        .collect::<Vec<_>>()
        .join("\n");

    let matches: Vec<_> = TAG_RE.captures_iter(&text).collect();
    let mut tags = Vec::with_capacity(matches.len());
    for (i, cap) in matches.iter().enumerate() {
        let (Some(whole), Some(name)) = (cap.get(0), cap.get(1)) else {
            continue;
        };
        let end = matches
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map(|m| m.start())
            .unwrap_or(text.len());
        let body = text.get(whole.end()..end).unwrap_or("");

        tags.push(RawTag {
            name: name.as_str().to_string(),
            value: TagValue::parse(&body.replace('\n', " ")),
        });
    }

    TagMap { tags }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum NamespaceTag {
    /// Bare `@namespace` on a `declare const`
    Marker,
    Path(Vec<String>),
}

/// The typed view of a declaration's tags
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Tags {
    pub skip: bool,
    pub jsfunc: bool,
    pub namespace: Option<NamespaceTag>,
    pub readonly: bool,
    pub cast: Option<String>,
    pub cpp_type: Option<String>,
    pub imports: Vec<String>,
    pub pointer_only: bool,
    pub getter: Option<String>,
    pub setter: Option<String>,
    pub convert: bool,
    pub convert_from: Option<String>,
    /// Unrecognized tags, passed through to templates untouched
    pub passthrough: BTreeMap<String, TagValue>,
}

impl Tags {
    pub fn parse(map: &TagMap) -> Result<Tags> {
        let mut tags = Tags::default();

        for tag in map.iter() {
            let name = tag.name.as_str();
            let value = &tag.value;
            match name {
                "skip" => tags.skip = flag(name, value)?,
                "jsfunc" => tags.jsfunc = flag(name, value)?,
                "readonly" => tags.readonly = flag(name, value)?,
                "pointerOnly" => tags.pointer_only = flag(name, value)?,
                "convert" => tags.convert = flag(name, value)?,
                "namespace" => {
                    tags.namespace = Some(match value.as_text() {
                        None => NamespaceTag::Marker,
                        Some(text) => NamespaceTag::Path(namespace_path(&text)?),
                    })
                }
                "cast" => tags.cast = Some(text(name, value)?),
                "cppType" => tags.cpp_type = Some(text(name, value)?),
                "import" => tags.imports.push(text(name, value)?),
                "getter" => tags.getter = Some(text(name, value)?),
                "setter" => tags.setter = Some(text(name, value)?),
                "convertFrom" => tags.convert_from = Some(text(name, value)?),
                _ if DOC_TAGS.contains(&name) => {}
                _ => {
                    if let Some(known) = closest_known_tag(name) {
                        warn!("unknown tag @{name}, did you mean @{known}? Passing it through to templates");
                    }
                    tags.passthrough.insert(name.to_string(), value.clone());
                }
            }
        }

        Ok(tags)
    }
}

fn flag(name: &str, value: &TagValue) -> Result<bool> {
    match value {
        TagValue::Flag => Ok(true),
        TagValue::Literal(serde_json::Value::Bool(b)) => Ok(*b),
        _ => Err(Error::InvalidTag {
            tag: name.to_string(),
            reason: "expected no value or a boolean".to_string(),
        }),
    }
}

fn text(name: &str, value: &TagValue) -> Result<String> {
    value.as_text().ok_or_else(|| Error::InvalidTag {
        tag: name.to_string(),
        reason: "expected a value".to_string(),
    })
}

/// Split `a.b` or `a::b` into segments
fn namespace_path(text: &str) -> Result<Vec<String>> {
    let segments: Vec<String> = text
        .replace("::", ".")
        .split('.')
        .map(|s| s.trim().to_string())
        .collect();

    if segments.iter().any(|s| s.is_empty() || s.contains(char::is_whitespace)) {
        return Err(Error::InvalidTag {
            tag: "namespace".to_string(),
            reason: format!("\"{text}\" is not a namespace path"),
        });
    }

    Ok(segments)
}

fn closest_known_tag(name: &str) -> Option<&'static str> {
    KNOWN_TAGS
        .iter()
        .map(|known| (levenshtein::levenshtein(known, name), *known))
        .filter(|(dist, _)| *dist <= 2)
        .min_by_key(|(dist, _)| *dist)
        .map(|(_, known)| known)
}
