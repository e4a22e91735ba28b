//! Native (C++) spellings of resolved types and the conversion expressions that move values across the boundary.

use hashbrown::HashMap;
use tsb_extract::{Primitive, QualType, Schema, TypeDescriptor};

use crate::error::Error;

type Result<T, E = Error> = std::result::Result<T, E>;

/// Maps script names of extracted classes and enums to their native names
#[derive(Debug, Default)]
pub struct NativeNames {
    types: HashMap<String, String>,
    /// Bare enum name to native names, for `@cast` tags that don't give a namespace
    enums: HashMap<String, Vec<String>>,
}

impl NativeNames {
    pub fn new(schema: &Schema) -> NativeNames {
        let mut names = NativeNames::default();
        for class in schema.classes() {
            names.types.insert(class.script_path(), class.native_name());
        }
        for enm in schema.enums() {
            names.types.insert(enm.script_path(), enm.native_name());
            names
                .enums
                .entry(enm.name.clone())
                .or_default()
                .push(enm.native_name());
        }
        names
    }

    /// The native name of the type with script path `path`. Types that weren't extracted are assumed to live in
    /// the native namespace matching their script path.
    pub fn type_name(&self, path: &str) -> String {
        self.types
            .get(path)
            .cloned()
            .unwrap_or_else(|| path.replace('.', "::"))
    }

    pub fn enum_name(&self, name: &str, namespace: &[String]) -> Result<String> {
        if !namespace.is_empty() {
            return Ok(self.type_name(&format!("{}.{}", namespace.join("."), name)));
        }
        if let Some(native) = self.types.get(name) {
            return Ok(native.clone());
        }

        match self.enums.get(name).map(|v| v.as_slice()) {
            Some([native]) => Ok(native.clone()),
            Some(candidates) if candidates.len() > 1 => Err(Error::AmbiguousEnum {
                name: name.to_string(),
                candidates: candidates.to_vec(),
            }),
            _ => Ok(name.to_string()),
        }
    }

    /// How native code spells `q`
    pub fn spell(&self, q: &QualType) -> Result<String> {
        let s = match &q.descriptor {
            TypeDescriptor::Primitive(p) => primitive(*p).to_string(),
            // enums cross the boundary as plain integers
            TypeDescriptor::Enum { .. } => "int".to_string(),
            TypeDescriptor::Array(e) => format!("std::vector<{}>", self.spell(e)?),
            TypeDescriptor::Optional(e) => format!("std::optional<{}>", self.spell(e)?),
            TypeDescriptor::Reference(e) => format!("{}&", self.spell(e)?),
            TypeDescriptor::Pointer { pointee, depth } => {
                format!("{}{}", self.spell(pointee)?, "*".repeat(*depth as usize))
            }
            TypeDescriptor::Map(v) => format!("std::unordered_map<std::string, {}>", self.spell(v)?),
            TypeDescriptor::Named(name) if name == tsb_extract::resolve::CALLBACK => "JSValue".to_string(),
            TypeDescriptor::Named(name) => self.type_name(name),
        };
        Ok(s)
    }

    /// The access expression if there is one, the spelling otherwise. Enums are always `int`.
    pub fn typename(&self, q: &QualType) -> Result<String> {
        match (&q.descriptor, &q.access) {
            (TypeDescriptor::Enum { .. }, _) | (_, None) => self.spell(q),
            (_, Some(access)) => Ok(access.clone()),
        }
    }

    /// Expression converting the script value `value` to `q`
    pub fn decode(&self, q: &QualType, value: &str) -> Result<String> {
        if let Some(native_enum) = self.cast_enum(q)? {
            return Ok(format!(
                "static_cast<{native_enum}>(TypeConverter<int>::valueFromJs(ctx, {value}))"
            ));
        }
        Ok(format!(
            "TypeConverter<{}>::valueFromJs(ctx, {value})",
            self.typename(q)?
        ))
    }

    /// Expression converting the native `value` of type `q` to a script value
    pub fn encode(&self, q: &QualType, value: &str) -> Result<String> {
        if self.cast_enum(q)?.is_some() {
            return Ok(format!(
                "TypeConverter<int>::valueToJs(ctx, static_cast<int>({value}))"
            ));
        }
        Ok(format!(
            "TypeConverter<{}>::valueToJs(ctx, {value})",
            self.typename(q)?
        ))
    }

    fn cast_enum(&self, q: &QualType) -> Result<Option<String>> {
        match &q.descriptor {
            TypeDescriptor::Enum {
                name,
                namespace,
                explicit_cast: true,
            } => self.enum_name(name, namespace).map(Some),
            _ => Ok(None),
        }
    }
}

pub fn primitive(p: Primitive) -> &'static str {
    match p {
        Primitive::Void => "void",
        Primitive::Bool => "bool",
        Primitive::Number => "double",
        Primitive::Float => "float",
        Primitive::Integer => "int",
        Primitive::Int64 => "int64_t",
        Primitive::UInt => "unsigned int",
        Primitive::SizeT => "size_t",
        Primitive::String => "std::string",
        Primitive::StringView => "std::string_view",
        Primitive::CString => "const char*",
        Primitive::Any => "JSValue",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(d: TypeDescriptor) -> QualType {
        QualType::new(d, None)
    }

    fn boxed(d: TypeDescriptor) -> Box<QualType> {
        Box::new(q(d))
    }

    #[test]
    fn spellings() {
        let names = NativeNames::default();
        let float = TypeDescriptor::Primitive(Primitive::Float);

        assert_eq!(names.spell(&q(float.clone())).unwrap(), "float");
        assert_eq!(
            names.spell(&q(TypeDescriptor::Array(boxed(TypeDescriptor::Optional(boxed(float.clone())))))).unwrap(),
            "std::vector<std::optional<float>>"
        );
        assert_eq!(
            names
                .spell(&q(TypeDescriptor::Pointer {
                    pointee: boxed(TypeDescriptor::Named("gfx.Sprite".into())),
                    depth: 2
                }))
                .unwrap(),
            "gfx::Sprite**"
        );
        assert_eq!(
            names.spell(&q(TypeDescriptor::Map(boxed(TypeDescriptor::Reference(boxed(float)))))).unwrap(),
            "std::unordered_map<std::string, float&>"
        );
        assert_eq!(
            names.spell(&q(TypeDescriptor::Named("callback".into()))).unwrap(),
            "JSValue"
        );
    }

    #[test]
    fn conversions() {
        let names = NativeNames::default();
        let with_access = QualType::new(
            TypeDescriptor::Primitive(Primitive::Number),
            Some("decltype(krit::Point::x)".into()),
        );
        assert_eq!(
            names.decode(&with_access, "argv[0]").unwrap(),
            "TypeConverter<decltype(krit::Point::x)>::valueFromJs(ctx, argv[0])"
        );
        assert_eq!(
            names.encode(&q(TypeDescriptor::Primitive(Primitive::String)), "s").unwrap(),
            "TypeConverter<std::string>::valueToJs(ctx, s)"
        );

        let cast = q(TypeDescriptor::Enum {
            name: "BlendMode".into(),
            namespace: vec![],
            explicit_cast: true,
        });
        assert_eq!(
            names.decode(&cast, "val").unwrap(),
            "static_cast<BlendMode>(TypeConverter<int>::valueFromJs(ctx, val))"
        );
        assert_eq!(
            names.encode(&cast, "self->mode").unwrap(),
            "TypeConverter<int>::valueToJs(ctx, static_cast<int>(self->mode))"
        );
    }

    #[test]
    fn plain_enums_are_integers() {
        let names = NativeNames::default();
        let color = QualType::new(
            TypeDescriptor::Enum {
                name: "Color".into(),
                namespace: vec![],
                explicit_cast: false,
            },
            Some("std::tuple_element_t<0, FunctionInfo<decltype(&krit::paint)>::ArgTypes>".into()),
        );

        assert_eq!(names.spell(&color).unwrap(), "int");
        assert_eq!(names.typename(&color).unwrap(), "int");
        assert_eq!(
            names.decode(&color, "argv[0]").unwrap(),
            "TypeConverter<int>::valueFromJs(ctx, argv[0])"
        );
        assert_eq!(
            names.encode(&color, "c").unwrap(),
            "TypeConverter<int>::valueToJs(ctx, c)"
        );
        assert_eq!(
            names.spell(&q(TypeDescriptor::Array(Box::new(color)))).unwrap(),
            "std::vector<int>"
        );
    }

    #[test]
    fn ambiguous_enum_names() {
        let mut names = NativeNames::default();
        names
            .enums
            .insert("Mode".into(), vec!["a::Mode".into(), "b::Mode".into()]);
        names.enums.insert("Unique".into(), vec!["c::Unique".into()]);

        assert_eq!(names.enum_name("Unique", &[]).unwrap(), "c::Unique");
        assert_eq!(names.enum_name("Elsewhere", &[]).unwrap(), "Elsewhere");
        assert!(matches!(
            names.enum_name("Mode", &[]),
            Err(Error::AmbiguousEnum { candidates, .. }) if candidates.len() == 2
        ));
    }
}
