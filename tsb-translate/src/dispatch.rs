//! Argument-count dispatch for signatures with optional trailing parameters.

use tsb_extract::ParamSchema;

use crate::error::Error;
use crate::native::NativeNames;

type Result<T, E = Error> = std::result::Result<T, E>;

/// A parameter ready to be decoded from `argv`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamBinding {
    pub name: String,
    pub typename: String,
    /// Expression producing the native argument
    pub decode: String,
    pub optional: bool,
    pub rest: bool,
    pub partial: bool,
}

pub fn translate_params(names: &NativeNames, params: &[ParamSchema]) -> Result<Vec<ParamBinding>> {
    params
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let typename = names.typename(&p.ty)?;
            let decode = if p.rest {
                format!("TypeConverter<{typename}>::restFromJs(ctx, argc, argv, {i})")
            } else if p.partial {
                format!("ScriptValueFromPartial<{typename}>::valueFromPartial(ctx, argv[{i}])")
            } else {
                names.decode(&p.ty, &format!("argv[{i}]"))?
            };

            Ok(ParamBinding {
                name: p.name.clone(),
                typename,
                decode,
                optional: p.optional,
                rest: p.rest,
                partial: p.partial,
            })
        })
        .collect()
}

/// Build the call of `callee` with `args`, selecting on `argc` how many of the `optional` trailing arguments to
/// pass. Omitted arguments take their native defaults.
///
/// For `f(a, b?, c?)` this is `(argc < 2) ? (f(a)) : (argc < 3) ? (f(a, b)) : f(a, b, c)`.
pub fn call_expression(callee: &str, args: &[String], optional: usize) -> String {
    let optional = optional.min(args.len());
    let required = args.len() - optional;

    let mut out = String::new();
    for passed in required..args.len() {
        out.push_str(&format!(
            "(argc < {}) ? ({callee}({})) : ",
            passed + 1,
            args[..passed].join(", ")
        ));
    }
    out.push_str(&format!("{callee}({})", args.join(", ")));
    out
}

#[cfg(test)]
mod tests {
    use tsb_extract::{Primitive, QualType, TypeDescriptor};

    use super::*;

    fn args(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("a{i}")).collect()
    }

    #[test]
    fn dispatch_on_argument_count() {
        assert_eq!(call_expression("f", &args(0), 0), "f()");
        assert_eq!(call_expression("f", &args(2), 0), "f(a0, a1)");
        assert_eq!(
            call_expression("self->foo", &args(3), 2),
            "(argc < 2) ? (self->foo(a0)) : (argc < 3) ? (self->foo(a0, a1)) : self->foo(a0, a1, a2)"
        );
        assert_eq!(
            call_expression("g", &args(1), 1),
            "(argc < 1) ? (g()) : g(a0)"
        );
    }

    #[test]
    fn parameter_decoding() {
        let names = NativeNames::default();
        let number = QualType::new(
            TypeDescriptor::Primitive(Primitive::Number),
            Some("std::tuple_element_t<0, FunctionInfo<decltype(&krit::f)>::ArgTypes>".into()),
        );
        let params = vec![
            ParamSchema {
                name: "a".into(),
                ty: number,
                optional: false,
                partial: false,
                rest: false,
            },
            ParamSchema {
                name: "p".into(),
                ty: QualType::new(TypeDescriptor::Named("Point".into()), None),
                optional: false,
                partial: true,
                rest: false,
            },
            ParamSchema {
                name: "rest".into(),
                ty: QualType::new(
                    TypeDescriptor::Array(Box::new(QualType::new(
                        TypeDescriptor::Primitive(Primitive::String),
                        None,
                    ))),
                    None,
                ),
                optional: false,
                partial: false,
                rest: true,
            },
        ];

        let bound = translate_params(&names, &params).unwrap();
        assert_eq!(
            bound[0].decode,
            "TypeConverter<std::tuple_element_t<0, FunctionInfo<decltype(&krit::f)>::ArgTypes>>::valueFromJs(ctx, argv[0])"
        );
        assert_eq!(
            bound[1].decode,
            "ScriptValueFromPartial<Point>::valueFromPartial(ctx, argv[1])"
        );
        assert_eq!(
            bound[2].decode,
            "TypeConverter<std::vector<std::string>>::restFromJs(ctx, argc, argv, 2)"
        );
    }
}
