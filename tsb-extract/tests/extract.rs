mod common;

use indoc::indoc;
use tsb_extract::{Error, NamespaceTag, ParentRef, Primitive, QualType, TypeDescriptor};
use tsb_util::run_test;

fn prim(p: Primitive) -> TypeDescriptor {
    TypeDescriptor::Primitive(p)
}

#[test]
fn test_enum_members_in_order() -> Result<(), tsb_util::Error> {
    run_test(|| {
        let (_, extraction) = common::extract_str(indoc!(
            r#"
            /** */
            declare enum Color {
                Red,
                Green,
                Blue,
            }

            declare enum NotDocumented { A, B }

            /** */
            declare const enum CompileTimeOnly { A, B }
            "#
        ))?;

        assert!(!extraction.has_errors());
        let enums: Vec<_> = extraction.schema.enums().collect();
        assert_eq!(enums.len(), 1);

        let color = enums[0];
        assert_eq!(color.name, "Color");
        assert_eq!(color.native_name(), "krit::Color");
        assert_eq!(color.members, ["Red", "Green", "Blue"]);
        assert_eq!(
            color.values().collect::<Vec<_>>(),
            [("Red", 0), ("Green", 1), ("Blue", 2)]
        );

        Ok(())
    })
}

#[test]
fn test_optional_trailing_arguments() -> Result<(), tsb_util::Error> {
    run_test(|| {
        let (_, extraction) = common::extract_str(indoc!(
            r#"
            /** */
            declare class Widget {
                foo(a: number, b?: number, c?: number): void;
                static make(): Widget;
            }
            "#
        ))?;

        assert!(!extraction.has_errors(), "{:?}", common::error_messages(&extraction));
        let widget = extraction.schema.find_class(&[], "Widget").unwrap();

        let foo = &widget.methods[0];
        assert_eq!(foo.name, "foo");
        assert_eq!(foo.optional_args, 2);
        assert_eq!(foo.required_args(), 1);
        assert_eq!(foo.params[1].ty.descriptor, prim(Primitive::Number));
        assert!(foo.params[1].optional);
        assert_eq!(
            foo.params[1].ty.access.as_deref(),
            Some("std::tuple_element_t<1, FunctionInfo<decltype(&krit::Widget::foo)>::ArgTypes>")
        );
        assert_eq!(
            foo.ret.access.as_deref(),
            Some("FunctionInfo<decltype(&krit::Widget::foo)>::ReturnType")
        );
        assert!(foo.ret.is_void());

        let make = &widget.static_methods[0];
        assert!(make.is_static);
        assert_eq!(make.ret.descriptor, TypeDescriptor::Named("Widget".into()));

        Ok(())
    })
}

#[test]
fn test_accessor_pairing() -> Result<(), tsb_util::Error> {
    run_test(|| {
        let (_, extraction) = common::extract_str(indoc!(
            r#"
            /** */
            declare class Vec2f {
                get x(): number;
                set x(value: number);
                get length(): number;
                set onlySet(value: boolean);
            }
            "#
        ))?;

        assert!(!extraction.has_errors(), "{:?}", common::error_messages(&extraction));
        let vec = extraction.schema.find_class(&[], "Vec2f").unwrap();
        assert_eq!(vec.properties.len(), 3);

        let x = &vec.properties[0];
        assert_eq!(x.name, "x");
        assert!(!x.readonly);
        assert!(x.get && x.set);
        assert_eq!(x.ty, QualType::new(prim(Primitive::Number), None));

        let length = &vec.properties[1];
        assert_eq!(length.name, "length");
        assert!(length.readonly);
        assert!(length.get && !length.set);

        let only_set = &vec.properties[2];
        assert!(!only_set.readonly);
        assert!(!only_set.get && only_set.set);

        Ok(())
    })
}

#[test]
fn test_properties_keep_declaration_order() -> Result<(), tsb_util::Error> {
    run_test(|| {
        let (_, extraction) = common::extract_str(indoc!(
            r#"
            /** */
            declare class Camera {
                get zoom(): number;
                set zoom(value: number);
                x: number;
                static get main(): Camera;
                y: number;
                static count: integer;
                set zoom2(value: number);
            }
            "#
        ))?;

        assert!(!extraction.has_errors(), "{:?}", common::error_messages(&extraction));
        let camera = extraction.schema.find_class(&[], "Camera").unwrap();
        let names: Vec<_> = camera.properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["zoom", "x", "y", "zoom2"]);
        let statics: Vec<_> = camera.static_properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(statics, ["main", "count"]);

        Ok(())
    })
}

#[test]
fn test_accessor_errors() -> Result<(), tsb_util::Error> {
    run_test(|| {
        let (_, extraction) = common::extract_str(indoc!(
            r#"
            /** */
            declare class Dup {
                get x(): number;
                get x(): number;
                z: number;
                get z(): number;
                get w(): number;
                set w(value: string);
            }
            "#
        ))?;

        assert_eq!(
            common::error_messages(&extraction),
            [
                "property \"x\" already has a getter",
                "property \"z\" already has a plain property declaration",
                "invalid signature: getter and setter of \"w\" have different types (Number and String)",
            ]
        );

        // the rest of the class is still extracted
        let dup = extraction.schema.find_class(&[], "Dup").unwrap();
        assert_eq!(dup.properties.len(), 2);
        assert_eq!(dup.properties[0].name, "x");
        assert_eq!(dup.properties[1].name, "z");

        Ok(())
    })
}

#[test]
fn test_partial_constructor() -> Result<(), tsb_util::Error> {
    run_test(|| {
        let (_, extraction) = common::extract_str(indoc!(
            r#"
            /** */
            declare class Point {
                constructor(values: Partial<Point>);
                x: number;
                y: number;
                clone(): Point;
                static from(other: Point): Point;
            }

            /** */
            declare class Rect {
                constructor(values: Partial<Rect>);
                constructor(x: number, y: number, w?: number, h?: number);
                update(values: Partial<Rect>): void;
            }
            "#
        ))?;

        assert!(!extraction.has_errors(), "{:?}", common::error_messages(&extraction));

        let point = extraction.schema.find_class(&[], "Point").unwrap();
        assert!(point.partial && point.clone && point.from);
        let ctor = point.ctor.as_ref().unwrap();
        assert!(ctor.params.is_empty());
        assert!(point.methods.is_empty());
        assert!(point.static_methods.is_empty());
        assert_eq!(point.properties.len(), 2);
        assert_eq!(
            point.properties[0].ty.access.as_deref(),
            Some("decltype(krit::Point::x)")
        );

        let rect = extraction.schema.find_class(&[], "Rect").unwrap();
        assert!(rect.partial);
        let ctor = rect.ctor.as_ref().unwrap();
        assert_eq!(ctor.params.len(), 4);
        assert_eq!(ctor.optional_args, 2);
        assert_eq!(
            ctor.params[0].ty.access.as_deref(),
            Some("std::tuple_element_t<0, FunctionInfo<decltype(&krit::Rect::create)>::ArgTypes>")
        );

        let update = &rect.methods[0];
        assert!(update.params[0].partial);
        assert_eq!(update.params[0].ty.descriptor, TypeDescriptor::Named("Rect".into()));

        Ok(())
    })
}

#[test]
fn test_constructor_and_heritage_errors() -> Result<(), tsb_util::Error> {
    run_test(|| {
        let (_, extraction) = common::extract_str(indoc!(
            r#"
            /** */
            declare class Base {}

            /** */
            declare class Child extends Base {}

            /** */
            declare class Orphan extends Missing {}

            /** */
            interface Both extends Base, Child {}

            /** */
            declare class Two {
                constructor(a: number);
                constructor(a: string);
            }
            "#
        ))?;

        let errors: Vec<&Error> = extraction.errors.iter().map(|e| &e.error).collect();
        assert_eq!(errors.len(), 3);
        assert!(matches!(
            errors[0],
            Error::UnresolvedHeritage { class, parent } if class == "Orphan" && parent == "Missing"
        ));
        assert!(matches!(errors[1], Error::MultipleHeritage(name) if name == "Both"));
        assert!(matches!(errors[2], Error::MultipleConstructors(name) if name == "Two"));

        let child = extraction.schema.find_class(&[], "Child").unwrap();
        assert_eq!(
            child.parent.as_ref().map(|p| (p.name.as_str(), p.namespace.len())),
            Some(("Base", 0))
        );
        assert!(matches!(child.parent, Some(ParentRef { file: Some(_), .. })));

        Ok(())
    })
}

#[test]
fn test_namespaces_and_tags() -> Result<(), tsb_util::Error> {
    run_test(|| {
        let (_, extraction) = common::extract_str(indoc!(
            r#"
            declare namespace gfx {
                /**
                 * @import krit/render/Sprite.h
                 */
                class Sprite {
                    /** @cast BlendMode */
                    mode: integer;
                    /** @readonly @getter width */
                    width: number;
                    name: string | undefined;
                    parent?: Pointer<Sprite>;
                    tint: BlendMode;
                    /** @skip */
                    internal: SomethingUnknown;
                }

                /** */
                enum BlendMode { Alpha, Add }
            }

            /** @namespace other::place */
            declare class Elsewhere {}
            "#
        ))?;

        assert!(!extraction.has_errors(), "{:?}", common::error_messages(&extraction));

        let gfx = vec!["gfx".to_string()];
        let sprite = extraction.schema.find_class(&gfx, "Sprite").unwrap();
        assert_eq!(sprite.native_name(), "krit::gfx::Sprite");
        assert_eq!(sprite.script_path(), "gfx.Sprite");
        assert_eq!(sprite.tags.imports, ["krit/render/Sprite.h"]);

        let props = &sprite.properties;
        assert_eq!(
            props.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
            ["mode", "width", "name", "parent", "tint"]
        );
        assert_eq!(
            props[0].ty.descriptor,
            TypeDescriptor::Enum {
                name: "BlendMode".into(),
                namespace: vec![],
                explicit_cast: true
            }
        );
        assert!(props[1].readonly);
        assert_eq!(props[1].getter.as_deref(), Some("width"));
        assert!(matches!(props[2].ty.descriptor, TypeDescriptor::Optional(_)));
        assert!(matches!(
            &props[3].ty.descriptor,
            TypeDescriptor::Pointer { depth: 1, pointee } if pointee.descriptor == TypeDescriptor::Named("gfx.Sprite".into())
        ));
        assert_eq!(
            props[4].ty.descriptor,
            TypeDescriptor::Enum {
                name: "BlendMode".into(),
                namespace: gfx.clone(),
                explicit_cast: false
            }
        );

        let blend = extraction.schema.find_enum(&gfx, "BlendMode").unwrap();
        assert_eq!(blend.native_name(), "krit::gfx::BlendMode");

        let elsewhere = extraction.schema.find_class(&[], "Elsewhere").unwrap();
        assert_eq!(elsewhere.native_name(), "other::place::Elsewhere");
        assert_eq!(
            elsewhere.tags.namespace,
            Some(NamespaceTag::Path(vec!["other".into(), "place".into()]))
        );

        Ok(())
    })
}

#[test]
fn test_free_functions_and_namespace_markers() -> Result<(), tsb_util::Error> {
    run_test(|| {
        let (_, extraction) = common::extract_str(indoc!(
            r#"
            /** @jsfunc */
            declare function now(): number;

            /** */
            declare function lerp(a: float, b: float, t?: float): float;

            declare function undocumented(): void;

            /** @namespace */
            declare const Log: {
                debug(msg: string): void;
                info: (msg: string) => void;
                /** @skip */
                trace(msg: string): void;
                level: number;
                nested: { f(): void };
            };
            "#
        ))?;

        let errors: Vec<&Error> = extraction.errors.iter().map(|e| &e.error).collect();
        assert_eq!(errors.len(), 2);
        assert!(matches!(
            errors[0],
            Error::NonCallableNamespaceMember { namespace, member } if namespace == "Log" && member == "level"
        ));
        assert!(matches!(
            errors[1],
            Error::NestedNamespace { namespace, member } if namespace == "Log" && member == "nested"
        ));

        let functions: Vec<_> = extraction.schema.functions().collect();
        assert_eq!(
            functions
                .iter()
                .map(|f| (f.namespace.join("."), f.name.as_str()))
                .collect::<Vec<_>>(),
            [
                ("".to_string(), "now"),
                ("".to_string(), "lerp"),
                ("Log".to_string(), "debug"),
                ("Log".to_string(), "info"),
            ]
        );

        assert!(functions[0].jsfunc);
        assert_eq!(functions[0].ret.access, None);

        assert_eq!(functions[1].optional_args, 1);
        assert_eq!(functions[1].ret.descriptor, prim(Primitive::Float));
        assert_eq!(
            functions[1].ret.access.as_deref(),
            Some("FunctionInfo<decltype(&krit::lerp)>::ReturnType")
        );

        assert_eq!(functions[2].native_name(), "krit::Log::debug");
        assert_eq!(functions[3].params[0].ty.descriptor, prim(Primitive::String));

        Ok(())
    })
}

#[test]
fn test_errors_from_every_file() -> Result<(), tsb_util::Error> {
    run_test(|| {
        let (program, extraction) = common::extract_sources(&[
            (
                "/src/krit/a.d.ts",
                indoc!(
                    r#"
                    /** */
                    declare class A {
                        take(s: Sprit): void;
                        [key: string]: number;
                    }
                    "#
                ),
            ),
            (
                "/src/krit/b.d.ts",
                indoc!(
                    r#"
                    /** */
                    declare enum Flags { A = 1, B }
                    /** */
                    declare function tuple(): [number, number];
                    "#
                ),
            ),
            (
                "/elsewhere/c.d.ts",
                indoc!(
                    r#"
                    /** */
                    declare class Unmapped {}
                    declare class Ignored {}
                    "#
                ),
            ),
        ])?;

        let errors: Vec<(usize, &Error)> = extraction
            .errors
            .iter()
            .map(|e| (e.span.file.index(), &e.error))
            .collect();
        assert_eq!(errors.len(), 5);

        assert!(matches!(errors[0], (0, Error::UnresolvedType(name)) if name == "Sprit"));
        assert!(matches!(errors[1], (0, Error::UnsupportedMember { what, .. }) if what == "index signature"));
        assert!(matches!(errors[2], (1, Error::UnsupportedEnumValue(name)) if name == "A"));
        assert!(matches!(errors[3], (1, Error::UnsupportedType { .. })));
        assert!(matches!(errors[4], (2, Error::NoNamespaceMapping { .. })));

        // every error renders with its file context
        let rendered = extraction.errors[0].to_diagnostic().render(program.sources(), false);
        assert!(rendered.starts_with("==> /src/krit/a.d.ts: 3:13-3:18"));
        assert!(rendered.contains("type resolution failed for \"Sprit\""));

        Ok(())
    })
}

#[test]
fn test_extraction_is_deterministic() -> Result<(), tsb_util::Error> {
    run_test(|| {
        let src = indoc!(
            r#"
            declare namespace ui {
                /** */
                class Button {
                    label: string;
                    onClick(cb: (x: number) => void, data?: Map<string, number[]>): void;
                }
            }
            "#
        );

        let (_, first) = common::extract_str(src)?;
        let (_, second) = common::extract_str(src)?;
        assert!(!first.has_errors(), "{:?}", common::error_messages(&first));

        let first = serde_json::to_string_pretty(&first.schema)?;
        let second = serde_json::to_string_pretty(&second.schema)?;
        tsb_util::compare(&first, &second)?;

        Ok(())
    })
}

#[test]
fn test_skipped_namespace_is_not_entered() -> Result<(), tsb_util::Error> {
    run_test(|| {
        let (_, extraction) = common::extract_str(indoc!(
            r#"
            /** @skip */
            declare namespace hidden {
                /** */
                class Bar {
                    x: number;
                }

                /** */
                function f(): void;
            }

            /** visible */
            declare namespace shown {
                /** */
                function g(...parts: string[]): void;
            }
            "#
        ))?;

        assert!(!extraction.has_errors(), "{:?}", common::error_messages(&extraction));
        assert_eq!(extraction.schema.classes().count(), 0);

        let functions: Vec<_> = extraction.schema.functions().collect();
        assert_eq!(functions.len(), 1);
        assert_eq!(functions[0].namespace, ["shown"]);
        assert!(functions[0].params[0].rest);
        assert_eq!(functions[0].required_args(), 0);

        Ok(())
    })
}

#[test]
fn test_merged_declarations_are_located_errors() -> Result<(), tsb_util::Error> {
    run_test(|| {
        let (program, extraction) = common::extract_sources(&[
            (
                "/src/krit/a.d.ts",
                indoc!(
                    r#"
                    declare namespace gfx {
                        /** */
                        interface Shape {
                            area(): number;
                        }
                    }
                    "#
                ),
            ),
            (
                "/src/krit/b.d.ts",
                indoc!(
                    r#"
                    declare namespace gfx {
                        /** */
                        interface Shape {
                            perimeter(): number;
                        }
                    }
                    "#
                ),
            ),
        ])?;

        assert_eq!(
            common::error_messages(&extraction),
            ["\"gfx.Shape\" is declared more than once; merged declarations are not supported"]
        );
        assert_eq!(extraction.errors[0].span.file.index(), 1);
        let rendered = extraction.errors[0].to_diagnostic().render(program.sources(), false);
        assert!(rendered.starts_with("==> /src/krit/b.d.ts: "));

        Ok(())
    })
}
