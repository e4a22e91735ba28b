//! The built-in renderer, producing QuickJS registration code.

use std::fmt::Write;

use indoc::indoc;
use tracing::instrument;
use tsb_translate::bridge::BridgeNode;
use tsb_translate::class::{ClassBinding, PropertyBinding};
use tsb_translate::function::CallableBinding;
use tsb_util::Trace;

use crate::error::Error;
use crate::render::{RenderContext, Renderer, Template};

type Result<T, E = Error> = std::result::Result<T, E>;

const GENERATED: &str = "// Generated by tsb-gen from TypeScript declarations. Do not edit.\n\n";

const CALLABLE_PARAMS: &str = "JSContext *ctx, JSValueConst this_val, int argc, JSValueConst *argv";

#[derive(Debug, Default, Clone, Copy)]
pub struct CppRenderer;

impl Renderer for CppRenderer {
    #[instrument(level = "trace", skip(self, ctx))]
    fn render(&self, template: Template, ctx: &RenderContext) -> Result<String> {
        let mut out = String::from(GENERATED);
        match template {
            Template::ClassUnit => class_unit(&mut out, ctx)?,
            Template::ClassRegistry => class_registry(&mut out, ctx)?,
            Template::Enums => enums(&mut out, ctx)?,
            Template::BridgeHeader => bridge_header(&mut out, ctx)?,
            Template::BridgeSource => bridge_source(&mut out, ctx)?,
        }
        Ok(out)
    }
}

fn includes(out: &mut String, ctx: &RenderContext) -> Result<()> {
    for include in &ctx.includes {
        writeln!(out, "#include \"{}\"", include.to_string_lossy().replace('\\', "/"))?;
    }
    Ok(())
}

/// `{ "a", "b", nullptr }`
fn namespace_array(namespace: &[String]) -> String {
    let mut items: Vec<String> = namespace.iter().map(|s| format!("\"{s}\"")).collect();
    items.push("nullptr".to_string());
    format!("{{ {} }}", items.join(", "))
}

fn indented(out: &mut String, text: &str, level: usize) -> Result<()> {
    let pad = "    ".repeat(level);
    for line in text.lines() {
        writeln!(out, "{pad}{line}")?;
    }
    Ok(())
}

fn argc_check(out: &mut String, what: &str, callable: &CallableBinding) -> Result<()> {
    if callable.required_args > 0 {
        writeln!(
            out,
            "    if (argc < {0}) return JS_ThrowTypeError(ctx, \"{what}: expected at least {0} arguments\");",
            callable.required_args
        )?;
    }
    Ok(())
}

fn class_unit(out: &mut String, ctx: &RenderContext) -> Result<()> {
    writeln!(out, "#include \"ScriptClass.h\"")?;
    includes(out, ctx)?;

    for class in &ctx.classes {
        writeln!(out)?;
        class_definition(out, ctx, class)?;
    }
    Ok(())
}

fn property_functions(
    out: &mut String,
    prefix: &str,
    p: &PropertyBinding,
    unwrap: Option<&str>,
) -> Result<()> {
    writeln!(out, "static JSValue {prefix}_get_{}(JSContext *ctx, JSValueConst this_val) {{", p.name)?;
    if let Some(unwrap) = unwrap {
        writeln!(out, "    {unwrap}")?;
    }
    writeln!(out, "    return {};", p.get)?;
    writeln!(out, "}}")?;

    if let Some(set) = &p.set {
        writeln!(
            out,
            "static JSValue {prefix}_set_{}(JSContext *ctx, JSValueConst this_val, JSValueConst val) {{",
            p.name
        )?;
        if let Some(unwrap) = unwrap {
            writeln!(out, "    {unwrap}")?;
        }
        writeln!(out, "    {set}")?;
        writeln!(out, "    return JS_UNDEFINED;")?;
        writeln!(out, "}}")?;
    }

    Ok(())
}

fn getset_entry(prefix: &str, p: &PropertyBinding) -> String {
    let setter = if p.set.is_some() {
        format!("{prefix}_set_{}", p.name)
    } else {
        "NULL".to_string()
    };
    format!("JS_CGETSET_DEF(\"{0}\", {prefix}_get_{0}, {setter}),", p.name)
}

fn method_function(
    out: &mut String,
    class: &ClassBinding,
    prefix: &str,
    m: &CallableBinding,
    unwrap: Option<&str>,
) -> Result<()> {
    writeln!(out, "static JSValue {prefix}_{}({CALLABLE_PARAMS}) {{", m.name)?;
    argc_check(out, &format!("{}.{}", class.script_path, m.name), m)?;
    if let Some(unwrap) = unwrap {
        writeln!(out, "    {unwrap}")?;
    }
    indented(out, &m.body, 1)?;
    writeln!(out, "}}")?;
    Ok(())
}

fn class_definition(out: &mut String, ctx: &RenderContext, class: &ClassBinding) -> Result<()> {
    let id = &class.ident;
    let native = &class.native_name;
    let unwrap = format!("auto *self = ScriptObject<{native}>::unwrap(ctx, this_val);");
    let static_prefix = format!("{id}_static");

    writeln!(out, "// {}", class.script_path)?;

    let mut proto = Vec::new();
    let mut statics = Vec::new();

    for p in &class.properties {
        property_functions(out, id, p, Some(&unwrap))?;
        proto.push(getset_entry(id, p));
    }
    for p in &class.static_properties {
        property_functions(out, &static_prefix, p, None)?;
        statics.push(getset_entry(&static_prefix, p));
    }

    for m in &class.methods {
        method_function(out, class, id, m, Some(&unwrap))?;
        proto.push(format!(
            "JS_CFUNC_DEF(\"{0}\", {1}, {id}_{0}),",
            m.name,
            m.params.len()
        ));
    }
    for m in &class.static_methods {
        method_function(out, class, &static_prefix, m, None)?;
        statics.push(format!(
            "JS_CFUNC_DEF(\"{0}\", {1}, {static_prefix}_{0}),",
            m.name,
            m.params.len()
        ));
    }

    if class.clone {
        writeln!(out, "static JSValue {id}_clone({CALLABLE_PARAMS}) {{")?;
        writeln!(out, "    {unwrap}")?;
        writeln!(out, "    return ScriptObject<{native}>::wrap(ctx, new {native}(*self));")?;
        writeln!(out, "}}")?;
        proto.push(format!("JS_CFUNC_DEF(\"clone\", 0, {id}_clone),"));
    }

    if class.partial {
        writeln!(
            out,
            "template <> void ScriptValueFromPartial<{native}>::populate(JSContext *ctx, {native} &out, JSValueConst partial) {{"
        )?;
        writeln!(out, "    auto *self = &out;")?;
        for p in &class.properties {
            if let Some(set) = &p.set {
                writeln!(out, "    {{")?;
                writeln!(out, "        JSValue val = JS_GetPropertyStr(ctx, partial, \"{}\");", p.name)?;
                writeln!(out, "        if (!JS_IsUndefined(val)) {{")?;
                writeln!(out, "            {set}")?;
                writeln!(out, "        }}")?;
                writeln!(out, "        JS_FreeValue(ctx, val);")?;
                writeln!(out, "    }}")?;
            }
        }
        writeln!(out, "}}")?;
    }

    if class.from {
        writeln!(out, "static JSValue {id}_from({CALLABLE_PARAMS}) {{")?;
        writeln!(
            out,
            "    return ScriptObject<{native}>::wrap(ctx, new {native}(ScriptValueFromPartial<{native}>::valueFromPartial(ctx, argv[0])));"
        )?;
        writeln!(out, "}}")?;
        statics.push(format!("JS_CFUNC_DEF(\"from\", 1, {id}_from),"));
    }

    let ctor = match (&class.ctor, class.is_interface) {
        (Some(ctor), false) => Some(ctor),
        _ => None,
    };
    if let Some(ctor) = ctor {
        writeln!(
            out,
            "static JSValue {id}_new(JSContext *ctx, JSValueConst new_target, int argc, JSValueConst *argv) {{"
        )?;
        argc_check(out, &class.script_path, ctor)?;
        writeln!(out, "    return ScriptObject<{native}>::wrap(ctx, {});", ctor.call)?;
        writeln!(out, "}}")?;
    }

    if !proto.is_empty() {
        writeln!(out, "static const JSCFunctionListEntry {id}_proto[] = {{")?;
        for entry in &proto {
            writeln!(out, "    {entry}")?;
        }
        writeln!(out, "}};")?;
    }
    if !statics.is_empty() {
        writeln!(out, "static const JSCFunctionListEntry {static_prefix}[] = {{")?;
        for entry in &statics {
            writeln!(out, "    {entry}")?;
        }
        writeln!(out, "}};")?;
    }

    writeln!(out, "void {id}_init(JSContext *ctx, JSValue global) {{")?;
    match &class.parent {
        Some(parent) => {
            // parents were checked when the classes were ordered
            let parent = ctx.model.get_class(parent).ok_or_else(|| Error::ClassNotFound {
                name: parent.clone(),
                source: Trace::new(),
            })?;
            writeln!(
                out,
                "    JSValue proto = JS_NewObjectProto(ctx, ScriptClassRegistry::proto(ctx, ScriptClass_{}));",
                parent.ident
            )?;
        }
        None => writeln!(out, "    JSValue proto = JS_NewObject(ctx);")?,
    }
    if !proto.is_empty() {
        writeln!(
            out,
            "    JS_SetPropertyFunctionList(ctx, proto, {id}_proto, std::size({id}_proto));"
        )?;
    }
    writeln!(
        out,
        "    ScriptClassRegistry::define(ctx, ScriptClass_{id}, \"{}\", proto);",
        class.name
    )?;

    if class.is_interface {
        writeln!(out, "}}")?;
        return Ok(());
    }

    match ctor {
        Some(ctor) => {
            writeln!(
                out,
                "    JSValue ctor = JS_NewCFunction2(ctx, {id}_new, \"{}\", {}, JS_CFUNC_constructor, 0);",
                class.name, ctor.required_args
            )?;
            writeln!(out, "    JS_SetConstructor(ctx, ctor, proto);")?;
        }
        None => writeln!(out, "    JSValue ctor = JS_NewObject(ctx);")?,
    }
    if !statics.is_empty() {
        writeln!(
            out,
            "    JS_SetPropertyFunctionList(ctx, ctor, {static_prefix}, std::size({static_prefix}));"
        )?;
    }
    writeln!(
        out,
        "    ScriptNamespace::define(ctx, global, {}, \"{}\", ctor);",
        namespace_array(&class.namespace),
        class.name
    )?;
    writeln!(out, "}}")?;

    Ok(())
}

fn class_registry(out: &mut String, ctx: &RenderContext) -> Result<()> {
    out.push_str(indoc!(
        r#"
        #pragma once

        #include <iterator>

        #include "quickjs.h"
        #include "ScriptRuntime.h"
        "#
    ));
    includes(out, ctx)?;

    writeln!(out)?;
    writeln!(out, "enum ScriptClassId {{")?;
    for class in &ctx.classes {
        writeln!(out, "    ScriptClass_{},", class.ident)?;
    }
    writeln!(out, "    ScriptClassCount,")?;
    writeln!(out, "}};")?;

    for class in &ctx.classes {
        let native = &class.native_name;
        writeln!(out)?;
        writeln!(
            out,
            "template <> struct TypeConverter<{native} *> : ScriptPointerConverter<{native}, ScriptClass_{}> {{}};",
            class.ident
        )?;
        if class.pointer_only {
            continue;
        }
        match (&class.convert_from, class.convert) {
            (Some(from), _) => writeln!(
                out,
                "template <> struct TypeConverter<{native}> : ScriptConvertFrom<{native}, {from}> {{}};"
            )?,
            (None, true) => writeln!(
                out,
                "template <> struct TypeConverter<{native}> : ScriptStructConverter<{native}> {{}};"
            )?,
            (None, false) => writeln!(
                out,
                "template <> struct TypeConverter<{native}> : ScriptValueConverter<{native}, ScriptClass_{}> {{}};",
                class.ident
            )?,
        }
    }

    writeln!(out)?;
    for class in &ctx.classes {
        writeln!(out, "void {}_init(JSContext *ctx, JSValue global);", class.ident)?;
    }

    writeln!(out)?;
    writeln!(out, "inline void initScriptClasses(JSContext *ctx, JSValue global) {{")?;
    for class in &ctx.classes {
        writeln!(out, "    {}_init(ctx, global);", class.ident)?;
    }
    writeln!(out, "}}")?;
    Ok(())
}

fn enums(out: &mut String, ctx: &RenderContext) -> Result<()> {
    writeln!(out, "#include \"ScriptClass.h\"")?;
    includes(out, ctx)?;
    writeln!(out)?;

    for enm in &ctx.model.enums {
        for (member, value) in &enm.values {
            writeln!(
                out,
                "static_assert(static_cast<int>({}::{member}) == {value});",
                enm.native_name
            )?;
        }
    }
    if !ctx.model.enums.is_empty() {
        writeln!(out)?;
    }

    writeln!(out, "void initScriptEnums(JSContext *ctx, JSValue global) {{")?;
    for enm in &ctx.model.enums {
        writeln!(out, "    {{")?;
        writeln!(out, "        JSValue values = JS_NewObject(ctx);")?;
        for (member, value) in &enm.values {
            writeln!(
                out,
                "        JS_SetPropertyStr(ctx, values, \"{member}\", JS_NewInt32(ctx, {value}));"
            )?;
        }
        writeln!(
            out,
            "        ScriptNamespace::define(ctx, global, {}, \"{}\", values);",
            namespace_array(&enm.namespace),
            enm.name
        )?;
        writeln!(out, "    }}")?;
    }
    writeln!(out, "}}")?;
    Ok(())
}

fn bridge_header(out: &mut String, ctx: &RenderContext) -> Result<()> {
    out.push_str(indoc!(
        r#"
        #pragma once

        #include "quickjs.h"
        "#
    ));

    let hooks: Vec<_> = ctx.model.functions.iter().filter(|f| f.jsfunc).collect();
    if !hooks.is_empty() {
        writeln!(out)?;
        writeln!(out, "// Implemented by the script runtime")?;
        for f in hooks {
            writeln!(out, "JSValue {}({CALLABLE_PARAMS});", f.script_name)?;
        }
    }

    writeln!(out)?;
    writeln!(out, "void initScriptBridge(JSContext *ctx, JSValue global);")?;
    Ok(())
}

fn bridge_source(out: &mut String, ctx: &RenderContext) -> Result<()> {
    writeln!(out, "#include \"ScriptBridge.h\"")?;
    writeln!(out, "#include \"ScriptClass.h\"")?;
    includes(out, ctx)?;

    for f in &ctx.model.functions {
        if let Some(callable) = &f.callable {
            writeln!(out)?;
            writeln!(out, "static JSValue bridge_{}({CALLABLE_PARAMS}) {{", f.script_name)?;
            let what = f
                .namespace
                .iter()
                .map(|s| s.as_str())
                .chain(std::iter::once(f.name.as_str()))
                .collect::<Vec<_>>()
                .join(".");
            argc_check(out, &what, callable)?;
            indented(out, &callable.body, 1)?;
            writeln!(out, "}}")?;
        }
    }

    writeln!(out)?;
    writeln!(out, "void initScriptBridge(JSContext *ctx, JSValue global) {{")?;
    bridge_node(out, ctx, &ctx.model.bridge.root, "global", 0)?;
    writeln!(out, "}}")?;
    Ok(())
}

fn bridge_node(out: &mut String, ctx: &RenderContext, node: &BridgeNode, target: &str, depth: usize) -> Result<()> {
    let pad = "    ".repeat(depth + 1);
    for &index in &node.functions {
        let f = &ctx.model.functions[index];
        let entry = if f.jsfunc {
            f.script_name.clone()
        } else {
            format!("bridge_{}", f.script_name)
        };
        writeln!(
            out,
            "{pad}JS_SetPropertyStr(ctx, {target}, \"{0}\", JS_NewCFunction(ctx, {entry}, \"{0}\", {1}));",
            f.name, f.arity
        )?;
    }

    for child in &node.children {
        let ns = format!("ns{}", depth + 1);
        writeln!(out, "{pad}{{")?;
        writeln!(
            out,
            "{pad}    JSValue {ns} = ScriptNamespace::get(ctx, {target}, \"{}\");",
            child.name
        )?;
        bridge_node(out, ctx, child, &ns, depth + 1)?;
        writeln!(out, "{pad}    JS_FreeValue(ctx, {ns});")?;
        writeln!(out, "{pad}}}")?;
    }
    Ok(())
}
