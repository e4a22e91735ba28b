use std::path::PathBuf;

use tracing::{instrument, trace};
use tsb_extract::{ClassSchema, MethodSchema, PropertySchema};
use tsb_ts::index_map::IndexMapKey;

use crate::error::Error;
use crate::function::{script_name, translate_callable, CallableBinding};
use crate::native::NativeNames;

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyBinding {
    pub name: String,
    pub typename: String,
    pub readonly: bool,
    /// Expression producing the encoded script value
    pub get: String,
    /// Statement storing the decoded `val`, absent for read-only properties
    pub set: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassBinding {
    pub name: String,
    pub script_path: String,
    /// Flat identifier used for the generated class id and its functions
    pub ident: String,
    pub native_name: String,
    pub namespace: Vec<String>,
    pub native_namespace: Vec<String>,
    pub source: PathBuf,
    /// Script path of the parent class
    pub parent: Option<String>,
    pub is_interface: bool,
    pub ctor: Option<CallableBinding>,
    pub properties: Vec<PropertyBinding>,
    pub static_properties: Vec<PropertyBinding>,
    pub methods: Vec<CallableBinding>,
    pub static_methods: Vec<CallableBinding>,
    pub partial: bool,
    pub clone: bool,
    pub from: bool,
    pub pointer_only: bool,
    pub convert: bool,
    pub convert_from: Option<String>,
    pub imports: Vec<String>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ClassBindingId(usize);

impl IndexMapKey for ClassBindingId {
    fn get(&self) -> usize {
        self.0
    }

    fn from_index(index: usize) -> Self {
        ClassBindingId(index)
    }
}

#[instrument(level = "trace", skip(names, class), fields(name = %class.name))]
pub(crate) fn translate_class(
    names: &NativeNames,
    class: &ClassSchema,
    source: PathBuf,
) -> Result<ClassBinding> {
    let native_name = class.native_name();
    trace!("Translate class {} as {native_name}", class.script_path());

    let ctor = class
        .ctor
        .as_ref()
        .map(|ctor| {
            translate_callable(
                names,
                &ctor.name,
                &format!("{native_name}::create"),
                &ctor.params,
                ctor.optional_args,
                &ctor.ret,
            )
        })
        .transpose()?;

    let properties = class
        .properties
        .iter()
        .map(|p| translate_property(names, "self->", p))
        .collect::<Result<Vec<_>>>()?;
    let static_receiver = format!("{native_name}::");
    let static_properties = class
        .static_properties
        .iter()
        .map(|p| translate_property(names, &static_receiver, p))
        .collect::<Result<Vec<_>>>()?;

    let methods = class
        .methods
        .iter()
        .map(|m| translate_method(names, "self->", m))
        .collect::<Result<Vec<_>>>()?;
    let static_methods = class
        .static_methods
        .iter()
        .map(|m| translate_method(names, &static_receiver, m))
        .collect::<Result<Vec<_>>>()?;

    Ok(ClassBinding {
        name: class.name.clone(),
        script_path: class.script_path(),
        ident: script_name(&class.namespace, &class.name),
        native_name,
        namespace: class.namespace.clone(),
        native_namespace: class.native_namespace.clone(),
        source,
        parent: class.parent.as_ref().map(|p| {
            p.namespace
                .iter()
                .map(|s| s.as_str())
                .chain(std::iter::once(p.name.as_str()))
                .collect::<Vec<_>>()
                .join(".")
        }),
        is_interface: class.is_interface,
        ctor,
        properties,
        static_properties,
        methods,
        static_methods,
        partial: class.partial,
        clone: class.clone,
        from: class.from,
        pointer_only: class.tags.pointer_only,
        convert: class.tags.convert,
        convert_from: class.tags.convert_from.clone(),
        imports: class.tags.imports.clone(),
    })
}

fn translate_method(names: &NativeNames, receiver: &str, method: &MethodSchema) -> Result<CallableBinding> {
    translate_callable(
        names,
        &method.name,
        &format!("{receiver}{}", method.name),
        &method.params,
        method.optional_args,
        &method.ret,
    )
}

/// Fields are read and assigned directly, accessors go through `get_x()`/`set_x(v)` unless tags name the native
/// functions.
fn translate_property(names: &NativeNames, receiver: &str, p: &PropertySchema) -> Result<PropertyBinding> {
    let native_get = match (&p.getter, p.get) {
        (Some(getter), _) => format!("{receiver}{getter}()"),
        (None, true) => format!("{receiver}get_{}()", p.name),
        (None, false) => format!("{receiver}{}", p.name),
    };

    let set = if p.readonly {
        None
    } else {
        let val = names.decode(&p.ty, "val")?;
        Some(match (&p.setter, p.set) {
            (Some(setter), _) => format!("{receiver}{setter}({val});"),
            (None, true) => format!("{receiver}set_{}({val});", p.name),
            (None, false) => format!("{receiver}{} = {val};", p.name),
        })
    };

    Ok(PropertyBinding {
        name: p.name.clone(),
        typename: names.typename(&p.ty)?,
        readonly: p.readonly,
        get: names.encode(&p.ty, &native_get)?,
        set,
    })
}
