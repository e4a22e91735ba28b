//! Translation of the extracted [`Schema`] into a [`BindingModel`]: every type spelled natively, every callable given
//! its argument decoding and dispatch expression, and free functions arranged into the bridge namespace tree. The
//! writer only has to lay these out.

pub mod bridge;
pub mod class;
pub mod dispatch;
pub mod error;
pub mod function;
pub mod native;

use std::fmt::Debug;
use std::path::PathBuf;

use bridge::BridgeTree;
use class::{translate_class, ClassBinding, ClassBindingId};
use function::{translate_function, FunctionBinding};
use native::NativeNames;
use tracing::{debug, instrument};
use tsb_extract::{EnumSchema, Schema};
use tsb_ts::index_map::UstrIndexMap;
use ustr::Ustr;

pub use error::Error;
type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumBinding {
    pub name: String,
    pub script_path: String,
    pub namespace: Vec<String>,
    pub native_name: String,
    pub source: PathBuf,
    pub values: Vec<(String, usize)>,
}

fn translate_enum(enm: &EnumSchema, source: PathBuf) -> EnumBinding {
    EnumBinding {
        name: enm.name.clone(),
        script_path: enm.script_path(),
        namespace: enm.namespace.clone(),
        native_name: enm.native_name(),
        source,
        values: enm.values().map(|(m, v)| (m.to_string(), v)).collect(),
    }
}

pub struct BindingModel {
    /// Keyed by script path
    pub classes: UstrIndexMap<ClassBinding, ClassBindingId>,
    pub enums: Vec<EnumBinding>,
    pub functions: Vec<FunctionBinding>,
    pub bridge: BridgeTree,
}

impl BindingModel {
    pub fn get_class(&self, script_path: &str) -> Option<&ClassBinding> {
        self.classes.get(&Ustr::from(script_path))
    }

    pub fn get_class_id(&self, script_path: &str) -> Option<ClassBindingId> {
        self.classes.get_id(&Ustr::from(script_path))
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.enums.is_empty() && self.functions.is_empty()
    }
}

impl Debug for BindingModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for class in self.classes.iter() {
            writeln!(f, "class {} -> {}", class.script_path, class.native_name)?;
        }

        for enm in self.enums.iter() {
            writeln!(f, "enum {} -> {}", enm.script_path, enm.native_name)?;
        }

        for fun in self.functions.iter() {
            writeln!(f, "function {} -> {}", fun.script_name, fun.native_name)?;
        }

        write!(f, "{:?}", self.bridge)
    }
}

/// Translate every class, enum and function in `schema`. Translation is pure: the same schema always yields the same
/// model.
#[instrument(level = "trace", skip(schema))]
pub fn translate(schema: &Schema) -> Result<BindingModel> {
    let names = NativeNames::new(schema);

    let mut classes = UstrIndexMap::new();
    let mut enums = Vec::new();
    let mut functions = Vec::new();
    let mut bridge = BridgeTree::new();

    for unit in &schema.units {
        for class in &unit.classes {
            let binding = translate_class(&names, class, unit.path.clone()).map_err(|e| Error::TranslateClass {
                name: class.script_path(),
                source: Box::new(e),
            })?;

            let key = Ustr::from(binding.script_path.as_str());
            if classes.contains(&key) {
                return Err(Error::DuplicateClass(binding.script_path));
            }
            classes.insert(key, binding);
        }

        for enm in &unit.enums {
            enums.push(translate_enum(enm, unit.path.clone()));
        }

        for function in &unit.functions {
            let binding = translate_function(&names, function, unit.path.clone()).map_err(|e| Error::TranslateFunction {
                name: function.name.clone(),
                source: Box::new(e),
            })?;
            bridge.insert(&binding.namespace, functions.len());
            functions.push(binding);
        }
    }

    debug!(
        "translated {} classes, {} enums, {} functions",
        classes.len(),
        enums.len(),
        functions.len()
    );

    Ok(BindingModel {
        classes,
        enums,
        functions,
        bridge,
    })
}
