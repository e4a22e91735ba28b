use std::path::PathBuf;

use tracing::instrument;
use tsb_extract::{FunctionSchema, ParamSchema, QualType};

use crate::dispatch::{call_expression, translate_params, ParamBinding};
use crate::error::Error;
use crate::native::NativeNames;

type Result<T, E = Error> = std::result::Result<T, E>;

/// A method, constructor or free function with its argument decoding and dispatch spelled out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallableBinding {
    pub name: String,
    pub params: Vec<ParamBinding>,
    pub required_args: usize,
    /// Dispatching call expression, selecting on `argc`
    pub call: String,
    pub returns_void: bool,
    /// Statements performing the call and returning its encoded result
    pub body: String,
}

pub(crate) fn translate_callable(
    names: &NativeNames,
    name: &str,
    callee: &str,
    params: &[ParamSchema],
    optional_args: usize,
    ret: &QualType,
) -> Result<CallableBinding> {
    let params = translate_params(names, params)?;
    let args: Vec<String> = params.iter().map(|p| p.decode.clone()).collect();
    let call = call_expression(callee, &args, optional_args);

    let returns_void = ret.is_void();
    let body = if returns_void {
        format!("{call};\nreturn JS_UNDEFINED;")
    } else {
        format!("return {};", names.encode(ret, &call)?)
    };

    Ok(CallableBinding {
        name: name.to_string(),
        required_args: required_args(&params, optional_args),
        params,
        call,
        returns_void,
        body,
    })
}

/// Trailing optionals and a rest parameter may both be absent from the call
fn required_args(params: &[ParamBinding], optional_args: usize) -> usize {
    let rest = params.last().map_or(0, |p| p.rest as usize);
    params.len().saturating_sub(optional_args + rest)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionBinding {
    pub name: String,
    /// Script namespace path, the function's place in the bridge tree
    pub namespace: Vec<String>,
    /// Flat name of the generated C entry point
    pub script_name: String,
    pub native_name: String,
    pub source: PathBuf,
    pub arity: usize,
    /// Implemented by hand on the runtime side; there is no native call to generate
    pub jsfunc: bool,
    pub callable: Option<CallableBinding>,
}

/// `Log_debug` for `Log.debug`. `$` isn't valid in native identifiers.
pub fn script_name(namespace: &[String], name: &str) -> String {
    namespace
        .iter()
        .map(|s| s.as_str())
        .chain(std::iter::once(name))
        .collect::<Vec<_>>()
        .join("_")
        .replace('$', "__dollar__")
}

#[instrument(level = "trace", skip(names, function), fields(name = %function.name))]
pub(crate) fn translate_function(
    names: &NativeNames,
    function: &FunctionSchema,
    source: PathBuf,
) -> Result<FunctionBinding> {
    let native_name = function.native_name();
    let callable = if function.jsfunc {
        None
    } else {
        Some(translate_callable(
            names,
            &function.name,
            &native_name,
            &function.params,
            function.optional_args,
            &function.ret,
        )?)
    };

    Ok(FunctionBinding {
        name: function.name.clone(),
        namespace: function.namespace.clone(),
        script_name: script_name(&function.namespace, &function.name),
        native_name,
        source,
        arity: function.params.len(),
        jsfunc: function.jsfunc,
        callable,
    })
}
