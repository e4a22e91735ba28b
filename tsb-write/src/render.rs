use std::path::PathBuf;

use tsb_translate::class::ClassBinding;
use tsb_translate::BindingModel;

use crate::error::Error;

type Result<T, E = Error> = std::result::Result<T, E>;

/// The named templates an emission run renders
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Template {
    /// Registration code for a group of classes
    ClassUnit,
    /// Class ids, value converters and the registration entry point
    ClassRegistry,
    /// Enum mirrors
    Enums,
    BridgeHeader,
    /// Free functions and the namespace tree that registers them
    BridgeSource,
}

impl Template {
    pub fn name(&self) -> &'static str {
        match self {
            Template::ClassUnit => "ScriptClass.cpp",
            Template::ClassRegistry => "ScriptClass.h",
            Template::Enums => "ScriptEnums.cpp",
            Template::BridgeHeader => "ScriptBridge.h",
            Template::BridgeSource => "ScriptBridge.cpp",
        }
    }
}

/// Data a template is rendered against
pub struct RenderContext<'a> {
    pub model: &'a BindingModel,
    /// The classes this artifact covers, parents before children. For the registry this is every class.
    pub classes: Vec<&'a ClassBinding>,
    /// Native headers to include, relative to the source directory
    pub includes: Vec<PathBuf>,
}

/// Turns a template and its data into text. Rendering must not touch the filesystem.
pub trait Renderer {
    fn render(&self, template: Template, ctx: &RenderContext) -> Result<String>;
}
