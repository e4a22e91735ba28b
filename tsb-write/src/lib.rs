//! Writes a [`BindingModel`](tsb_translate::BindingModel) out as native glue code.

pub mod cpp;
pub mod emit;
pub mod error;
pub mod order;
pub mod render;

pub use cpp::CppRenderer;
pub use emit::{emit, render_artifacts, write_artifacts, Artifact, EmitOptions, EmitReport, Granularity};
pub use error::Error;
pub use order::sort_classes;
pub use render::{RenderContext, Renderer, Template};
