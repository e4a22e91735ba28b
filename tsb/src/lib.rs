//! Runs the whole pipeline: discover declaration files, parse them, extract the schema, translate it and write the
//! bindings. Nothing is written unless every input extracted cleanly.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};
use tsb_extract::extract;
use tsb_translate::translate;
use tsb_ts::{Diagnostic, Program, SourceMap};
use tsb_write::{emit, EmitOptions};

pub use tsb_extract::{NamespaceEntry, NamespaceMapping, Schema};
pub use tsb_write::{CppRenderer, EmitReport, Granularity, Renderer};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Could not read source directory \"{}\"", path.display())]
    Discover {
        path: PathBuf,
        source: walkdir::Error,
    },
    #[error("Could not load declaration files")]
    Load(#[from] tsb_ts::Error),
    #[error("Binding generation failed: there were {} errors", diagnostics.len())]
    Extraction {
        sources: Box<SourceMap>,
        diagnostics: Vec<Diagnostic>,
    },
    #[error("Translation error")]
    Translate(#[from] tsb_translate::Error),
    #[error("Write error")]
    Write(#[from] tsb_write::Error),
    #[error("Could not write schema dump \"{}\"", path.display())]
    DumpSchema {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Could not serialize schema")]
    SerializeSchema(#[from] serde_json::Error),
}

impl Error {
    /// Source-located problems with the inputs, if that is what this error is
    pub fn diagnostics(&self) -> Option<(&SourceMap, &[Diagnostic])> {
        match self {
            Error::Extraction {
                sources,
                diagnostics,
            }
            | Error::Load(tsb_ts::Error::Parse {
                sources,
                diagnostics,
            }) => Some((sources.as_ref(), diagnostics.as_slice())),
            _ => None,
        }
    }
}

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone)]
pub struct BindgenOptions {
    pub src_dir: PathBuf,
    pub out_dir: PathBuf,
    pub namespaces: NamespaceMapping,
    pub granularity: Granularity,
    /// Also write the extracted schema here as JSON
    pub dump_schema: Option<PathBuf>,
}

/// Every `.d.ts` file under `src_dir`, skipping `node_modules`, in a stable order
#[instrument(level = "trace")]
pub fn discover(src_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    let walker = walkdir::WalkDir::new(src_dir)
        .into_iter()
        .filter_entry(|e| e.file_name() != "node_modules");

    for entry in walker {
        let entry = entry.map_err(|source| Error::Discover {
            path: src_dir.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() && entry.file_name().to_string_lossy().ends_with(".d.ts") {
            paths.push(entry.into_path());
        }
    }

    paths.sort();
    debug!("found {} declaration files under {}", paths.len(), src_dir.display());
    Ok(paths)
}

fn dump_schema(schema: &Schema, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(schema)?;
    std::fs::write(path, json).map_err(|source| Error::DumpSchema {
        path: path.to_path_buf(),
        source,
    })?;
    info!("wrote schema to {}", path.display());
    Ok(())
}

/// Generate bindings with the built-in C++ renderer
pub fn generate(options: &BindgenOptions) -> Result<EmitReport> {
    generate_with(options, &CppRenderer)
}

#[instrument(level = "trace", skip(renderer))]
pub fn generate_with(options: &BindgenOptions, renderer: &dyn Renderer) -> Result<EmitReport> {
    let paths = discover(&options.src_dir)?;
    let program = Program::load(&paths)?;

    let extraction = extract(&program, &options.namespaces);
    if let Some(path) = &options.dump_schema {
        dump_schema(&extraction.schema, path)?;
    }

    if extraction.has_errors() {
        return Err(Error::Extraction {
            sources: Box::new(program.sources().clone()),
            diagnostics: extraction.errors.iter().map(|e| e.to_diagnostic()).collect(),
        });
    }

    let model = translate(&extraction.schema)?;
    let report = emit(
        &model,
        renderer,
        &EmitOptions {
            src_dir: options.src_dir.clone(),
            out_dir: options.out_dir.clone(),
            granularity: options.granularity,
        },
    )?;

    debug!(
        "{} files written, {} unchanged",
        report.written.len(),
        report.unchanged.len()
    );
    Ok(report)
}
