//! The emission driver. Every artifact is rendered in memory first; only then are they compared with what is on disk
//! and written where the bytes differ.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use hashbrown::HashSet;
use tracing::{debug, info, instrument};
use tsb_translate::class::ClassBinding;
use tsb_translate::BindingModel;

use crate::error::Error;
use crate::order::sort_classes;
use crate::render::{RenderContext, Renderer, Template};

type Result<T, E = Error> = std::result::Result<T, E>;

/// How class registration code is split into files
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum Granularity {
    /// `ScriptClass.<ns…>.<Name>.cpp` per class
    #[default]
    Class,
    /// `<relative/path>.ScriptClass.cpp` per declaration file
    File,
}

impl FromStr for Granularity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "class" => Ok(Granularity::Class),
            "file" => Ok(Granularity::File),
            _ => Err(Error::UnknownGranularity(s.to_string())),
        }
    }
}

impl Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Granularity::Class => write!(f, "class"),
            Granularity::File => write!(f, "file"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EmitOptions {
    pub src_dir: PathBuf,
    pub out_dir: PathBuf,
    pub granularity: Granularity,
}

/// A rendered output file, its path relative to the output directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub contents: String,
}

/// What a run did to the output directory
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EmitReport {
    pub written: Vec<PathBuf>,
    pub unchanged: Vec<PathBuf>,
}

/// Path of `source` relative to `src_dir` with the `.d.ts` suffix removed
fn source_stem(source: &Path, src_dir: &Path) -> String {
    let rel = source
        .strip_prefix(src_dir)
        .ok()
        .or_else(|| source.file_name().map(Path::new))
        .unwrap_or(source);
    let rel = rel.to_string_lossy().replace('\\', "/");
    match rel.strip_suffix(".d.ts") {
        Some(stem) => stem.to_string(),
        None => rel,
    }
}

/// The native header declaring what `source` describes
fn header_for(source: &Path, src_dir: &Path) -> PathBuf {
    PathBuf::from(format!("{}.h", source_stem(source, src_dir)))
}

fn push_unique(includes: &mut Vec<PathBuf>, include: PathBuf) {
    if !includes.contains(&include) {
        includes.push(include);
    }
}

fn class_includes<'a>(classes: impl IntoIterator<Item = &'a ClassBinding>, src_dir: &Path) -> Vec<PathBuf> {
    let mut includes = Vec::new();
    for class in classes {
        push_unique(&mut includes, header_for(&class.source, src_dir));
        for import in &class.imports {
            push_unique(&mut includes, PathBuf::from(import));
        }
    }
    includes
}

/// Render every artifact for `model` without touching the filesystem
#[instrument(level = "trace", skip(model, renderer))]
pub fn render_artifacts(
    model: &BindingModel,
    renderer: &dyn Renderer,
    options: &EmitOptions,
) -> Result<Vec<Artifact>> {
    let src_dir = options.src_dir.as_path();
    let order = sort_classes(model)?;
    let classes: Vec<&ClassBinding> = order.iter().map(|id| &model.classes[*id]).collect();

    let mut artifacts = Vec::new();
    let mut render = |path: PathBuf, template: Template, classes: Vec<&ClassBinding>, includes: Vec<PathBuf>| {
        let ctx = RenderContext {
            model,
            classes,
            includes,
        };
        debug!("rendering {} to {}", template.name(), path.display());
        renderer.render(template, &ctx).map(|contents| {
            artifacts.push(Artifact { path, contents });
        })
    };

    match options.granularity {
        Granularity::Class => {
            for class in &classes {
                render(
                    PathBuf::from(format!("ScriptClass.{}.cpp", class.script_path)),
                    Template::ClassUnit,
                    vec![*class],
                    class_includes([*class], src_dir),
                )?;
            }
        }
        Granularity::File => {
            let mut by_file: BTreeMap<&Path, Vec<&ClassBinding>> = BTreeMap::new();
            for class in &classes {
                by_file.entry(class.source.as_path()).or_default().push(*class);
            }
            for (source, file_classes) in by_file {
                let includes = class_includes(file_classes.iter().copied(), src_dir);
                render(
                    PathBuf::from(format!("{}.ScriptClass.cpp", source_stem(source, src_dir))),
                    Template::ClassUnit,
                    file_classes,
                    includes,
                )?;
            }
        }
    }

    render(
        PathBuf::from(Template::ClassRegistry.name()),
        Template::ClassRegistry,
        classes.clone(),
        class_includes(classes.iter().copied(), src_dir),
    )?;

    let mut enum_includes = Vec::new();
    for enm in &model.enums {
        push_unique(&mut enum_includes, header_for(&enm.source, src_dir));
    }
    render(
        PathBuf::from(Template::Enums.name()),
        Template::Enums,
        Vec::new(),
        enum_includes,
    )?;

    render(
        PathBuf::from(Template::BridgeHeader.name()),
        Template::BridgeHeader,
        Vec::new(),
        Vec::new(),
    )?;

    let mut bridge_includes = Vec::new();
    for f in &model.functions {
        push_unique(&mut bridge_includes, header_for(&f.source, src_dir));
    }
    render(
        PathBuf::from(Template::BridgeSource.name()),
        Template::BridgeSource,
        Vec::new(),
        bridge_includes,
    )?;

    let mut seen = HashSet::new();
    for artifact in &artifacts {
        if !seen.insert(artifact.path.clone()) {
            return Err(Error::DuplicateArtifact(artifact.path.clone()));
        }
    }

    Ok(artifacts)
}

/// Write each artifact under `out_dir` unless the file already holds exactly its contents
#[instrument(level = "trace", skip(artifacts))]
pub fn write_artifacts(out_dir: &Path, artifacts: &[Artifact]) -> Result<EmitReport> {
    let mut report = EmitReport::default();

    for artifact in artifacts {
        let path = out_dir.join(&artifact.path);

        if let Ok(existing) = std::fs::read(&path) {
            if existing == artifact.contents.as_bytes() {
                debug!("{} is unchanged", path.display());
                report.unchanged.push(path);
                continue;
            }
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| Error::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        info!("updating {}...", path.display());
        std::fs::write(&path, &artifact.contents).map_err(|source| Error::Io {
            path: path.clone(),
            source,
        })?;
        report.written.push(path);
    }

    Ok(report)
}

/// Render and write the whole model
pub fn emit(model: &BindingModel, renderer: &dyn Renderer, options: &EmitOptions) -> Result<EmitReport> {
    let artifacts = render_artifacts(model, renderer, options)?;
    write_artifacts(&options.out_dir, &artifacts)
}
