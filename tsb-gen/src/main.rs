use anyhow::{Context, Result};
use std::{
    fmt::Display,
    io::IsTerminal,
    path::{Path, PathBuf},
    time::Instant,
};

use tsb::*;

use clap::{Parser, ValueEnum};

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum Verbosity {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum GranularityArg {
    Class,
    File,
}

#[derive(Parser)]
#[clap(name = "tsb-gen", about = "Generate native script bindings from TypeScript declaration files")]
struct Args {
    /// Output directory for generated files
    #[clap(short, long, value_parser)]
    out_dir: PathBuf,

    /// Directory searched for .d.ts files
    #[clap(short, long, value_parser)]
    src_dir: PathBuf,

    /// Native namespace for files under a path, as a.b.c:path. The first match wins.
    #[clap(short, long, value_parser)]
    namespace: Vec<String>,

    /// Emit one file per class or one per declaration file
    #[clap(short, long, arg_enum, value_parser, default_value = "class")]
    granularity: GranularityArg,

    /// Verbosity of the output
    #[clap(short, long, arg_enum, value_parser)]
    verbosity: Option<Verbosity>,

    /// Write the extracted schema to this file as JSON
    #[clap(long, value_parser)]
    dump_schema: Option<PathBuf>,
}

impl Display for Verbosity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verbosity::Trace => {
                write!(f, "trace")
            }
            Verbosity::Debug => {
                write!(f, "debug")
            }
            Verbosity::Info => {
                write!(f, "info")
            }
            Verbosity::Warn => {
                write!(f, "warn")
            }
            Verbosity::Error => {
                write!(f, "error")
            }
        }
    }
}

impl From<GranularityArg> for Granularity {
    fn from(g: GranularityArg) -> Self {
        match g {
            GranularityArg::Class => Granularity::Class,
            GranularityArg::File => Granularity::File,
        }
    }
}

fn absolute(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

fn main() -> Result<()> {
    let start = Instant::now();
    let args = Args::parse();

    let filter = args.verbosity.unwrap_or(Verbosity::Warn).to_string();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&filter))
        .format_timestamp(None)
        .init();

    let cwd = std::env::current_dir().context("could not get the current directory")?;

    let mut namespaces = NamespaceMapping::new();
    for arg in &args.namespace {
        let mut entry: NamespaceEntry = arg.parse()?;
        entry.prefix = absolute(&cwd, &entry.prefix);
        namespaces.push(entry);
    }

    let options = BindgenOptions {
        src_dir: absolute(&cwd, &args.src_dir),
        out_dir: absolute(&cwd, &args.out_dir),
        namespaces,
        granularity: args.granularity.into(),
        dump_schema: args.dump_schema.map(|p| absolute(&cwd, &p)),
    };
    log::debug!("{options:?}");

    match generate(&options) {
        Ok(report) => {
            log::info!(
                "{} files updated, {} unchanged",
                report.written.len(),
                report.unchanged.len()
            );
        }
        Err(err) => {
            if let Some((sources, diagnostics)) = err.diagnostics() {
                let color = std::io::stderr().is_terminal();
                for diagnostic in diagnostics {
                    eprintln!("{}", diagnostic.render(sources, color));
                }
                eprintln!("{err}");
                std::process::exit(1);
            }
            return Err(err.into());
        }
    }

    println!("tsb-gen finished, duration: {}ms", start.elapsed().as_millis());

    Ok(())
}
