use std::path::PathBuf;

use crate::diagnostic::Diagnostic;
use crate::source::SourceMap;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Could not read declaration file \"{}\"", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{} parse error(s) in declaration files", diagnostics.len())]
    Parse {
        sources: Box<SourceMap>,
        diagnostics: Vec<Diagnostic>,
    },
}
