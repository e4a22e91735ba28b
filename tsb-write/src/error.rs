use std::path::PathBuf;

use tsb_util::Trace;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("class \"{class}\" extends \"{parent}\" which was not extracted")]
    UnknownParent { class: String, parent: String },
    #[error("class \"{name}\" not found in the binding model")]
    ClassNotFound { name: String, source: Trace },
    #[error("inheritance cycle involving class \"{0}\"")]
    InheritanceCycle(String),
    #[error("more than one artifact would be written to \"{}\"", .0.display())]
    DuplicateArtifact(PathBuf),
    #[error("Failed to write \"{}\"", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unknown granularity \"{0}\", expected \"class\" or \"file\"")]
    UnknownGranularity(String),
    #[error("String formatting error while generating")]
    FormatError(#[from] std::fmt::Error),
}
