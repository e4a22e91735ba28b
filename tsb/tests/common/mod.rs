#![allow(dead_code)]

use std::path::Path;

use tsb::{BindgenOptions, Granularity, NamespaceMapping};

/// Write `files` (relative path, contents) under `dir`
pub fn write_sources(dir: &Path, files: &[(&str, &str)]) -> std::io::Result<()> {
    for (path, text) in files {
        let path = dir.join(path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, text)?;
    }
    Ok(())
}

pub fn options(src_dir: &Path, out_dir: &Path) -> BindgenOptions {
    BindgenOptions {
        src_dir: src_dir.to_path_buf(),
        out_dir: out_dir.to_path_buf(),
        namespaces: NamespaceMapping::new().with("krit", src_dir),
        granularity: Granularity::Class,
        dump_schema: None,
    }
}
