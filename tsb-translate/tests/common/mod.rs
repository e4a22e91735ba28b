#![allow(dead_code)]

use std::path::PathBuf;

use tsb_extract::{extract, Extraction, NamespaceMapping};
use tsb_ts::Program;

pub const FILE: &str = "/src/krit/test.d.ts";

pub fn mapping() -> NamespaceMapping {
    NamespaceMapping::new().with("krit", "/src/krit")
}

pub fn extract_sources(sources: &[(&str, &str)]) -> Result<(Program, Extraction), tsb_ts::Error> {
    let program = Program::from_sources(
        sources
            .iter()
            .map(|(path, text)| (PathBuf::from(*path), text.to_string()))
            .collect(),
    )?;
    let extraction = extract(&program, &mapping());
    Ok((program, extraction))
}

pub fn extract_str(src: &str) -> Result<(Program, Extraction), tsb_ts::Error> {
    extract_sources(&[(FILE, src)])
}

pub fn error_messages(extraction: &Extraction) -> Vec<String> {
    extraction.errors.iter().map(|e| e.to_string()).collect()
}

pub fn translate_str(src: &str) -> Result<tsb_translate::BindingModel, tsb_util::Error> {
    let (_, extraction) = extract_str(src)?;
    assert!(!extraction.has_errors(), "{:?}", error_messages(&extraction));
    Ok(tsb_translate::translate(&extraction.schema)?)
}
