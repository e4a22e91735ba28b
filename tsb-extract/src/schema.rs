use std::path::PathBuf;

use serde::Serialize;
use tsb_ts::FileId;

use crate::class::ClassSchema;
use crate::enm::EnumSchema;
use crate::function::FunctionSchema;

/// Everything extracted from one declaration file, in declaration order
#[derive(Debug, Clone, Serialize)]
pub struct SchemaUnit {
    #[serde(skip)]
    pub file: FileId,
    pub path: PathBuf,
    pub classes: Vec<ClassSchema>,
    pub enums: Vec<EnumSchema>,
    pub functions: Vec<FunctionSchema>,
}

impl SchemaUnit {
    pub fn new(file: FileId, path: PathBuf) -> SchemaUnit {
        SchemaUnit {
            file,
            path,
            classes: Vec::new(),
            enums: Vec::new(),
            functions: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.enums.is_empty() && self.functions.is_empty()
    }
}

/// The schema of a whole run, one unit per input file in input order
#[derive(Debug, Clone, Default, Serialize)]
pub struct Schema {
    pub units: Vec<SchemaUnit>,
}

impl Schema {
    pub fn classes(&self) -> impl Iterator<Item = &ClassSchema> {
        self.units.iter().flat_map(|u| u.classes.iter())
    }

    pub fn enums(&self) -> impl Iterator<Item = &EnumSchema> {
        self.units.iter().flat_map(|u| u.enums.iter())
    }

    pub fn functions(&self) -> impl Iterator<Item = &FunctionSchema> {
        self.units.iter().flat_map(|u| u.functions.iter())
    }

    pub fn find_class(&self, namespace: &[String], name: &str) -> Option<&ClassSchema> {
        self.classes()
            .find(|c| c.name == name && c.namespace == namespace)
    }

    pub fn find_enum(&self, namespace: &[String], name: &str) -> Option<&EnumSchema> {
        self.enums().find(|e| e.name == name && e.namespace == namespace)
    }
}
