//! Declaration-file front end for the binding generator.
//!
//! Parses `.d.ts` files, lowers them into an owned declaration tree and answers the symbol and type questions the
//! extractor needs through the [`Oracle`] trait.

pub mod decl;
pub mod diagnostic;
pub mod error;
pub mod index_map;
mod lower;
pub mod oracle;
pub mod program;
pub mod source;

pub use decl::*;
pub use diagnostic::Diagnostic;
pub use error::Error;
pub use oracle::{Oracle, ResolvedType, Scope, Symbol, SymbolKind};
pub use program::{ParsedFile, Program, MAX_ALIAS_DEPTH};
pub use source::{FileId, SourceFile, SourceMap, Span};
