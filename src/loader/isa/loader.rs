//! Loading pipeline that reads a description file, parses it, and builds an instruction table.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::isa::ast::IsaDocument;
use crate::isa::error::IsaError;
use crate::isa::modifier::ModifierCatalog;
use crate::isa::table::InstructionTable;
use crate::loader::isa::parse_str;

/// Loads `.isa` documents against one modifier catalog.
pub struct IsaLoader {
    catalog: ModifierCatalog,
}

impl Default for IsaLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl IsaLoader {
    /// Loader using [`ModifierCatalog::standard`].
    pub fn new() -> Self {
        Self::with_catalog(ModifierCatalog::standard())
    }

    pub fn with_catalog(catalog: ModifierCatalog) -> Self {
        Self { catalog }
    }

    pub fn load_document<P: AsRef<Path>>(&self, path: P) -> Result<IsaDocument, IsaError> {
        let path = path.as_ref();
        let src = fs::read_to_string(path)?;
        debug!(path = %path.display(), bytes = src.len(), "read isa document");
        parse_str(path.to_path_buf(), &src)
    }

    pub fn load_table<P: AsRef<Path>>(&self, path: P) -> Result<InstructionTable, IsaError> {
        let doc = self.load_document(path)?;
        InstructionTable::from_document(&doc, &self.catalog)
    }

    /// Builds a table from in-memory source; `path` only labels diagnostics.
    pub fn load_str<P: Into<PathBuf>>(&self, path: P, src: &str) -> Result<InstructionTable, IsaError> {
        let doc = parse_str(path.into(), src)?;
        InstructionTable::from_document(&doc, &self.catalog)
    }
}
