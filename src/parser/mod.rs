//! Shell script parsing.
//!
//! - `ast`: owned syntax tree (statements, calls, words and word parts)
//! - `treesitter`: bash grammar parsing and lowering into `ast`
//! - `walk`: generic pre-order visitor over the tree
//! - `shebang`: interpreter line handling

pub mod ast;
pub mod shebang;
pub mod treesitter;
pub mod walk;

use std::fs;
use std::path::Path;

pub use ast::{CallExpr, Command, FuncDecl, Pos, Program, Stmt, Word, WordPart};
pub use shebang::{extract_shebang, is_shell_script, shebang_program, ShebangInfo};
pub use walk::{walk, Node};

use crate::error::AnalysisError;

/// Script text plus a label used in diagnostics.
#[derive(Debug, Clone)]
pub struct Script {
    label: String,
    text: String,
}

impl Script {
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
        }
    }

    /// Read a script from disk; invalid UTF-8 is replaced rather than rejected.
    pub fn from_path(path: &Path) -> Result<Self, AnalysisError> {
        let bytes = fs::read(path).map_err(|source| AnalysisError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(
            path.display().to_string(),
            String::from_utf8_lossy(&bytes).into_owned(),
        ))
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn shebang(&self) -> ShebangInfo {
        ShebangInfo::from_source(&self.text)
    }
}

/// Parse a script into its syntax tree.
pub fn parse(script: &Script) -> Result<Program, AnalysisError> {
    treesitter::parse(script.text(), script.label())
}
