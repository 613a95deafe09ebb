//! Error types for script analysis.

use std::path::PathBuf;

use thiserror::Error;

/// A shell syntax error, positioned at the first bad node.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{label}:{line}:{column}: {message}")]
pub struct ParseError {
    pub label: String,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

/// Errors that can occur while analyzing a single script.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("incompatible shell grammar: {0}")]
    Language(#[from] tree_sitter::LanguageError),
    #[error("parser produced no tree")]
    NoTree,
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
