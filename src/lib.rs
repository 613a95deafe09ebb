//! shelldeps - static analysis of shell scripts.
//!
//! Finds the external commands a POSIX/bash/dash script may invoke and the
//! options it passes that only GNU coreutils understands, then checks both
//! against a target system described by a search path or a package list.
//!
//! # Architecture
//!
//! - `parser`: tree-sitter bash parsing lowered into an owned AST, plus a visitor
//! - `analysis`: builtin table, dependency extractor, GNU flag rules and checker
//! - `resolve`: provider (busybox/coreutils) and missing-dependency resolution
//! - `package`: installed files and runtime deps from apk or melange recipes
//! - `scan`: candidate script discovery in a directory tree
//! - `report`: output formatting (text, JSON)
//!
//! # Example
//!
//! ```
//! use shelldeps::{dependencies_of, Script};
//!
//! let script = Script::new("demo.sh", "#!/bin/sh\ngrep x f | awk '{print $1}'\n");
//! assert_eq!(dependencies_of(&script).unwrap(), vec!["awk", "grep"]);
//! ```

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod package;
pub mod parser;
pub mod report;
pub mod resolve;
pub mod scan;

pub use analysis::{
    check_gnu_compatibility, dependencies_of, extract_dependencies, AnalysisContext,
    Incompatibility, ScriptAnalysis,
};
pub use error::{AnalysisError, ParseError};
pub use parser::{parse, Program, Script, ShebangInfo};
pub use resolve::{
    filter_by_provider, find_missing_commands, find_missing_in_path, has_gnu_coreutils,
    resolve_provider, Provider, ProviderInfo,
};
