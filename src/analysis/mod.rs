//! Static analysis over the shell syntax tree.
//!
//! - `builtins`: names the shell implements itself
//! - `deps`: external command dependency extraction
//! - `gnu`: GNU coreutils-only flag rules and checker
//! - `context`: per-script orchestration and parallel batches

pub mod builtins;
pub mod context;
pub mod deps;
pub mod gnu;

pub use builtins::is_builtin;
pub use context::{dependencies_of, AnalysisContext, FileAnalysis, ScriptAnalysis};
pub use deps::{extract_dependencies, ScriptSymbols};
pub use gnu::{
    check_gnu_compatibility, format_incompatibilities, matches_flag, needs_gnu_coreutils,
    GnuFlagRule, Incompatibility, GNU_FLAG_RULES,
};
