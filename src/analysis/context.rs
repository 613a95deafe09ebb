//! Per-script analysis and batch processing.
//!
//! A script is parsed once; dependency extraction and the GNU flag check both
//! run over the same tree. Batches are analyzed in parallel with results kept
//! in input order, and one script failing never affects the others.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::debug;

use super::deps::extract_dependencies;
use super::gnu::{check_gnu_compatibility, Incompatibility};
use crate::error::AnalysisError;
use crate::parser::{self, Script, ShebangInfo};

/// Everything learned from one script.
#[derive(Debug, Clone)]
pub struct ScriptAnalysis {
    pub label: String,
    pub shebang: ShebangInfo,
    pub dependencies: Vec<String>,
    /// Empty when GNU checks are disabled.
    pub incompatibilities: Vec<Incompatibility>,
}

/// Outcome for one file of a batch.
#[derive(Debug)]
pub struct FileAnalysis {
    pub path: PathBuf,
    pub result: Result<ScriptAnalysis, AnalysisError>,
}

/// Analysis settings shared across a batch.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisContext {
    gnu_checks: bool,
}

impl Default for AnalysisContext {
    fn default() -> Self {
        Self { gnu_checks: true }
    }
}

impl AnalysisContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable the GNU-only flag check.
    pub fn with_gnu_checks(mut self, enabled: bool) -> Self {
        self.gnu_checks = enabled;
        self
    }

    pub fn gnu_checks(&self) -> bool {
        self.gnu_checks
    }

    pub fn analyze(&self, script: &Script) -> Result<ScriptAnalysis, AnalysisError> {
        let program = parser::parse(script)?;
        let dependencies = extract_dependencies(&program);
        let incompatibilities = if self.gnu_checks {
            check_gnu_compatibility(&program, script.label())
        } else {
            Vec::new()
        };
        debug!(
            script = script.label(),
            deps = dependencies.len(),
            gnu = incompatibilities.len(),
            "analyzed"
        );
        Ok(ScriptAnalysis {
            label: script.label().to_string(),
            shebang: script.shebang(),
            dependencies,
            incompatibilities,
        })
    }

    pub fn analyze_file(&self, path: &Path) -> Result<ScriptAnalysis, AnalysisError> {
        let script = Script::from_path(path)?;
        self.analyze(&script)
    }

    /// Analyze files in parallel; output order matches `paths`.
    pub fn analyze_files_parallel(&self, paths: &[PathBuf]) -> Vec<FileAnalysis> {
        paths
            .par_iter()
            .map(|path| FileAnalysis {
                path: path.clone(),
                result: self.analyze_file(path),
            })
            .collect()
    }
}

/// Parse a script and return its sorted external dependencies.
pub fn dependencies_of(script: &Script) -> Result<Vec<String>, AnalysisError> {
    let program = parser::parse(script)?;
    Ok(extract_dependencies(&program))
}
