//! Melange build recipes, used when `apk` cannot answer.
//!
//! Only the fields needed to find a package's runtime dependencies are
//! modelled; everything else in the recipe is ignored.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;
use walkdir::WalkDir;

use super::PackageError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MelangeConfig {
    #[serde(default)]
    pub package: PackageSection,
    #[serde(default)]
    pub subpackages: Vec<PackageSection>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageSection {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub dependencies: Dependencies,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Dependencies {
    #[serde(default)]
    pub runtime: Vec<String>,
}

impl MelangeConfig {
    pub fn parse(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    pub fn from_path(path: &Path) -> Result<Self, PackageError> {
        let content = fs::read_to_string(path).map_err(|source| PackageError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|source| PackageError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Subpackage names with `${{package.name}}` substituted.
    pub fn subpackage_names(&self) -> impl Iterator<Item = String> + '_ {
        self.subpackages
            .iter()
            .map(|s| expand_package_vars(&s.name, &self.package.name))
    }

    /// True if the recipe builds `name`, as the main package or a subpackage.
    pub fn builds(&self, name: &str) -> bool {
        self.package.name == name || self.subpackage_names().any(|s| s == name)
    }

    /// Declared runtime dependencies of `target`.
    ///
    /// A matching subpackage with its own runtime list wins; otherwise the
    /// main package's list is used when the main package is the target.
    pub fn runtime_deps_for(&self, target: &str) -> Vec<String> {
        let sub = self
            .subpackages
            .iter()
            .find(|s| expand_package_vars(&s.name, &self.package.name) == target)
            .map(|s| s.dependencies.runtime.clone())
            .unwrap_or_default();
        if sub.is_empty() && self.package.name == target {
            return self.package.dependencies.runtime.clone();
        }
        sub
    }
}

pub fn expand_package_vars(s: &str, package_name: &str) -> String {
    s.replace("${{package.name}}", package_name)
}

/// Locate the recipe that builds `name` under `package_dir`.
///
/// Direct `<name>.yaml`/`<name>.yml` files in the directory and its
/// `enterprise-packages` and `os` subdirectories are tried first; then every
/// YAML file below the directory is parsed and checked.
pub fn find_package_yaml(package_dir: &Path, name: &str) -> Result<PathBuf, PackageError> {
    let search_dirs = [
        package_dir.to_path_buf(),
        package_dir.join("enterprise-packages"),
        package_dir.join("os"),
    ];
    for dir in &search_dirs {
        for ext in ["yaml", "yml"] {
            let path = dir.join(format!("{name}.{ext}"));
            if path.is_file() {
                return Ok(path);
            }
        }
    }

    for entry in WalkDir::new(package_dir).into_iter().filter_map(Result::ok) {
        let path = entry.path();
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml" | "yml")
        );
        if !entry.file_type().is_file() || !is_yaml {
            continue;
        }
        let Ok(content) = fs::read_to_string(path) else {
            continue;
        };
        match MelangeConfig::parse(&content) {
            Ok(config) if config.builds(name) => return Ok(path.to_path_buf()),
            Ok(_) => {}
            Err(e) => debug!(path = %path.display(), error = %e, "not a melange recipe"),
        }
    }

    Err(PackageError::NotFound {
        package: name.to_string(),
        dir: package_dir.to_path_buf(),
    })
}
