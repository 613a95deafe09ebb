//! Package metadata: installed files and declared runtime dependencies.
//!
//! The `apk` package manager is queried first. When it cannot answer (not
//! installed, package unknown to the local index) runtime dependencies fall
//! back to the melange recipe that builds the package.

pub mod melange;

use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::{debug, warn};

pub use melange::{find_package_yaml, MelangeConfig};

/// Errors from package metadata lookups.
#[derive(Error, Debug)]
pub enum PackageError {
    #[error("`{command}` failed: {message}")]
    Command { command: String, message: String },
    #[error("package {package} not found in {}", dir.display())]
    NotFound { package: String, dir: PathBuf },
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid recipe {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("no metadata for {package}: apk: {apk}; recipe: {recipe}")]
    NoMetadata {
        package: String,
        apk: Box<PackageError>,
        recipe: Box<PackageError>,
    },
}

/// A package's declared runtime dependencies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeDeps {
    pub names: Vec<String>,
    pub has_busybox: bool,
    pub has_coreutils: bool,
}

impl RuntimeDeps {
    /// Names like `busybox-full` or `coreutils-9.5` count as their base package.
    pub fn from_names(names: Vec<String>) -> Self {
        let provides = |base: &str| {
            names.iter().any(|n| {
                let n = n.to_lowercase();
                n == base || n.starts_with(&format!("{base}-"))
            })
        };
        let has_busybox = provides("busybox");
        let has_coreutils = provides("coreutils");
        Self {
            names,
            has_busybox,
            has_coreutils,
        }
    }

    /// GNU-only flags matter only when BusyBox would serve the commands.
    pub fn needs_gnu_check(&self) -> bool {
        self.has_busybox && !self.has_coreutils
    }
}

/// Source of package metadata.
pub trait PackageSource {
    /// Absolute paths of every file the package installs.
    fn installed_files(&self, package: &str) -> Result<Vec<PathBuf>, PackageError>;

    fn runtime_deps(&self, package: &str) -> Result<RuntimeDeps, PackageError>;
}

/// Queries the local `apk` database, with a melange recipe fallback.
#[derive(Debug, Clone)]
pub struct ApkSource {
    package_dir: PathBuf,
}

impl ApkSource {
    /// `package_dir` is where melange recipes are searched.
    pub fn new(package_dir: impl Into<PathBuf>) -> Self {
        Self {
            package_dir: package_dir.into(),
        }
    }

    pub fn package_dir(&self) -> &Path {
        &self.package_dir
    }

    fn recipe_deps(&self, package: &str) -> Result<RuntimeDeps, PackageError> {
        let path = find_package_yaml(&self.package_dir, package)?;
        debug!(path = %path.display(), "using melange recipe");
        let config = MelangeConfig::from_path(&path)?;
        Ok(RuntimeDeps::from_names(config.runtime_deps_for(package)))
    }
}

impl PackageSource for ApkSource {
    fn installed_files(&self, package: &str) -> Result<Vec<PathBuf>, PackageError> {
        let output = run_apk(&["info", "-L", package])?;
        Ok(parse_file_list(&output))
    }

    fn runtime_deps(&self, package: &str) -> Result<RuntimeDeps, PackageError> {
        match run_apk(&["info", "-R", package]) {
            Ok(output) => Ok(RuntimeDeps::from_names(parse_depends(&output))),
            Err(apk) => {
                warn!(error = %apk, "apk lookup failed, trying melange recipe");
                self.recipe_deps(package)
                    .map_err(|recipe| PackageError::NoMetadata {
                        package: package.to_string(),
                        apk: Box::new(apk),
                        recipe: Box::new(recipe),
                    })
            }
        }
    }
}

fn run_apk(args: &[&str]) -> Result<String, PackageError> {
    let command = format!("apk {}", args.join(" "));
    let output = Command::new("apk")
        .args(args)
        .output()
        .map_err(|e| PackageError::Command {
            command: command.clone(),
            message: e.to_string(),
        })?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(PackageError::Command {
            command,
            message: format!("{} ({})", output.status, stderr.trim()),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Parse `apk info -L` output.
///
/// The first line is a `<pkg>-<ver> contains:` header; remaining entries are
/// paths relative to `/`.
pub fn parse_file_list(output: &str) -> Vec<PathBuf> {
    output
        .lines()
        .skip(1)
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| {
            if l.starts_with('/') {
                PathBuf::from(l)
            } else {
                PathBuf::from(format!("/{l}"))
            }
        })
        .collect()
}

/// Parse `apk info -R` output, keeping only the first version's block.
///
/// Shared-object requirements (`so:...`) are dropped.
pub fn parse_depends(output: &str) -> Vec<String> {
    output
        .lines()
        .skip(1)
        .map(str::trim)
        .take_while(|l| !l.is_empty() && !l.contains("depends on:"))
        .filter(|l| !l.starts_with("so:"))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_file_list() {
        let output = "foo-1.0-r0 contains:\nusr/bin/foo\nusr/libexec/foo/run.sh\n\n";
        assert_eq!(
            parse_file_list(output),
            vec![
                PathBuf::from("/usr/bin/foo"),
                PathBuf::from("/usr/libexec/foo/run.sh")
            ]
        );
    }

    #[test]
    fn test_parse_depends_first_block_only() {
        let output = "foo-1.0-r0 depends on:\nbusybox\nso:libc.so.6\njq\n\nfoo-0.9-r0 depends on:\nbash\n";
        assert_eq!(parse_depends(output), vec!["busybox", "jq"]);
    }

    #[test]
    fn test_parse_depends_stops_at_next_header() {
        let output = "foo-1.0 depends on:\ncurl\nfoo-0.9 depends on:\nbash\n";
        assert_eq!(parse_depends(output), vec!["curl"]);
    }

    #[test]
    fn test_runtime_deps_flags() {
        let deps = RuntimeDeps::from_names(vec!["busybox-full".into(), "jq".into()]);
        assert!(deps.has_busybox);
        assert!(!deps.has_coreutils);
        assert!(deps.needs_gnu_check());

        let deps = RuntimeDeps::from_names(vec!["busybox".into(), "coreutils-9.5".into()]);
        assert!(deps.has_coreutils);
        assert!(!deps.needs_gnu_check());

        let deps = RuntimeDeps::from_names(vec!["busyboxy".into()]);
        assert!(!deps.has_busybox);
    }

    #[test]
    fn test_recipe_fallback() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("tool.yaml"),
            "package:\n  name: tool\n  dependencies:\n    runtime:\n      - busybox\n",
        )
        .unwrap();
        let source = ApkSource::new(dir.path());
        let deps = source.recipe_deps("tool").unwrap();
        assert_eq!(deps.names, vec!["busybox"]);
        assert!(deps.has_busybox);
    }
}
