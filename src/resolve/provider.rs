//! Which implementation backs a command: BusyBox or GNU coreutils.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::analysis::gnu::Incompatibility;

/// The implementation a command name resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Busybox,
    Coreutils,
    Unknown,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Busybox => "busybox",
            Provider::Coreutils => "coreutils",
            Provider::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderInfo {
    pub command: String,
    /// The entry found on the search path, or its symlink target.
    pub resolved_path: String,
    pub provider: Provider,
}

impl ProviderInfo {
    fn unknown(command: &str) -> Self {
        Self {
            command: command.to_string(),
            resolved_path: String::new(),
            provider: Provider::Unknown,
        }
    }
}

/// Resolve `command` against `search_path` with PATH precedence.
///
/// Only the first directory holding an entry of that name is consulted.
/// Symlinks are classified by their target: anything naming busybox is
/// BusyBox, anything naming coreutils is coreutils. A regular file is assumed
/// to be a full-featured (coreutils) binary. Broken links are unknown.
#[cfg(unix)]
pub fn resolve_provider(command: &str, search_path: &[PathBuf]) -> ProviderInfo {
    for dir in search_path {
        let candidate = dir.join(command);
        let Ok(meta) = fs::symlink_metadata(&candidate) else {
            continue;
        };

        if meta.file_type().is_symlink() {
            return classify_symlink(command, dir, &candidate);
        }
        if meta.is_file() {
            return ProviderInfo {
                command: command.to_string(),
                resolved_path: candidate.display().to_string(),
                provider: Provider::Coreutils,
            };
        }
    }
    ProviderInfo::unknown(command)
}

/// Symlinks are not inspected on this platform.
#[cfg(not(unix))]
pub fn resolve_provider(command: &str, _search_path: &[PathBuf]) -> ProviderInfo {
    ProviderInfo::unknown(command)
}

#[cfg(unix)]
fn classify_symlink(command: &str, dir: &Path, link: &Path) -> ProviderInfo {
    let Ok(target) = fs::read_link(link) else {
        return ProviderInfo::unknown(command);
    };
    let target = if target.is_absolute() {
        target
    } else {
        dir.join(target)
    };

    let info = |path: &Path, provider| ProviderInfo {
        command: command.to_string(),
        resolved_path: path.display().to_string(),
        provider,
    };

    if base_name(&target).contains("busybox") {
        return info(&target, Provider::Busybox);
    }
    if target.to_string_lossy().contains("coreutils") {
        return info(&target, Provider::Coreutils);
    }

    // Chains like realpath -> ../lib/alt/realpath -> /bin/busybox.
    match fs::canonicalize(link) {
        Ok(real) if base_name(&real).contains("busybox") => info(&real, Provider::Busybox),
        Ok(real) if real.is_file() => info(&real, Provider::Coreutils),
        _ => info(&target, Provider::Unknown),
    }
}

#[cfg(unix)]
fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Drop findings for commands that resolve to coreutils on `search_path`.
///
/// With an empty search path there is nothing to resolve against and the
/// input is returned unchanged. Each distinct command is resolved once.
pub fn filter_by_provider(
    incompatibilities: Vec<Incompatibility>,
    search_path: &[PathBuf],
) -> Vec<Incompatibility> {
    if search_path.is_empty() {
        return incompatibilities;
    }

    let mut providers: HashMap<String, Provider> = HashMap::new();
    incompatibilities
        .into_iter()
        .filter(|inc| {
            let provider = *providers.entry(inc.command.clone()).or_insert_with(|| {
                let info = resolve_provider(&inc.command, search_path);
                debug!(
                    command = %info.command,
                    provider = %info.provider,
                    path = %info.resolved_path,
                    "resolved provider"
                );
                info.provider
            });
            provider != Provider::Coreutils
        })
        .collect()
}

/// True iff the package list names `coreutils` exactly.
///
/// Used for package-declared runs, where there is no per-binary provenance:
/// a true result suppresses every GNU-only finding for the run.
pub fn has_gnu_coreutils<S: AsRef<str>>(packages: &[S]) -> bool {
    packages.iter().any(|p| p.as_ref() == "coreutils")
}
