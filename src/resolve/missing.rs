//! Dependencies that nothing on the target system would satisfy.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

use super::provides::resolve_commands;

/// Dependencies not found on `search_path`, in input order.
///
/// An absolute dependency is missing iff the path does not exist. A bare name
/// is missing iff no directory holds an entry of that name.
pub fn find_missing_in_path<S: AsRef<str>>(deps: &[S], search_path: &[PathBuf]) -> Vec<String> {
    deps.iter()
        .map(|d| d.as_ref())
        .filter(|dep| {
            if dep.starts_with('/') {
                !Path::new(dep).exists()
            } else {
                !search_path.iter().any(|dir| dir.join(dep).exists())
            }
        })
        .map(str::to_string)
        .collect()
}

/// Dependencies not provided by any of `packages`, in input order.
pub fn find_missing_commands<S: AsRef<str>, P: AsRef<str>>(deps: &[S], packages: &[P]) -> Vec<String> {
    let available = resolve_commands(packages);
    deps.iter()
        .map(|d| d.as_ref())
        .filter(|dep| !available.contains(dep))
        .map(str::to_string)
        .collect()
}

/// Dependencies with no executable of that name anywhere under `root`.
///
/// Suited to an unpacked image filesystem: every executable file or symlink
/// is indexed by base name and by full path.
pub fn find_missing_in_tree<S: AsRef<str>>(deps: &[S], root: &Path) -> Vec<String> {
    let available = executables_under(root);
    deps.iter()
        .map(|d| d.as_ref())
        .filter(|dep| !available.contains(*dep))
        .map(str::to_string)
        .collect()
}

fn executables_under(root: &Path) -> HashSet<String> {
    let mut found = HashSet::new();
    for entry in WalkDir::new(root) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        let file_type = entry.file_type();
        let usable = if file_type.is_symlink() {
            // A link to a directory is not a command.
            !entry.path().is_dir()
        } else {
            file_type.is_file() && is_executable(&entry)
        };
        if !usable {
            continue;
        }
        found.insert(entry.file_name().to_string_lossy().into_owned());
        found.insert(entry.path().display().to_string());
    }
    found
}

#[cfg(unix)]
fn is_executable(entry: &walkdir::DirEntry) -> bool {
    use std::os::unix::fs::PermissionsExt;
    entry
        .metadata()
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(_entry: &walkdir::DirEntry) -> bool {
    true
}
