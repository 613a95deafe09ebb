//! Finding candidate shell scripts in a directory tree.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::config::ScanOptions;
use crate::parser::is_shell_script;

/// Collect scripts under `root`, in sorted walk order.
///
/// Regular files and symlinks are candidates. A file is selected when its
/// shebang names a shell or its base name matches the match pattern.
pub fn collect_scripts(root: &Path, options: &ScanOptions) -> anyhow::Result<Vec<PathBuf>> {
    let meta = std::fs::metadata(root)
        .with_context(|| format!("cannot access {}", root.display()))?;
    if meta.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }

    let mut scripts = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        let file_type = entry.file_type();
        if !file_type.is_file() && !file_type.is_symlink() {
            continue;
        }
        if options.executable_only && !is_executable(&entry) {
            continue;
        }

        let path = entry.path();
        let matched_by_name = options
            .match_pattern
            .as_ref()
            .is_some_and(|re| re.is_match(&entry.file_name().to_string_lossy()));
        let selected = matched_by_name
            || match is_shell_script(path) {
                Ok(is_shell) => is_shell,
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "cannot classify");
                    false
                }
            };
        if selected {
            scripts.push(path.to_path_buf());
        }
    }
    Ok(scripts)
}

#[cfg(unix)]
fn is_executable(entry: &DirEntry) -> bool {
    use std::os::unix::fs::PermissionsExt;
    entry
        .metadata()
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(_entry: &DirEntry) -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("bin")).unwrap();
        fs::write(dir.path().join("bin/run"), "#!/bin/sh\necho hi\n").unwrap();
        fs::write(dir.path().join("bin/tool.py"), "#!/usr/bin/python3\n").unwrap();
        fs::write(dir.path().join("lib.sh"), "echo no shebang\n").unwrap();
        fs::write(dir.path().join("env.sh"), "#!/usr/bin/env bash\n").unwrap();
        dir
    }

    #[test]
    fn test_collect_by_shebang() {
        let dir = tree();
        let found = collect_scripts(dir.path(), &ScanOptions::default()).unwrap();
        let names: Vec<String> = found
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().display().to_string())
            .collect();
        assert_eq!(names, vec!["bin/run", "env.sh"]);
    }

    #[test]
    fn test_pattern_adds_to_shebang_detection() {
        let dir = tree();
        let opts = ScanOptions::new(Some(r"\.sh$"), false).unwrap();
        let found = collect_scripts(dir.path(), &opts).unwrap();
        let names: Vec<String> = found
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().display().to_string())
            .collect();
        assert_eq!(names, vec!["bin/run", "env.sh", "lib.sh"]);
    }

    #[test]
    fn test_pattern_matches_base_name_only() {
        let dir = tree();
        let opts = ScanOptions::new(Some(r"^bin"), false).unwrap();
        let found = collect_scripts(dir.path(), &opts).unwrap();
        assert!(!found.iter().any(|p| p.ends_with("bin/tool.py")));
        assert!(found.iter().any(|p| p.ends_with("bin/run")));
    }

    #[cfg(unix)]
    #[test]
    fn test_executable_only() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tree();
        fs::set_permissions(dir.path().join("bin/run"), fs::Permissions::from_mode(0o755))
            .unwrap();
        fs::set_permissions(dir.path().join("env.sh"), fs::Permissions::from_mode(0o644))
            .unwrap();
        let opts = ScanOptions::new(None, true).unwrap();
        let found = collect_scripts(dir.path(), &opts).unwrap();
        assert_eq!(found.len(), 1);
        assert!(found[0].ends_with("bin/run"));
    }

    #[test]
    fn test_missing_root_is_error() {
        let dir = TempDir::new().unwrap();
        assert!(collect_scripts(&dir.path().join("nope"), &ScanOptions::default()).is_err());
    }
}
