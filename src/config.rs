//! Run configuration assembled from command-line values.

use std::env;
use std::path::PathBuf;

use regex::Regex;

/// Split a PATH-style string into directories, dropping empty entries.
pub fn parse_search_path(value: &str) -> Vec<PathBuf> {
    env::split_paths(value)
        .filter(|p| !p.as_os_str().is_empty())
        .collect()
}

/// Split a comma separated package list, trimming blanks.
pub fn parse_package_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// How candidate scripts are picked out of a directory tree.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Base names that count as scripts even without a shell shebang.
    pub match_pattern: Option<Regex>,
    /// Only consider files with an execute bit.
    pub executable_only: bool,
}

impl ScanOptions {
    pub fn new(match_pattern: Option<&str>, executable_only: bool) -> Result<Self, regex::Error> {
        let match_pattern = match_pattern.map(Regex::new).transpose()?;
        Ok(Self {
            match_pattern,
            executable_only,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search_path() {
        assert_eq!(
            parse_search_path("/usr/bin::/bin"),
            vec![PathBuf::from("/usr/bin"), PathBuf::from("/bin")]
        );
        assert!(parse_search_path("").is_empty());
    }

    #[test]
    fn test_parse_package_list() {
        assert_eq!(
            parse_package_list(" busybox, curl,,jq "),
            vec!["busybox", "curl", "jq"]
        );
        assert!(parse_package_list("").is_empty());
    }

    #[test]
    fn test_scan_options_rejects_bad_regex() {
        assert!(ScanOptions::new(Some("("), false).is_err());
        let opts = ScanOptions::new(Some(r"\.sh$"), true).unwrap();
        assert!(opts.match_pattern.unwrap().is_match("bin/run.sh"));
        assert!(opts.executable_only);
    }
}
