//! Interpreter line handling.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

/// Interpreters whose scripts this tool analyzes.
pub const SHELL_INTERPRETERS: &[&str] = &["/bin/sh", "/bin/dash", "/bin/bash", "sh", "dash", "bash"];

/// The `#!` line of a script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShebangInfo {
    /// Everything after `#!`, leading whitespace removed. Empty if absent.
    pub raw: String,
    /// The interpreter with any `/usr/bin/env` wrapper and arguments removed.
    pub program: String,
}

impl ShebangInfo {
    pub fn from_source(text: &str) -> Self {
        let raw = extract_shebang(text);
        let program = shebang_program(&raw);
        Self { raw, program }
    }

    pub fn is_present(&self) -> bool {
        !self.raw.is_empty()
    }

    pub fn is_shell(&self) -> bool {
        is_shell_interpreter(&self.program) || is_shell_interpreter(&self.raw)
    }
}

/// Return the interpreter string from the first line, or an empty string.
pub fn extract_shebang(text: &str) -> String {
    let first = text.lines().next().unwrap_or("").trim();
    match first.strip_prefix("#!") {
        Some(rest) => rest.trim_start().to_string(),
        None => String::new(),
    }
}

/// Resolve the program named by a shebang.
///
/// `/usr/bin/env bash -e` yields `bash`; `/bin/sh -eu` yields `/bin/sh`.
pub fn shebang_program(raw: &str) -> String {
    let mut fields = raw.split_whitespace();
    match fields.next() {
        Some("/usr/bin/env") => fields.next().unwrap_or("").to_string(),
        Some(first) => first.to_string(),
        None => String::new(),
    }
}

pub fn is_shell_interpreter(program: &str) -> bool {
    SHELL_INTERPRETERS.contains(&program)
}

/// Read only the first line of a file and decide whether it is a shell script.
pub fn is_shell_script(path: &Path) -> io::Result<bool> {
    let file = File::open(path)?;
    // Binaries may have no newline for a long way.
    let mut reader = BufReader::new(file.take(1024));
    let mut line = Vec::new();
    reader.read_until(b'\n', &mut line)?;
    let first = String::from_utf8_lossy(&line);
    Ok(ShebangInfo::from_source(&first).is_shell())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_extract_shebang() {
        assert_eq!(extract_shebang("#!/bin/sh\necho hi\n"), "/bin/sh");
        assert_eq!(extract_shebang("#! /usr/bin/env bash\n"), "/usr/bin/env bash");
        assert_eq!(extract_shebang("echo hi\n#!/bin/sh\n"), "");
        assert_eq!(extract_shebang(""), "");
    }

    #[test]
    fn test_shebang_program() {
        assert_eq!(shebang_program("/usr/bin/env bash -e"), "bash");
        assert_eq!(shebang_program("/bin/sh -eu"), "/bin/sh");
        assert_eq!(shebang_program("/usr/bin/env"), "");
        assert_eq!(shebang_program(""), "");
    }

    #[test]
    fn test_is_shell() {
        assert!(ShebangInfo::from_source("#!/bin/sh\n").is_shell());
        assert!(ShebangInfo::from_source("#!/usr/bin/env dash\n").is_shell());
        assert!(!ShebangInfo::from_source("#!/usr/bin/python3\n").is_shell());
        assert!(!ShebangInfo::from_source("echo hi\n").is_present());
    }

    #[test]
    fn test_is_shell_script_reads_first_line() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "#!/bin/bash").unwrap();
        writeln!(file, "echo hi").unwrap();
        assert!(is_shell_script(file.path()).unwrap());

        let mut other = tempfile::NamedTempFile::new().unwrap();
        writeln!(other, "#!/usr/bin/perl").unwrap();
        assert!(!is_shell_script(other.path()).unwrap());
    }
}
