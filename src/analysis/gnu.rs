//! GNU coreutils-only flag detection.
//!
//! BusyBox ships many of the same command names as GNU coreutils but not all
//! of their options. Calls passing one of the flags below work on a GNU
//! system and fail (or silently do something else) under BusyBox.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::Path;

use once_cell::sync::Lazy;
use serde::Serialize;
use tracing::debug;

use crate::parser::ast::Program;
use crate::parser::walk::{walk, Node};

const DEFAULT_FIX: &str = "Add 'coreutils' to runtime dependencies";

/// A flag that only GNU coreutils accepts for a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GnuFlagRule {
    pub command: &'static str,
    pub flag: &'static str,
    pub description: &'static str,
    pub fix: &'static str,
}

const fn rule(
    command: &'static str,
    flag: &'static str,
    description: &'static str,
    fix: &'static str,
) -> GnuFlagRule {
    GnuFlagRule {
        command,
        flag,
        description,
        fix,
    }
}

pub static GNU_FLAG_RULES: &[GnuFlagRule] = &[
    rule("realpath", "--no-symlinks", "realpath --no-symlinks (GNU only)", DEFAULT_FIX),
    rule("realpath", "--relative-base", "realpath --relative-base (GNU only)", DEFAULT_FIX),
    rule(
        "realpath",
        "-q",
        "realpath -q (GNU only, busybox doesn't support quiet mode)",
        "Add 'coreutils' to runtime dependencies, or redirect stderr",
    ),
    rule(
        "realpath",
        "--quiet",
        "realpath --quiet (GNU only)",
        "Add 'coreutils' to runtime dependencies, or redirect stderr",
    ),
    rule(
        "stat",
        "--format",
        "stat --format (GNU only, use -c for busybox)",
        "Use 'stat -c' instead, or add 'coreutils' to runtime dependencies",
    ),
    rule("stat", "--printf", "stat --printf (GNU only)", DEFAULT_FIX),
    rule(
        "cp",
        "--reflink",
        "cp --reflink (GNU only)",
        "Add 'coreutils' to runtime dependencies, or remove --reflink",
    ),
    rule("cp", "--sparse", "cp --sparse (GNU only)", DEFAULT_FIX),
    rule(
        "date",
        "--iso-8601",
        "date --iso-8601 (GNU only)",
        "Use 'date +%Y-%m-%d' format instead, or add 'coreutils'",
    ),
    rule(
        "date",
        "-I",
        "date -I (GNU only)",
        "Use 'date +%Y-%m-%d' format instead, or add 'coreutils'",
    ),
    rule("mktemp", "--suffix", "mktemp --suffix (GNU only)", DEFAULT_FIX),
    rule("sort", "-h", "sort -h (GNU only, human-numeric sort)", DEFAULT_FIX),
    rule("sort", "--human-numeric-sort", "sort --human-numeric-sort (GNU only)", DEFAULT_FIX),
    rule("ls", "--time-style", "ls --time-style (GNU only)", DEFAULT_FIX),
    rule("df", "--output", "df --output (GNU only)", DEFAULT_FIX),
    rule(
        "readlink",
        "-e",
        "readlink -e (GNU only)",
        "Use 'readlink -f' instead (works on both), or add 'coreutils'",
    ),
    rule("readlink", "-m", "readlink -m (GNU only)", DEFAULT_FIX),
    rule("tail", "--pid", "tail --pid (GNU only)", DEFAULT_FIX),
    rule(
        "touch",
        "--date",
        "touch --date (GNU only, use -d for busybox)",
        "Use 'touch -d' instead, or add 'coreutils'",
    ),
    rule(
        "head",
        "--bytes",
        "head --bytes (GNU only, use -c for busybox)",
        "Use 'head -c' instead",
    ),
    rule("du", "--apparent-size", "du --apparent-size (GNU only)", DEFAULT_FIX),
    rule("chmod", "--reference", "chmod --reference (GNU only)", DEFAULT_FIX),
    rule("chown", "--reference", "chown --reference (GNU only)", DEFAULT_FIX),
    rule(
        "install",
        "-D",
        "install -D (GNU only, creates parent directories)",
        "Use 'mkdir -p' before install, or add 'coreutils'",
    ),
    rule(
        "tr",
        "--complement",
        "tr --complement (GNU only, use -c for busybox)",
        "Use 'tr -c' instead",
    ),
    rule("wc", "--total", "wc --total (GNU only)", DEFAULT_FIX),
    rule(
        "seq",
        "--equal-width",
        "seq --equal-width (GNU only, use -w for busybox)",
        "Use 'seq -w' instead",
    ),
];

static RULES_BY_COMMAND: Lazy<HashMap<&'static str, Vec<&'static GnuFlagRule>>> = Lazy::new(|| {
    let mut index: HashMap<&'static str, Vec<&'static GnuFlagRule>> = HashMap::new();
    for r in GNU_FLAG_RULES {
        index.entry(r.command).or_default().push(r);
    }
    index
});

/// Rules for a command name, in table order.
pub fn rules_for(command: &str) -> &'static [&'static GnuFlagRule] {
    RULES_BY_COMMAND
        .get(command)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// A call that passes a GNU-only flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Incompatibility {
    pub command: String,
    pub flag: String,
    pub line: usize,
    /// The source line holding the call, trimmed.
    pub line_content: String,
    pub description: String,
    pub fix: String,
}

/// Test one argument against one rule flag.
///
/// Matches the flag itself, `--long=value`, and short flags bundled with
/// others (`-Dm755` carries `-D`).
pub fn matches_flag(arg: &str, flag: &str) -> bool {
    if arg == flag {
        return true;
    }
    if flag.starts_with("--") {
        return arg.strip_prefix(flag).is_some_and(|rest| rest.starts_with('='));
    }
    let mut flag_chars = flag.chars();
    if let (Some('-'), Some(letter), None) = (flag_chars.next(), flag_chars.next(), flag_chars.next())
    {
        if let Some(bundle) = arg.strip_prefix('-') {
            return !bundle.starts_with('-') && bundle.contains(letter);
        }
    }
    false
}

/// Find every GNU-only flag passed to a rule-table command.
///
/// Command names are taken literally: builtins, functions and aliases are not
/// filtered here. An absolute path is looked up by its base name.
pub fn check_gnu_compatibility(program: &Program, label: &str) -> Vec<Incompatibility> {
    let mut found = Vec::new();

    walk(program, &mut |node| {
        let Node::Call(call) = node else {
            return true;
        };
        let Some(first) = call.args.first() else {
            return true;
        };
        let flat = first.flatten();
        let name = flat.trim_start_matches('\\');
        let command = if name.starts_with('/') {
            Path::new(name)
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or(name)
        } else {
            name
        };

        let rules = rules_for(command);
        if rules.is_empty() {
            return true;
        }

        for arg in &call.args[1..] {
            let arg = arg.flatten();
            for r in rules.iter().filter(|r| matches_flag(&arg, r.flag)) {
                found.push(Incompatibility {
                    command: r.command.to_string(),
                    flag: r.flag.to_string(),
                    line: call.pos.line,
                    line_content: program.line(call.pos.line).trim().to_string(),
                    description: r.description.to_string(),
                    fix: r.fix.to_string(),
                });
            }
        }
        true
    });

    if !found.is_empty() {
        debug!(script = label, count = found.len(), "GNU-only flags found");
    }
    found
}

pub fn needs_gnu_coreutils(incompatibilities: &[Incompatibility]) -> bool {
    !incompatibilities.is_empty()
}

/// Plain-text block listing findings for one script.
pub fn format_incompatibilities(label: &str, incompatibilities: &[Incompatibility]) -> String {
    if incompatibilities.is_empty() {
        return String::new();
    }
    let mut out = String::new();
    let _ = writeln!(out, "  GNU coreutils incompatibilities in {}:", label);
    for inc in incompatibilities {
        let _ = writeln!(out, "    Line {}: {}", inc.line, inc.description);
        let _ = writeln!(out, "      {}", truncate_line(&inc.line_content, 60));
        let _ = writeln!(out, "      Fix: {}", inc.fix);
    }
    out
}

/// Shorten `line` to at most `max` characters, ending in `...` when cut.
fn truncate_line(line: &str, max: usize) -> String {
    if line.chars().count() <= max {
        return line.to_string();
    }
    let mut short: String = line.chars().take(max.saturating_sub(3)).collect();
    short.push_str("...");
    short
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::treesitter::parse;

    fn check(src: &str) -> Vec<Incompatibility> {
        check_gnu_compatibility(&parse(src, "test.sh").unwrap(), "test.sh")
    }

    #[test]
    fn test_matches_flag() {
        let cases = [
            ("--reflink", "--reflink", true),
            ("--reflink=auto", "--reflink", true),
            ("--reflinks", "--reflink", false),
            ("-Dm755", "-D", true),
            ("-m755", "-D", false),
            ("-v", "-h", false),
            ("-h", "-h", true),
            ("-rh", "-h", true),
            ("--human", "-h", false),
        ];
        for (arg, flag, want) in cases {
            assert_eq!(matches_flag(arg, flag), want, "matches_flag({arg:?}, {flag:?})");
        }
    }

    #[test]
    fn test_every_required_command_has_rules() {
        for cmd in [
            "realpath", "stat", "cp", "date", "mktemp", "sort", "ls", "df", "readlink", "tail",
            "touch", "head", "du", "chmod", "chown", "install", "tr", "wc", "seq",
        ] {
            assert!(!rules_for(cmd).is_empty(), "no rules for {cmd}");
        }
        assert!(rules_for("grep").is_empty());
    }

    #[test]
    fn test_realpath_no_symlinks() {
        let found = check("#!/bin/sh\nrealpath --no-symlinks /opt\n");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].command, "realpath");
        assert_eq!(found[0].flag, "--no-symlinks");
        assert_eq!(found[0].line, 2);
    }

    #[test]
    fn test_compatible_flag_not_reported() {
        assert!(check("realpath -f /opt\n").is_empty());
    }

    #[test]
    fn test_combined_short_flags() {
        let found = check("install -Dm755 bin /usr/local/bin/\n");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].flag, "-D");
    }

    #[test]
    fn test_pipeline_only_flags_matching_command() {
        let found = check("du -h /var | sort -h\n");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].command, "sort");
    }

    #[test]
    fn test_flag_on_other_command_ignored() {
        assert!(check("chmod 644 foo && some-command --reference foo\n").is_empty());
    }

    #[test]
    fn test_multiline_call_reports_call_line() {
        let found = check("#!/bin/sh\nchmod \\\n  --reference=foo \\\n  bar\n");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].line, 2);
    }

    #[test]
    fn test_absolute_path_uses_base_name() {
        let found = check("/usr/bin/stat --format=%s file\n");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].command, "stat");
    }

    #[test]
    fn test_multiple_flags_one_call() {
        let found = check("realpath -q --relative-base=/ x\n");
        let flags: Vec<&str> = found.iter().map(|i| i.flag.as_str()).collect();
        assert_eq!(flags, vec!["-q", "--relative-base"]);
    }

    #[test]
    fn test_format_incompatibilities() {
        let found = check("seq --equal-width 1 10\n");
        let text = format_incompatibilities("run.sh", &found);
        assert!(text.starts_with("  GNU coreutils incompatibilities in run.sh:\n"));
        assert!(text.contains("    Line 1: seq --equal-width"));
        assert!(text.contains("\n      seq --equal-width 1 10\n"));
        assert!(text.contains("      Fix: Use 'seq -w' instead"));
        assert!(format_incompatibilities("run.sh", &[]).is_empty());
        assert!(needs_gnu_coreutils(&found));
    }

    #[test]
    fn test_line_content_is_trimmed_source_line() {
        let found = check("#!/bin/sh
  du -sh /var | sort -h  
");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].line_content, "du -sh /var | sort -h");
    }

    #[test]
    fn test_long_line_content_truncated() {
        let long_path = "/very/long/directory/name".repeat(4);
        let found = check(&format!("sort -h {long_path}\n"));
        let text = format_incompatibilities("run.sh", &found);
        let shown = text
            .lines()
            .find(|l| l.trim_start().starts_with("sort -h /very"))
            .unwrap()
            .trim_start();
        assert_eq!(shown.chars().count(), 60);
        assert!(shown.ends_with("..."));
        assert_eq!(truncate_line("short", 60), "short");
    }

    #[test]
    fn test_command_substitution_in_parameter_default() {
        let found = check("x=${y:-$(stat --format=%s f)}\n");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].command, "stat");
        assert_eq!(found[0].flag, "--format");
    }

    #[test]
    fn test_command_substitution_in_arithmetic() {
        let found = check("n=$(( $(sort -h f | wc -l) + 1 ))\n");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].command, "sort");
    }

    #[test]
    fn test_timed_command_checked() {
        let found = check("time sort -h f\ntime -p du --apparent-size /var\n");
        let summary: Vec<(&str, usize)> =
            found.iter().map(|i| (i.command.as_str(), i.line)).collect();
        assert_eq!(summary, vec![("sort", 1), ("du", 2)]);
    }

    #[test]
    fn test_escaped_command_name_checked() {
        let found = check("\\stat --format=%s f\n");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].command, "stat");
    }
}
