//! Output formatting for analysis results.
//!
//! Two formats:
//! - Text: one block per script, coloured when writing to a terminal
//! - JSON: pretty-printed serde structures for programmatic consumption

use std::collections::BTreeSet;
use std::io::{self, Write};

use colored::*;
use serde::Serialize;

use crate::analysis::Incompatibility;

// =============================================================================
// Report structures
// =============================================================================

/// Result for one script of `show`, `scan` or `check`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScriptReport {
    pub file: String,
    pub deps: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub shell: String,
    /// `None` when no missing-dependency source was configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub gnu_incompatible: Vec<Incompatibility>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScriptReport {
    /// A script that could not be read or parsed.
    pub fn failed(file: impl Into<String>, error: impl ToString) -> Self {
        Self {
            file: file.into(),
            error: Some(error.to_string()),
            ..Default::default()
        }
    }

    pub fn missing(&self) -> &[String] {
        self.missing.as_deref().unwrap_or(&[])
    }

    pub fn has_issues(&self) -> bool {
        self.error.is_some() || !self.missing().is_empty() || !self.gnu_incompatible.is_empty()
    }
}

/// Result for one script installed by a package.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PackageScriptReport {
    pub file: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub deps: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub gnu_incompatible: Vec<Incompatibility>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub missing_coreutils: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PackageScriptReport {
    pub fn has_issues(&self) -> bool {
        self.missing_coreutils || !self.gnu_incompatible.is_empty() || self.error.is_some()
    }
}

/// Result of `check-package`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PackageReport {
    pub package: String,
    pub installed_files: usize,
    /// `None` when neither apk nor a recipe could answer.
    pub runtime_deps: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime_deps_error: Option<String>,
    pub busybox_without_coreutils: bool,
    pub scripts: Vec<PackageScriptReport>,
}

impl PackageReport {
    pub fn has_issues(&self) -> bool {
        self.scripts.iter().any(PackageScriptReport::has_issues)
    }
}

// =============================================================================
// JSON Format
// =============================================================================

/// Write any report as indented JSON followed by a newline.
pub fn write_json<W: Write + ?Sized, T: Serialize + ?Sized>(w: &mut W, value: &T) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *w, value)?;
    writeln!(w)?;
    Ok(())
}

// =============================================================================
// Text Format
// =============================================================================

/// `show` and `scan`: every script, dependencies first.
pub fn write_scripts_text<W: Write + ?Sized>(w: &mut W, reports: &[ScriptReport]) -> io::Result<()> {
    for report in reports {
        writeln!(w, "{}:", report.file.bold())?;
        if let Some(err) = &report.error {
            writeln!(w, "  {} {}", "error:".red(), err)?;
            continue;
        }
        writeln!(w, "  deps: {}", report.deps.join(" "))?;
        if !report.shell.is_empty() {
            writeln!(w, "  shell: {}", report.shell)?;
        }
        if let Some(missing) = &report.missing {
            writeln!(w, "  missing: {}", missing.join(" ").red())?;
        }
    }
    Ok(())
}

/// `check`: only scripts with issues, then a summary and suggestions.
pub fn write_check_text<W: Write + ?Sized>(w: &mut W, reports: &[ScriptReport]) -> io::Result<()> {
    let with_issues: Vec<&ScriptReport> = reports.iter().filter(|r| r.has_issues()).collect();

    writeln!(w, "Checked {} shell scripts", reports.len())?;
    if with_issues.is_empty() {
        writeln!(w, "{}", "✓ No issues found".green())?;
        return Ok(());
    }
    writeln!(w)?;

    let mut suggestions = BTreeSet::new();
    for report in &with_issues {
        writeln!(w, "{}:", report.file.bold())?;
        if let Some(err) = &report.error {
            writeln!(w, "  {} {}", "error:".red(), err)?;
            writeln!(w)?;
            continue;
        }
        if !report.shell.is_empty() {
            writeln!(w, "  shell: {}", report.shell)?;
        }
        if !report.deps.is_empty() {
            writeln!(w, "  deps: {}", report.deps.join(" "))?;
        }
        if !report.missing().is_empty() {
            let mut missing = report.missing().to_vec();
            missing.sort();
            writeln!(w, "  missing: {}", missing.join(" ").red())?;
            suggestions.insert("Missing commands: consider adding packages that provide them");
        }
        if !report.gnu_incompatible.is_empty() {
            writeln!(w, "  {}", "gnu-incompatible:".yellow())?;
            write_findings(w, &report.gnu_incompatible)?;
            suggestions.insert("GNU compatibility: add 'coreutils' to runtime dependencies");
        }
        writeln!(w)?;
    }

    writeln!(w, "---")?;
    writeln!(
        w,
        "Issues found in {} of {} scripts",
        with_issues.len(),
        reports.len()
    )?;
    if !suggestions.is_empty() {
        writeln!(w, "\nSuggestions:")?;
        for s in suggestions {
            writeln!(w, "  - {}", s)?;
        }
    }
    Ok(())
}

fn write_findings<W: Write + ?Sized>(w: &mut W, findings: &[Incompatibility]) -> io::Result<()> {
    for inc in findings {
        writeln!(w, "    - line {}: {}", inc.line, inc.description)?;
        writeln!(w, "      fix: {}", inc.fix.dimmed())?;
    }
    Ok(())
}

/// `check-package`: package summary, then scripts with issues.
pub fn write_package_text<W: Write + ?Sized>(w: &mut W, report: &PackageReport) -> io::Result<()> {
    writeln!(w, "Package: {}", report.package.bold())?;
    writeln!(w, "Found {} installed file(s)", report.installed_files)?;
    match (&report.runtime_deps, &report.runtime_deps_error) {
        (Some(deps), _) => writeln!(w, "Runtime dependencies: {}", deps.join(" "))?,
        (None, Some(err)) => writeln!(
            w,
            "{} could not determine runtime dependencies: {}",
            "Warning:".yellow(),
            err
        )?,
        (None, None) => {}
    }
    if report.busybox_without_coreutils {
        writeln!(
            w,
            "Note: Package has busybox but NOT coreutils - GNU-specific flags will fail"
        )?;
    }

    if report.scripts.is_empty() {
        writeln!(w, "No shell scripts found in installed files.")?;
        return Ok(());
    }

    let with_issues: Vec<&PackageScriptReport> =
        report.scripts.iter().filter(|s| s.has_issues()).collect();
    writeln!(w, "Checked {} script(s)", report.scripts.len())?;
    if with_issues.is_empty() {
        writeln!(w, "{}", "✓ No issues found".green())?;
        return Ok(());
    }
    writeln!(w)?;

    for script in &with_issues {
        writeln!(w, "{}:", script.file.bold())?;
        if let Some(err) = &script.error {
            writeln!(w, "  {} {}", "error:".red(), err)?;
            writeln!(w)?;
            continue;
        }
        if !script.gnu_incompatible.is_empty() {
            writeln!(w, "  gnu-incompatible (busybox cannot handle these):")?;
            for inc in &script.gnu_incompatible {
                writeln!(w, "    - line {}: {} {}", inc.line, inc.command, inc.flag)?;
                writeln!(w, "      {}", inc.description)?;
            }
        }
        if script.missing_coreutils {
            writeln!(w, "  {}", "⚠ MISSING RUNTIME DEPENDENCY: coreutils".red())?;
            writeln!(
                w,
                "    Package declares 'busybox' but scripts use GNU-specific flags."
            )?;
            writeln!(
                w,
                "    Add 'coreutils' to dependencies.runtime in the package YAML."
            )?;
        }
        writeln!(w)?;
    }

    writeln!(w, "---")?;
    writeln!(
        w,
        "Issues found in {} of {} script(s)",
        with_issues.len(),
        report.scripts.len()
    )?;
    Ok(())
}
