//! Command-line interface for shelldeps.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{debug, warn};

use crate::analysis::{AnalysisContext, FileAnalysis};
use crate::config::{parse_package_list, parse_search_path, ScanOptions};
use crate::package::{ApkSource, PackageSource, RuntimeDeps};
use crate::parser::is_shell_script;
use crate::report::{self, PackageReport, PackageScriptReport, ScriptReport};
use crate::resolve::{
    filter_by_provider, find_missing_commands, find_missing_in_path, find_missing_in_tree,
    has_gnu_coreutils,
};
use crate::scan::collect_scripts;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Static analysis of shell scripts.
///
/// Lists the external commands a script may run and flags options that only
/// GNU coreutils understands, so scripts can be checked against a minimal
/// BusyBox-based image before they fail at runtime.
#[derive(Parser)]
#[command(name = "shelldeps")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Emit JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Log analysis decisions to stderr (see also SHELLDEPS_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show dependencies of the given scripts
    Show(ShowArgs),
    /// Find shell scripts under a directory and list their dependencies
    Scan(ScanArgs),
    /// Check scripts for missing dependencies and GNU-only flags
    Check(CheckArgs),
    /// Check the shell scripts installed by a package against its runtime deps
    CheckPackage(CheckPackageArgs),
}

/// Arguments for the show command.
#[derive(Parser)]
pub struct ShowArgs {
    /// Script files to analyze
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Search path (colon separated) used to report missing commands
    #[arg(long)]
    pub path: Option<String>,
}

/// Options shared by the directory-walking commands.
#[derive(Parser)]
pub struct WalkArgs {
    /// Also treat files whose name matches this regex as shell scripts
    #[arg(long = "match")]
    pub match_pattern: Option<String>,

    /// Only consider executable files
    #[arg(short = 'x', long)]
    pub executable: bool,
}

impl WalkArgs {
    fn scan_options(&self) -> anyhow::Result<ScanOptions> {
        ScanOptions::new(self.match_pattern.as_deref(), self.executable)
            .context("invalid --match pattern")
    }
}

/// Arguments for the scan command.
#[derive(Parser)]
pub struct ScanArgs {
    /// Directory to scan
    pub dir: PathBuf,

    /// Root of an image filesystem; report deps with no executable there
    #[arg(long)]
    pub missing: Option<PathBuf>,

    #[command(flatten)]
    pub walk: WalkArgs,
}

/// Arguments for the check command.
#[derive(Parser)]
pub struct CheckArgs {
    /// Directory (or single script) to check
    pub dir: PathBuf,

    /// Packages installed at runtime (comma separated)
    #[arg(long)]
    pub packages: Option<String>,

    /// Search path (colon separated) of the target system
    #[arg(long)]
    pub path: Option<String>,

    /// Skip the GNU-only flag check
    #[arg(long)]
    pub no_gnu_compat: bool,

    /// Exit non-zero if any issue is found
    #[arg(long)]
    pub strict: bool,

    #[command(flatten)]
    pub walk: WalkArgs,
}

/// Arguments for the check-package command.
#[derive(Parser)]
pub struct CheckPackageArgs {
    /// Installed package name
    pub package: String,

    /// Directory holding melange recipes, used when apk has no answer
    #[arg(long, default_value = ".")]
    pub package_dir: PathBuf,

    /// Exit non-zero if any issue is found
    #[arg(long)]
    pub strict: bool,
}

fn file_label(path: &Path) -> String {
    path.display().to_string()
}

fn write_reports(out: &mut dyn Write, json: bool, reports: &[ScriptReport]) -> anyhow::Result<()> {
    if json {
        report::write_json(out, reports)
    } else {
        report::write_scripts_text(out, reports)?;
        Ok(())
    }
}

/// Run the show command.
pub fn run_show(args: &ShowArgs, json: bool, out: &mut dyn Write) -> anyhow::Result<i32> {
    let search_path = args.path.as_deref().map(parse_search_path);
    let results = AnalysisContext::new()
        .with_gnu_checks(false)
        .analyze_files_parallel(&args.files);

    let reports: Vec<ScriptReport> = results
        .into_iter()
        .map(|FileAnalysis { path, result }| match result {
            Ok(analysis) => ScriptReport {
                file: file_label(&path),
                missing: search_path
                    .as_deref()
                    .map(|sp| find_missing_in_path(&analysis.dependencies, sp)),
                shell: analysis.shebang.raw,
                deps: analysis.dependencies,
                ..Default::default()
            },
            Err(e) => ScriptReport::failed(file_label(&path), e),
        })
        .collect();

    write_reports(out, json, &reports)?;
    Ok(EXIT_SUCCESS)
}

/// Run the scan command.
pub fn run_scan(args: &ScanArgs, json: bool, out: &mut dyn Write) -> anyhow::Result<i32> {
    let options = args.walk.scan_options()?;
    if let Some(root) = &args.missing {
        if !root.is_dir() {
            anyhow::bail!("--missing must be a directory: {}", root.display());
        }
    }

    let scripts = collect_scripts(&args.dir, &options)?;
    debug!(count = scripts.len(), "collected scripts");
    if scripts.is_empty() && !json {
        writeln!(out, "No shell scripts found.")?;
        return Ok(EXIT_SUCCESS);
    }

    let results = AnalysisContext::new()
        .with_gnu_checks(false)
        .analyze_files_parallel(&scripts);

    let reports: Vec<ScriptReport> = results
        .into_iter()
        .map(|FileAnalysis { path, result }| match result {
            Ok(analysis) => ScriptReport {
                file: file_label(&path),
                missing: args
                    .missing
                    .as_deref()
                    .map(|root| find_missing_in_tree(&analysis.dependencies, root)),
                shell: analysis.shebang.raw,
                deps: analysis.dependencies,
                ..Default::default()
            },
            Err(e) => ScriptReport::failed(file_label(&path), e),
        })
        .collect();

    write_reports(out, json, &reports)?;
    Ok(EXIT_SUCCESS)
}

/// Run the check command.
///
/// Missing dependencies come from `--packages` when given, else from
/// `--path`. GNU findings are dropped entirely when the package list has
/// coreutils, and per command when `--path` resolves it to coreutils.
pub fn run_check(args: &CheckArgs, json: bool, out: &mut dyn Write) -> anyhow::Result<i32> {
    let options = args.walk.scan_options()?;
    let packages = args.packages.as_deref().map(parse_package_list);
    let search_path = args.path.as_deref().map(parse_search_path);

    let coreutils_declared = packages.as_deref().is_some_and(|p| has_gnu_coreutils(p));
    if coreutils_declared {
        debug!("coreutils declared, skipping GNU flag checks");
    }
    let context = AnalysisContext::new().with_gnu_checks(!args.no_gnu_compat && !coreutils_declared);

    let scripts = collect_scripts(&args.dir, &options)?;
    if scripts.is_empty() && !json {
        writeln!(out, "No shell scripts found.")?;
        return Ok(EXIT_SUCCESS);
    }

    let reports: Vec<ScriptReport> = context
        .analyze_files_parallel(&scripts)
        .into_iter()
        .map(|FileAnalysis { path, result }| match result {
            Ok(analysis) => {
                let missing = match (&packages, &search_path) {
                    (Some(pkgs), _) => Some(find_missing_commands(&analysis.dependencies, pkgs)),
                    (None, Some(sp)) => Some(find_missing_in_path(&analysis.dependencies, sp)),
                    (None, None) => None,
                };
                let gnu_incompatible = match &search_path {
                    Some(sp) => filter_by_provider(analysis.incompatibilities, sp),
                    None => analysis.incompatibilities,
                };
                ScriptReport {
                    file: file_label(&path),
                    deps: analysis.dependencies,
                    shell: analysis.shebang.raw,
                    missing,
                    gnu_incompatible,
                    error: None,
                }
            }
            Err(e) => ScriptReport::failed(file_label(&path), e),
        })
        .collect();

    if json {
        report::write_json(out, &reports)?;
    } else {
        report::write_check_text(out, &reports)?;
    }

    if args.strict && reports.iter().any(ScriptReport::has_issues) {
        return Ok(EXIT_FAILED);
    }
    Ok(EXIT_SUCCESS)
}

/// Run the check-package command against the local apk database.
pub fn run_check_package(
    args: &CheckPackageArgs,
    json: bool,
    out: &mut dyn Write,
) -> anyhow::Result<i32> {
    let source = ApkSource::new(&args.package_dir);
    check_package(&source, args, json, out)
}

/// Check a package using any metadata source.
pub fn check_package(
    source: &dyn PackageSource,
    args: &CheckPackageArgs,
    json: bool,
    out: &mut dyn Write,
) -> anyhow::Result<i32> {
    let files = source
        .installed_files(&args.package)
        .with_context(|| format!("failed to get installed files for package {}", args.package))?;

    let mut report = PackageReport {
        package: args.package.clone(),
        installed_files: files.len(),
        ..Default::default()
    };

    let runtime = match source.runtime_deps(&args.package) {
        Ok(deps) => {
            report.runtime_deps = Some(deps.names.clone());
            deps
        }
        Err(e) => {
            // Scripts are still checked for parse errors without dep info.
            warn!(error = %e, "could not determine runtime dependencies");
            report.runtime_deps_error = Some(e.to_string());
            RuntimeDeps::default()
        }
    };
    report.busybox_without_coreutils = runtime.needs_gnu_check();

    let scripts: Vec<PathBuf> = files.into_iter().filter(|f| is_script_file(f)).collect();
    let context = AnalysisContext::new().with_gnu_checks(runtime.needs_gnu_check());

    report.scripts = context
        .analyze_files_parallel(&scripts)
        .into_iter()
        .map(|FileAnalysis { path, result }| match result {
            Ok(analysis) => PackageScriptReport {
                file: file_label(&path),
                deps: analysis.dependencies,
                missing_coreutils: !analysis.incompatibilities.is_empty(),
                gnu_incompatible: analysis.incompatibilities,
                error: None,
            },
            Err(e) => PackageScriptReport {
                file: file_label(&path),
                error: Some(e.to_string()),
                ..Default::default()
            },
        })
        .collect();

    if json {
        report::write_json(out, &report)?;
    } else {
        report::write_package_text(out, &report)?;
    }

    if args.strict && report.has_issues() {
        return Ok(EXIT_FAILED);
    }
    Ok(EXIT_SUCCESS)
}

fn is_script_file(path: &Path) -> bool {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => match is_shell_script(path) {
            Ok(is_shell) => is_shell,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "cannot classify");
                false
            }
        },
        Ok(_) => false,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "skipping");
            false
        }
    }
}
