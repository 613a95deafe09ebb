//! End-to-end analysis of the scripts under testdata/.

use std::path::PathBuf;

use shelldeps::analysis::FileAnalysis;
use shelldeps::{
    check_gnu_compatibility, dependencies_of, parse, AnalysisContext, AnalysisError, Script,
};

fn testdata_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

fn load(name: &str) -> Script {
    Script::from_path(&testdata_path().join(name)).expect("fixture should be readable")
}

#[test]
fn test_deploy_script_dependencies() {
    let deps = dependencies_of(&load("deploy.sh")).unwrap();
    assert_eq!(deps, vec!["/usr/local/bin/helper", "awk", "curl", "grep"]);
}

#[test]
fn test_builtins_only_script_has_no_dependencies() {
    assert!(dependencies_of(&load("builtins_only.sh")).unwrap().is_empty());
}

#[test]
fn test_gnu_flags_script() {
    let script = load("gnu_flags.sh");
    let program = parse(&script).unwrap();

    let found = check_gnu_compatibility(&program, script.label());
    let summary: Vec<(&str, &str, usize)> = found
        .iter()
        .map(|i| (i.command.as_str(), i.flag.as_str(), i.line))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("stat", "--format", 4),
            ("install", "-D", 5),
            ("sort", "-h", 6),
            ("chmod", "--reference", 8),
        ]
    );
}

#[test]
fn test_gnu_flags_script_dependencies() {
    let deps = dependencies_of(&load("gnu_flags.sh")).unwrap();
    assert_eq!(
        deps,
        vec!["chmod", "du", "install", "realpath", "sort", "stat"]
    );
}

#[test]
fn test_parse_error_reports_label_and_position() {
    let script = load("broken.sh");
    let err = parse(&script).unwrap_err();
    match &err {
        AnalysisError::Parse(parse_err) => {
            assert!(parse_err.label.ends_with("broken.sh"));
            assert!(parse_err.line >= 1);
        }
        other => panic!("expected a parse error, got {other:?}"),
    }
    assert!(err.to_string().contains("broken.sh:"));
}

#[test]
fn test_analysis_context_combines_both_passes() {
    let analysis = AnalysisContext::new().analyze(&load("gnu_flags.sh")).unwrap();
    assert_eq!(analysis.shebang.program, "/bin/bash");
    assert!(analysis.dependencies.contains(&"stat".to_string()));
    assert_eq!(analysis.incompatibilities.len(), 4);

    let quiet = AnalysisContext::new()
        .with_gnu_checks(false)
        .analyze(&load("gnu_flags.sh"))
        .unwrap();
    assert!(quiet.incompatibilities.is_empty());
    assert_eq!(quiet.dependencies, analysis.dependencies);
}

#[test]
fn test_batch_keeps_order_and_isolates_failures() {
    let dir = testdata_path();
    let paths = vec![
        dir.join("deploy.sh"),
        dir.join("broken.sh"),
        dir.join("does-not-exist.sh"),
        dir.join("builtins_only.sh"),
    ];
    let results = AnalysisContext::new().analyze_files_parallel(&paths);

    let returned: Vec<&PathBuf> = results.iter().map(|r| &r.path).collect();
    assert_eq!(returned, paths.iter().collect::<Vec<_>>());

    assert!(results[0].result.is_ok());
    assert!(matches!(results[1].result, Err(AnalysisError::Parse(_))));
    assert!(matches!(results[2].result, Err(AnalysisError::Io { .. })));
    let FileAnalysis { result, .. } = &results[3];
    assert!(result.as_ref().unwrap().dependencies.is_empty());
}

#[test]
fn test_analysis_is_deterministic() {
    let script = load("deploy.sh");
    let first = dependencies_of(&script).unwrap();
    for _ in 0..5 {
        assert_eq!(dependencies_of(&script).unwrap(), first);
    }
}
