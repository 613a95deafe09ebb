//! External command dependency extraction.
//!
//! Two passes over the tree: the first records script-local names that shadow
//! external commands (functions and aliases) and which functions forward their
//! arguments as a command; the second collects the first word of every call
//! that survives those filters.

use std::collections::{BTreeSet, HashSet};

use tracing::trace;

use super::builtins::is_builtin;
use crate::parser::ast::{Program, Stmt};
use crate::parser::walk::{walk, walk_stmt, Node};

/// Names defined by the script itself.
#[derive(Debug, Clone, Default)]
pub struct ScriptSymbols {
    pub functions: HashSet<String>,
    pub aliases: HashSet<String>,
    /// Functions that run `"$@"` or `$*` as a command.
    pub wrappers: HashSet<String>,
}

impl ScriptSymbols {
    pub fn collect(program: &Program) -> Self {
        let mut symbols = Self::default();
        walk(program, &mut |node| {
            match node {
                Node::FuncDecl(decl) => {
                    symbols.functions.insert(decl.name.clone());
                    if executes_arguments(&decl.body) {
                        symbols.wrappers.insert(decl.name.clone());
                    }
                }
                Node::Call(call) => {
                    if call.args.first().is_some_and(|w| w.flatten() == "alias") {
                        for arg in &call.args[1..] {
                            let def = arg.flatten();
                            if let Some(eq) = def.find('=').filter(|&i| i > 0) {
                                symbols.aliases.insert(def[..eq].to_string());
                            }
                        }
                    }
                }
                _ => {}
            }
            true
        });
        symbols
    }

    /// Apply the dependency filter to a command word.
    ///
    /// Returns the name to record, or `None` if it is a builtin, defined by
    /// the script, or cannot be known without running the script.
    pub fn accept(&self, word: &str) -> Option<String> {
        let name = word.trim_start_matches('\\');
        if name.is_empty()
            || is_builtin(name)
            || self.functions.contains(name)
            || self.aliases.contains(name)
        {
            return None;
        }
        if (name.contains('$') || name.contains('*')) && !name.starts_with('/') {
            return None;
        }
        Some(name.to_string())
    }
}

/// True if a function body runs its own arguments as a command.
pub fn executes_arguments(body: &Stmt) -> bool {
    let mut found = false;
    walk_stmt(body, &mut |node| {
        if found {
            return false;
        }
        if let Node::Call(call) = node {
            if call.args.first().is_some_and(|w| w.has_all_positional()) {
                found = true;
                return false;
            }
        }
        true
    });
    found
}

/// Sorted, deduplicated external commands a program may run.
pub fn extract_dependencies(program: &Program) -> Vec<String> {
    let symbols = ScriptSymbols::collect(program);
    let mut deps = BTreeSet::new();

    walk(program, &mut |node| {
        if let Node::Call(call) = node {
            let Some(first) = call.args.first() else {
                return true;
            };
            let name = first.flatten();
            if let Some(dep) = symbols.accept(&name) {
                deps.insert(dep);
            }
            if symbols.wrappers.contains(&name) && call.args.len() >= 2 {
                if let Some(dep) = symbols.accept(&call.args[1].flatten()) {
                    trace!(wrapper = %name, command = %dep, "command run through wrapper");
                    deps.insert(dep);
                }
            }
        }
        true
    });

    deps.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::treesitter::parse;

    fn deps(src: &str) -> Vec<String> {
        extract_dependencies(&parse(src, "test.sh").unwrap())
    }

    #[test]
    fn test_simple_commands_sorted() {
        assert_eq!(
            deps("#!/bin/sh\ngrep pattern file.txt\nawk '{print $1}' data.txt\n"),
            vec!["awk", "grep"]
        );
    }

    #[test]
    fn test_builtins_only() {
        let src = "#!/bin/sh\ncd /tmp\nexport FOO=bar\nif [ -f x ]; then\n  echo yes\nfi\ntest -d /tmp && echo ok\n";
        assert!(deps(src).is_empty());
    }

    #[test]
    fn test_function_shadows_command() {
        assert!(deps("ls() { :; }\nls\n").is_empty());
    }

    #[test]
    fn test_alias_shadows_command() {
        assert!(deps("alias ll='ls -la'\nll\n").is_empty());
    }

    #[test]
    fn test_wrapper_forwards_command() {
        assert_eq!(deps("vr() { \"$@\"; }\nvr ls /etc\n"), vec!["ls"]);
    }

    #[test]
    fn test_unquoted_star_wrapper() {
        assert_eq!(deps("run() {\n  $*\n}\nrun curl -s x\n"), vec!["curl"]);
    }

    #[test]
    fn test_echo_is_not_wrapper() {
        let src = "print_args() { echo \"$@\"; }\nprint_args ls /etc\ngrep pattern file\n";
        assert_eq!(deps(src), vec!["grep"]);
    }

    #[test]
    fn test_absolute_paths_kept() {
        assert_eq!(deps("/sbin/sudo ls -l\n"), vec!["/sbin/sudo", "ls"]);
    }

    #[test]
    fn test_unresolved_names_dropped() {
        assert!(deps("$EDITOR file\n${TOOL} run\n").is_empty());
        assert_eq!(deps("/opt/$VER/bin/tool\n"), vec!["/opt/${VER}/bin/tool"]);
    }

    #[test]
    fn test_nested_substitutions_and_pipelines() {
        let src = "x=$(date +%s)\nfor f in $(find . -name '*.sh'); do\n  sed -n 1p \"$f\" | head -1\ndone\n";
        assert_eq!(deps(src), vec!["date", "find", "head", "sed"]);
    }

    #[test]
    fn test_substitution_inside_parameter_expansion() {
        assert_eq!(deps("x=${y:-$(hostname)}\n"), vec!["hostname"]);
        assert_eq!(deps("echo \"${x:-$(date +%s)}\"\n"), vec!["date"]);
        assert_eq!(deps("echo ${x:+$(uname -r)}\n"), vec!["uname"]);
    }

    #[test]
    fn test_substitution_inside_arithmetic() {
        assert_eq!(deps("n=$(( $(wc -l < f) + 1 ))\n"), vec!["wc"]);
        assert!(deps("n=$((n + 1))\n").is_empty());
    }

    #[test]
    fn test_time_keyword_is_not_a_dependency() {
        assert_eq!(deps("time sleep 1\n"), vec!["sleep"]);
        assert_eq!(deps("time -p make all\n"), vec!["make"]);
    }

    #[test]
    fn test_escaped_command_name() {
        assert_eq!(deps("\\rm -f x\n"), vec!["rm"]);
    }

    #[test]
    fn test_idempotent() {
        let program = parse("b\na\nb\nc | a\n", "t").unwrap();
        let first = extract_dependencies(&program);
        assert_eq!(first, extract_dependencies(&program));
        assert_eq!(first, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_collect_symbols() {
        let program =
            parse("wrap() { \"$@\"; }\nplain() { echo hi; }\nalias a=b c=d\n", "t").unwrap();
        let symbols = ScriptSymbols::collect(&program);
        assert!(symbols.functions.contains("wrap"));
        assert!(symbols.functions.contains("plain"));
        assert!(symbols.wrappers.contains("wrap"));
        assert!(!symbols.wrappers.contains("plain"));
        assert!(symbols.aliases.contains("a"));
        assert!(symbols.aliases.contains("c"));
    }
}
