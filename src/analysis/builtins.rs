//! Shell builtins and reserved words.
//!
//! Names in this set are implemented by the shell itself and never count as
//! external dependencies.

use phf::phf_set;

static SHELL_BUILTINS: phf::Set<&'static str> = phf_set! {
    // POSIX special builtins
    "break", ":", "continue", ".", "eval", "exec", "exit", "export",
    "readonly", "return", "set", "shift", "times", "trap", "unset",
    // POSIX regular builtins
    "alias", "bg", "cd", "command", "false", "fc", "fg", "getopts", "jobs",
    "kill", "newgrp", "pwd", "read", "true", "umask", "unalias", "wait",
    "hash", "type", "ulimit",
    // test and output
    "[", "test", "echo", "printf",
    // reserved words
    "if", "then", "else", "elif", "fi", "while", "do", "done", "for", "in",
    "case", "esac", "until", "select", "function",
    // bash and dash extensions
    "source", "local", "declare", "typeset", "let", "enable", "builtin",
    "caller", "compgen", "complete", "compopt", "dirs", "disown", "help",
    "history", "logout", "mapfile", "popd", "pushd", "shopt", "suspend",
    "bind", "readarray",
};

pub fn is_builtin(name: &str) -> bool {
    SHELL_BUILTINS.contains(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins() {
        for name in ["cd", "export", "test", "[", "echo", ":", ".", "local", "mapfile"] {
            assert!(is_builtin(name), "{name} should be a builtin");
        }
    }

    #[test]
    fn test_external_commands_are_not_builtins() {
        for name in ["ls", "grep", "awk", "/bin/echo", "Echo", ""] {
            assert!(!is_builtin(name), "{name} should not be a builtin");
        }
    }
}
