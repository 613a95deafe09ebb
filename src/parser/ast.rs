//! Owned syntax tree for shell scripts.
//!
//! The tree-sitter concrete syntax tree is lowered into these types once per
//! parse. Everything downstream (dependency extraction, flag checks) works on
//! this representation and never touches tree-sitter nodes directly.

/// A 1-based source position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pos {
    pub line: usize,
    pub column: usize,
}

impl Pos {
    /// Position of the start of a tree-sitter node.
    pub fn from_node(node: tree_sitter::Node) -> Self {
        let start = node.start_position();
        Self {
            line: start.row + 1, // tree-sitter is 0-indexed
            column: start.column + 1,
        }
    }
}

/// A parsed script: the top-level statement list.
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub stmts: Vec<Stmt>,
    /// The text the program was parsed from.
    pub source: String,
}

impl Program {
    /// Source line `line` (1-based), or an empty string past the end.
    pub fn line(&self, line: usize) -> &str {
        line.checked_sub(1)
            .and_then(|i| self.source.lines().nth(i))
            .unwrap_or("")
    }
}

/// A single statement.
#[derive(Debug, Clone)]
pub struct Stmt {
    pub cmd: Command,
    pub pos: Pos,
}

/// Statement kinds.
#[derive(Debug, Clone)]
pub enum Command {
    /// A simple command: `FOO=1 cmd arg >out`.
    Call(CallExpr),
    /// `name() { ... }` or `function name { ... }`.
    FuncDecl(FuncDecl),
    /// Bare assignments with no command: `a=1 b=$(x)`.
    Assign(Vec<Assign>),
    /// `local`, `export`, `declare`, `readonly`, `typeset`, `unset`.
    Decl(DeclClause),
    /// `[ ... ]`, `[[ ... ]]` and `(( ... ))`.
    Test(Vec<Word>),
    /// Any control structure or statement combinator.
    Compound(Compound),
}

/// A simple command invocation.
#[derive(Debug, Clone, Default)]
pub struct CallExpr {
    pub assigns: Vec<Assign>,
    pub args: Vec<Word>,
    /// Redirect targets and here-strings attached to the command.
    pub redirs: Vec<Word>,
    pub pos: Pos,
}

#[derive(Debug, Clone)]
pub struct FuncDecl {
    pub name: String,
    pub body: Box<Stmt>,
    pub pos: Pos,
}

#[derive(Debug, Clone)]
pub struct Assign {
    pub name: String,
    pub value: Option<Word>,
}

#[derive(Debug, Clone)]
pub struct DeclClause {
    pub variant: String,
    pub args: Vec<Word>,
}

/// A control structure: words it evaluates plus nested statements.
#[derive(Debug, Clone)]
pub struct Compound {
    pub kind: CompoundKind,
    pub words: Vec<Word>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompoundKind {
    Pipeline,
    AndOr,
    Negated,
    Block,
    Subshell,
    If,
    While,
    Until,
    For,
    ArithFor,
    Select,
    Case,
    Redirected,
}

/// A shell word, made of adjacent parts.
#[derive(Debug, Clone, Default)]
pub struct Word {
    pub parts: Vec<WordPart>,
    pub pos: Pos,
}

#[derive(Debug, Clone)]
pub enum WordPart {
    Literal(String),
    /// Contents of `'...'` or `$'...'` without the quotes.
    SingleQuoted(String),
    DoubleQuoted(Vec<WordPart>),
    /// `$name`, `${name...}`, `$@`, `$1`, ...
    ///
    /// `operand` holds the words inside `${...}` after the name, such as
    /// the default in `${x:-$(cmd)}`.
    ParamExp { param: String, operand: Vec<WordPart> },
    /// `$(...)` or backticks.
    CmdSubst(Vec<Stmt>),
    /// `<(...)` or `>(...)`.
    ProcSubst(Vec<Stmt>),
    /// `$((...))`: the raw text plus any expansions among its operands.
    Arithmetic { expr: String, operands: Vec<WordPart> },
}

impl Word {
    /// A word holding a single literal part.
    pub fn literal(text: impl Into<String>, pos: Pos) -> Self {
        Self {
            parts: vec![WordPart::Literal(text.into())],
            pos,
        }
    }

    /// Concatenate the statically known text of the word.
    ///
    /// Literal and quoted text is copied through. Expansions cannot be
    /// resolved without running the script, so they render as `$`-prefixed
    /// markers; callers treat any `$` in the result as unresolved.
    pub fn flatten(&self) -> String {
        let mut out = String::new();
        flatten_parts(&self.parts, &mut out);
        out
    }

    /// True if any part (including inside double quotes) expands `$@` or `$*`.
    pub fn has_all_positional(&self) -> bool {
        self.parts.iter().any(WordPart::is_all_positional)
    }
}

impl WordPart {
    /// A plain `$name` expansion.
    pub fn param(name: impl Into<String>) -> Self {
        WordPart::ParamExp {
            param: name.into(),
            operand: Vec::new(),
        }
    }

    fn is_all_positional(&self) -> bool {
        match self {
            WordPart::ParamExp { param, .. } => param == "@" || param == "*",
            WordPart::DoubleQuoted(parts) => parts.iter().any(WordPart::is_all_positional),
            _ => false,
        }
    }
}

fn flatten_parts(parts: &[WordPart], out: &mut String) {
    for part in parts {
        match part {
            WordPart::Literal(s) | WordPart::SingleQuoted(s) => out.push_str(s),
            WordPart::DoubleQuoted(inner) => flatten_parts(inner, out),
            WordPart::ParamExp { param, .. } => {
                out.push_str("${");
                out.push_str(param);
                out.push('}');
            }
            WordPart::CmdSubst(_) | WordPart::ProcSubst(_) => out.push_str("$(...)"),
            WordPart::Arithmetic { .. } => out.push_str("$((...))"),
        }
    }
}
