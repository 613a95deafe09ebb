//! Tree-sitter backed shell parser.
//!
//! Parses with the bash grammar and lowers the concrete syntax tree into the
//! owned [`ast`](super::ast) types. Node kinds not listed here fall through to
//! a generic rule: statement kinds become nested statements and everything
//! else becomes a word built from its text and named children.

use std::cell::RefCell;

use tree_sitter::{Language, Node, Parser as TsParser};

use super::ast::{
    Assign, CallExpr, Command, Compound, CompoundKind, DeclClause, FuncDecl, Pos, Program, Stmt,
    Word, WordPart,
};
use crate::error::{AnalysisError, ParseError};

thread_local! {
    static BASH_PARSER: RefCell<Option<TsParser>> = const { RefCell::new(None) };
}

/// The bash grammar used for all shell dialects.
pub fn language() -> Language {
    tree_sitter_bash::LANGUAGE.into()
}

/// Parse shell source into a [`Program`].
///
/// `label` only appears in the error. Any ERROR or MISSING node in the tree
/// fails the whole parse.
pub fn parse(source: &str, label: &str) -> Result<Program, AnalysisError> {
    let tree = BASH_PARSER.with(|cell| -> Result<tree_sitter::Tree, AnalysisError> {
        let mut slot = cell.borrow_mut();
        if slot.is_none() {
            let mut parser = TsParser::new();
            parser.set_language(&language())?;
            *slot = Some(parser);
        }
        let Some(parser) = slot.as_mut() else {
            return Err(AnalysisError::NoTree);
        };
        parser.parse(source, None).ok_or(AnalysisError::NoTree)
    })?;

    let root = tree.root_node();
    if root.has_error() {
        return Err(AnalysisError::Parse(syntax_error(root, source, label)));
    }

    let lower = Lower { src: source };
    Ok(Program {
        stmts: lower.stmts_in(root),
        source: source.to_string(),
    })
}

fn syntax_error(root: Node, source: &str, label: &str) -> ParseError {
    let (pos, message) = match first_error(root) {
        Some(node) if node.is_missing() => (
            Pos::from_node(node),
            format!("expected {:?}", node.kind()),
        ),
        Some(node) => {
            let text = node.utf8_text(source.as_bytes()).unwrap_or("");
            let near: String = text.lines().next().unwrap_or("").chars().take(40).collect();
            (Pos::from_node(node), format!("syntax error near {:?}", near.trim()))
        }
        None => (Pos::from_node(root), "syntax error".to_string()),
    };
    ParseError {
        label: label.to_string(),
        line: pos.line,
        column: pos.column,
        message,
    }
}

/// First ERROR or MISSING node in document order.
fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}

fn is_statement(kind: &str) -> bool {
    matches!(
        kind,
        "command"
            | "redirected_statement"
            | "variable_assignment"
            | "variable_assignments"
            | "declaration_command"
            | "unset_command"
            | "test_command"
            | "negated_command"
            | "function_definition"
            | "pipeline"
            | "list"
            | "subshell"
            | "compound_statement"
            | "if_statement"
            | "while_statement"
            | "for_statement"
            | "c_style_for_statement"
            | "case_statement"
    )
}

fn is_redirect(kind: &str) -> bool {
    matches!(
        kind,
        "file_redirect" | "heredoc_redirect" | "herestring_redirect"
    )
}

/// Nodes whose children belong to the enclosing compound.
fn is_clause(kind: &str) -> bool {
    matches!(kind, "do_group" | "elif_clause" | "else_clause" | "case_item") || is_redirect(kind)
}

/// Punctuation-like nodes that carry nothing to analyze.
fn is_ignored(kind: &str) -> bool {
    matches!(
        kind,
        "comment" | "heredoc_start" | "heredoc_end" | "file_descriptor" | "variable_name"
    )
}

fn named_children(node: Node) -> Vec<Node> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

struct Lower<'s> {
    src: &'s str,
}

impl<'s> Lower<'s> {
    fn text(&self, node: Node) -> &'s str {
        node.utf8_text(self.src.as_bytes()).unwrap_or("")
    }

    fn stmts_in(&self, node: Node) -> Vec<Stmt> {
        named_children(node)
            .into_iter()
            .filter(|c| is_statement(c.kind()))
            .map(|c| self.stmt(c))
            .collect()
    }

    fn stmt(&self, node: Node) -> Stmt {
        let pos = Pos::from_node(node);
        let cmd = match node.kind() {
            "command" => Command::Call(self.call(node)),
            "variable_assignment" => Command::Assign(vec![self.assign(node)]),
            "variable_assignments" => Command::Assign(
                named_children(node)
                    .into_iter()
                    .filter(|c| c.kind() == "variable_assignment")
                    .map(|c| self.assign(c))
                    .collect(),
            ),
            "declaration_command" | "unset_command" => Command::Decl(DeclClause {
                variant: node
                    .child(0)
                    .map(|c| self.text(c).to_string())
                    .unwrap_or_default(),
                args: named_children(node)
                    .into_iter()
                    .filter(|c| c.kind() != "comment")
                    .map(|c| self.word(c))
                    .collect(),
            }),
            "test_command" => Command::Test(
                named_children(node)
                    .into_iter()
                    .map(|c| self.word(c))
                    .collect(),
            ),
            "function_definition" => Command::FuncDecl(self.func_decl(node, pos)),
            kind => Command::Compound(self.compound(node, compound_kind(node, kind))),
        };
        Stmt { cmd, pos }
    }

    fn call(&self, node: Node) -> CallExpr {
        let mut call = CallExpr {
            pos: Pos::from_node(node),
            ..Default::default()
        };
        for child in named_children(node) {
            match child.kind() {
                "variable_assignment" => call.assigns.push(self.assign(child)),
                "comment" => {}
                kind if is_redirect(kind) => {
                    for target in named_children(child) {
                        if !is_ignored(target.kind()) && !is_statement(target.kind()) {
                            call.redirs.push(self.word(target));
                        }
                    }
                }
                _ => call.args.push(self.word(child)),
            }
        }
        strip_time_keyword(&mut call.args);
        call
    }

    fn assign(&self, node: Node) -> Assign {
        let name = node
            .child_by_field_name("name")
            .or_else(|| node.named_child(0))
            .map(|n| self.text(n).to_string())
            .unwrap_or_default();
        Assign {
            name,
            value: node.child_by_field_name("value").map(|v| self.word(v)),
        }
    }

    fn func_decl(&self, node: Node, pos: Pos) -> FuncDecl {
        let name = node
            .child_by_field_name("name")
            .map(|n| self.text(n).to_string())
            .unwrap_or_default();
        let body = node
            .child_by_field_name("body")
            .filter(|b| is_statement(b.kind()))
            .map(|b| self.stmt(b))
            .unwrap_or(Stmt {
                cmd: Command::Compound(Compound {
                    kind: CompoundKind::Block,
                    words: Vec::new(),
                    body: Vec::new(),
                }),
                pos,
            });
        FuncDecl {
            name,
            body: Box::new(body),
            pos,
        }
    }

    fn compound(&self, node: Node, kind: CompoundKind) -> Compound {
        let mut compound = Compound {
            kind,
            words: Vec::new(),
            body: Vec::new(),
        };
        self.collect(node, &mut compound);
        compound
    }

    fn collect(&self, node: Node, into: &mut Compound) {
        for child in named_children(node) {
            let kind = child.kind();
            if is_statement(kind) {
                into.body.push(self.stmt(child));
            } else if is_clause(kind) {
                self.collect(child, into);
            } else if !is_ignored(kind) {
                into.words.push(self.word(child));
            }
        }
    }

    fn word(&self, node: Node) -> Word {
        Word {
            parts: self.parts(node),
            pos: Pos::from_node(node),
        }
    }

    fn parts(&self, node: Node) -> Vec<WordPart> {
        match node.kind() {
            "word" | "number" | "string_content" | "variable_name" | "heredoc_content" => {
                vec![WordPart::Literal(self.text(node).to_string())]
            }
            "raw_string" => vec![WordPart::SingleQuoted(
                strip(self.text(node), "'", "'").to_string(),
            )],
            "ansi_c_string" => vec![WordPart::SingleQuoted(
                strip(self.text(node), "$'", "'").to_string(),
            )],
            "string" => {
                // The quotes are one byte each.
                let start = node.start_byte() + 1;
                let end = node.end_byte().saturating_sub(1).max(start);
                vec![WordPart::DoubleQuoted(self.gaps(node, start, end))]
            }
            "simple_expansion" => vec![WordPart::param(self.param_name(node))],
            "expansion" => vec![WordPart::ParamExp {
                param: self.param_name(node),
                operand: self.operand(node),
            }],
            "command_substitution" => vec![WordPart::CmdSubst(self.stmts_in(node))],
            "process_substitution" => vec![WordPart::ProcSubst(self.stmts_in(node))],
            "arithmetic_expansion" => vec![WordPart::Arithmetic {
                expr: self.text(node).to_string(),
                operands: self.expansions_in(node),
            }],
            _ => self.gaps(node, node.start_byte(), node.end_byte()),
        }
    }

    /// Lower named children in `[start, end)`, keeping the text between them
    /// as literals.
    fn gaps(&self, node: Node, start: usize, end: usize) -> Vec<WordPart> {
        let mut parts = Vec::new();
        let mut at = start;
        for child in named_children(node) {
            if child.start_byte() < at || child.end_byte() > end {
                continue;
            }
            if child.start_byte() > at {
                push_literal(&mut parts, self.src.get(at..child.start_byte()));
            }
            if is_statement(child.kind()) {
                // e.g. a pipeline continuing a heredoc line
                parts.push(WordPart::CmdSubst(vec![self.stmt(child)]));
            } else {
                parts.extend(self.parts(child));
            }
            at = child.end_byte();
        }
        if at < end {
            push_literal(&mut parts, self.src.get(at..end));
        }
        parts
    }

    fn param_name(&self, node: Node) -> String {
        if let Some(var) = param_node(node) {
            return self.text(var).to_string();
        }
        let text = self.text(node);
        let text = text.strip_prefix('$').unwrap_or(text);
        strip(text, "{", "}").to_string()
    }

    /// Everything inside `${...}` except the parameter name.
    fn operand(&self, node: Node) -> Vec<WordPart> {
        let name = param_node(node).map(|n| n.id());
        let mut parts = Vec::new();
        for child in named_children(node) {
            if Some(child.id()) == name {
                continue;
            }
            if is_statement(child.kind()) {
                parts.push(WordPart::CmdSubst(vec![self.stmt(child)]));
            } else {
                parts.extend(self.parts(child));
            }
        }
        parts
    }

    /// Expansions and substitutions anywhere below an arithmetic node.
    fn expansions_in(&self, node: Node) -> Vec<WordPart> {
        let mut parts = Vec::new();
        for child in named_children(node) {
            match child.kind() {
                "command_substitution"
                | "process_substitution"
                | "simple_expansion"
                | "expansion"
                | "arithmetic_expansion"
                | "string" => parts.extend(self.parts(child)),
                _ => parts.extend(self.expansions_in(child)),
            }
        }
        parts
    }
}

fn param_node(node: Node) -> Option<Node> {
    named_children(node)
        .into_iter()
        .find(|c| matches!(c.kind(), "variable_name" | "special_variable_name"))
}

/// Drop a leading `time` or `time -p` so the timed command is in call
/// position.
fn strip_time_keyword(args: &mut Vec<Word>) {
    let is_bare = |word: &Word, text: &str| {
        matches!(word.parts.as_slice(), [WordPart::Literal(t)] if t == text)
    };
    if !args.first().is_some_and(|w| is_bare(w, "time")) {
        return;
    }
    let keyword_len = if args.get(1).is_some_and(|w| is_bare(w, "-p")) {
        2
    } else {
        1
    };
    args.drain(..keyword_len);
}

fn compound_kind(node: Node, kind: &str) -> CompoundKind {
    let first = node.child(0).map(|c| c.kind()).unwrap_or("");
    match kind {
        "pipeline" => CompoundKind::Pipeline,
        "list" => CompoundKind::AndOr,
        "negated_command" => CompoundKind::Negated,
        "subshell" => CompoundKind::Subshell,
        "if_statement" => CompoundKind::If,
        "while_statement" if first == "until" => CompoundKind::Until,
        "while_statement" => CompoundKind::While,
        "for_statement" if first == "select" => CompoundKind::Select,
        "for_statement" => CompoundKind::For,
        "c_style_for_statement" => CompoundKind::ArithFor,
        "case_statement" => CompoundKind::Case,
        "redirected_statement" => CompoundKind::Redirected,
        _ => CompoundKind::Block,
    }
}

fn strip<'a>(text: &'a str, prefix: &str, suffix: &str) -> &'a str {
    let text = text.strip_prefix(prefix).unwrap_or(text);
    text.strip_suffix(suffix).unwrap_or(text)
}

fn push_literal(parts: &mut Vec<WordPart>, text: Option<&str>) {
    match text {
        Some(t) if !t.is_empty() => parts.push(WordPart::Literal(t.to_string())),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_call(program: &Program) -> &CallExpr {
        match &program.stmts[0].cmd {
            Command::Call(c) => c,
            other => panic!("expected call, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_simple_command() {
        let program = parse("grep -q pattern file.txt\n", "t").unwrap();
        let call = first_call(&program);
        let args: Vec<String> = call.args.iter().map(Word::flatten).collect();
        assert_eq!(args, vec!["grep", "-q", "pattern", "file.txt"]);
        assert_eq!(call.pos.line, 1);
    }

    #[test]
    fn test_parse_positions_are_one_based() {
        let program = parse("# comment\n\n  ls -l\n", "t").unwrap();
        assert_eq!(program.stmts.len(), 1);
        assert_eq!(program.stmts[0].pos, Pos { line: 3, column: 3 });
    }

    #[test]
    fn test_parse_quoting() {
        let program = parse("echo 'a b' \"c $HOME\" $'d'\n", "t").unwrap();
        let call = first_call(&program);
        assert!(matches!(&call.args[1].parts[0], WordPart::SingleQuoted(s) if s == "a b"));
        match &call.args[2].parts[0] {
            WordPart::DoubleQuoted(inner) => {
                assert!(inner
                    .iter()
                    .any(|p| matches!(p, WordPart::ParamExp { param, .. } if param == "HOME")));
            }
            other => panic!("expected double quoted, got {:?}", other),
        }
        assert_eq!(call.args[3].flatten(), "d");
    }

    #[test]
    fn test_parse_positional_expansions() {
        let program = parse("\"$@\"\n$*\n", "t").unwrap();
        for stmt in &program.stmts {
            match &stmt.cmd {
                Command::Call(c) => assert!(c.args[0].has_all_positional()),
                other => panic!("expected call, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_parse_function_definition() {
        let program = parse("greet() {\n  echo hi\n}\nfunction other { :; }\n", "t").unwrap();
        let names: Vec<&str> = program
            .stmts
            .iter()
            .filter_map(|s| match &s.cmd {
                Command::FuncDecl(f) => Some(f.name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(names, vec!["greet", "other"]);
    }

    #[test]
    fn test_parse_error_missing_fi() {
        let err = parse("if true; then\n  echo hi\n", "broken.sh").unwrap_err();
        match err {
            AnalysisError::Parse(e) => {
                assert_eq!(e.label, "broken.sh");
                assert!(e.line >= 1);
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_expansion_operand() {
        let program = parse("x=${y:-$(hostname)}\n", "t").unwrap();
        let Command::Assign(assigns) = &program.stmts[0].cmd else {
            panic!("expected assignment");
        };
        let value = assigns[0].value.as_ref().unwrap();
        match &value.parts[0] {
            WordPart::ParamExp { param, operand } => {
                assert_eq!(param, "y");
                assert!(operand.iter().any(|p| matches!(p, WordPart::CmdSubst(_))));
            }
            other => panic!("expected expansion, got {:?}", other),
        }
        assert_eq!(value.flatten(), "${y}");
    }

    #[test]
    fn test_parse_time_keyword_dropped() {
        let program = parse("time -p sort -h f\n", "t").unwrap();
        let args: Vec<String> = first_call(&program).args.iter().map(Word::flatten).collect();
        assert_eq!(args, vec!["sort", "-h", "f"]);
    }

    #[test]
    fn test_parse_empty_source() {
        let program = parse("", "empty").unwrap();
        assert!(program.stmts.is_empty());
    }
}
