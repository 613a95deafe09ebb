//! Pre-order traversal over the shell syntax tree.

use super::ast::{Assign, CallExpr, Command, FuncDecl, Program, Stmt, Word, WordPart};

/// A borrowed view of one tree node handed to a visitor.
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    Stmt(&'a Stmt),
    Call(&'a CallExpr),
    FuncDecl(&'a FuncDecl),
    Word(&'a Word),
    Part(&'a WordPart),
}

/// Visit every node of a program in document order.
///
/// The visitor returns `false` to skip the children of the node it was given.
pub fn walk<'a, F>(program: &'a Program, visit: &mut F)
where
    F: FnMut(Node<'a>) -> bool,
{
    walk_stmts(&program.stmts, visit);
}

pub fn walk_stmts<'a, F>(stmts: &'a [Stmt], visit: &mut F)
where
    F: FnMut(Node<'a>) -> bool,
{
    for stmt in stmts {
        walk_stmt(stmt, visit);
    }
}

pub fn walk_stmt<'a, F>(stmt: &'a Stmt, visit: &mut F)
where
    F: FnMut(Node<'a>) -> bool,
{
    if !visit(Node::Stmt(stmt)) {
        return;
    }

    match &stmt.cmd {
        Command::Call(call) => {
            if !visit(Node::Call(call)) {
                return;
            }
            walk_assigns(&call.assigns, visit);
            walk_words(&call.args, visit);
            walk_words(&call.redirs, visit);
        }
        Command::FuncDecl(decl) => {
            if visit(Node::FuncDecl(decl)) {
                walk_stmt(&decl.body, visit);
            }
        }
        Command::Assign(assigns) => walk_assigns(assigns, visit),
        Command::Decl(decl) => walk_words(&decl.args, visit),
        Command::Test(words) => walk_words(words, visit),
        Command::Compound(compound) => {
            walk_words(&compound.words, visit);
            walk_stmts(&compound.body, visit);
        }
    }
}

fn walk_assigns<'a, F>(assigns: &'a [Assign], visit: &mut F)
where
    F: FnMut(Node<'a>) -> bool,
{
    for value in assigns.iter().filter_map(|a| a.value.as_ref()) {
        walk_word(value, visit);
    }
}

fn walk_words<'a, F>(words: &'a [Word], visit: &mut F)
where
    F: FnMut(Node<'a>) -> bool,
{
    for word in words {
        walk_word(word, visit);
    }
}

pub fn walk_word<'a, F>(word: &'a Word, visit: &mut F)
where
    F: FnMut(Node<'a>) -> bool,
{
    if !visit(Node::Word(word)) {
        return;
    }
    for part in &word.parts {
        walk_part(part, visit);
    }
}

fn walk_part<'a, F>(part: &'a WordPart, visit: &mut F)
where
    F: FnMut(Node<'a>) -> bool,
{
    if !visit(Node::Part(part)) {
        return;
    }
    match part {
        WordPart::DoubleQuoted(inner)
        | WordPart::ParamExp { operand: inner, .. }
        | WordPart::Arithmetic { operands: inner, .. } => {
            for p in inner {
                walk_part(p, visit);
            }
        }
        WordPart::CmdSubst(stmts) | WordPart::ProcSubst(stmts) => walk_stmts(stmts, visit),
        WordPart::Literal(_) | WordPart::SingleQuoted(_) => {}
    }
}
