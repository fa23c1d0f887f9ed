/// Tree dumping utilities for testing and debugging
///
/// Provides human-readable, indented representations of a tree, one node per
/// line with its stable id.

use crate::ast::NodeKind;
use crate::tree::{NodeRef, Tree};
use std::fmt::Write as FmtWrite;

/// Dump the subtree rooted at `node` as a pretty-printed tree
pub fn dump_tree(tree: &Tree, node: NodeRef) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_node(&mut out, tree, node, 0);
    out
}

fn write_node(out: &mut String, tree: &Tree, node: NodeRef, indent: usize) -> std::fmt::Result {
    let prefix = "  ".repeat(indent);
    let id = tree.id(node);
    match tree.kind(node) {
        NodeKind::FileSet => writeln!(out, "{}FileSet [{}]", prefix, id)?,
        NodeKind::File { path, namespace } => {
            writeln!(out, "{}File: {} (namespace {}) [{}]", prefix, path, namespace, id)?
        }
        NodeKind::Template {
            name,
            is_override,
            autoescape,
        } => {
            let mut flags = Vec::new();
            if *is_override {
                flags.push("override");
            }
            if !*autoescape {
                flags.push("no-autoescape");
            }
            if flags.is_empty() {
                writeln!(out, "{}Template: {} [{}]", prefix, name, id)?;
            } else {
                writeln!(out, "{}Template: {} ({}) [{}]", prefix, name, flags.join(", "), id)?;
            }
        }
        NodeKind::RawText(text) => writeln!(out, "{}RawText: {:?} [{}]", prefix, text, id)?,
        NodeKind::Print {
            expr,
            directives,
            escape,
        } => {
            write!(out, "{}Print: {}", prefix, expr.to_source_string())?;
            for directive in directives {
                write!(out, " {}", directive.to_source_string())?;
            }
            if let Some(context) = escape {
                write!(out, " (escape: {:?})", context)?;
            }
            writeln!(out, " [{}]", id)?;
        }
        NodeKind::If => writeln!(out, "{}If [{}]", prefix, id)?,
        NodeKind::IfCond { condition } => {
            writeln!(out, "{}IfCond: {} [{}]", prefix, condition.to_source_string(), id)?
        }
        NodeKind::IfElse => writeln!(out, "{}IfElse [{}]", prefix, id)?,
        NodeKind::Msg { key, desc } => writeln!(out, "{}Msg: {} {:?} [{}]", prefix, key, desc, id)?,
        NodeKind::Call {
            callee,
            pass_all_data,
        } => {
            let data = if *pass_all_data { " data=all" } else { "" };
            writeln!(out, "{}Call: {}{} [{}]", prefix, callee, data, id)?
        }
    }
    for &child in tree.children(node) {
        write_node(out, tree, child, indent + 1)?;
    }
    Ok(())
}
