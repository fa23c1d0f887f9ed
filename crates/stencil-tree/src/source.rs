//! Reconstruction of template source text from the tree.
//!
//! Each node contributes its own literal fragments around the reconstruction
//! of its children. Reconstruction never mutates the tree.

use std::fmt::Write as _;

use crate::ast::NodeKind;
use crate::tree::{NodeRef, Tree};

impl Tree {
    /// Rebuild the template source for the subtree rooted at `node`.
    pub fn to_source_string(&self, node: NodeRef) -> String {
        let mut out = String::new();
        self.write_source(&mut out, node);
        out
    }

    fn write_children_source(&self, out: &mut String, node: NodeRef) {
        for &child in self.children(node) {
            self.write_source(out, child);
        }
    }

    fn write_source(&self, out: &mut String, node: NodeRef) {
        match self.kind(node) {
            NodeKind::FileSet => self.write_children_source(out, node),
            NodeKind::File { namespace, .. } => {
                let _ = write!(out, "{{namespace {}}}\n\n", namespace);
                self.write_children_source(out, node);
            }
            NodeKind::Template {
                name,
                is_override,
                autoescape,
            } => {
                let _ = write!(out, "{{template {}", name);
                if *is_override {
                    out.push_str(" override=\"true\"");
                }
                if !*autoescape {
                    out.push_str(" autoescape=\"false\"");
                }
                out.push('}');
                self.write_children_source(out, node);
                out.push_str("{/template}\n");
            }
            NodeKind::RawText(text) => {
                for ch in text.chars() {
                    match ch {
                        '{' => out.push_str("{lb}"),
                        '}' => out.push_str("{rb}"),
                        other => out.push(other),
                    }
                }
            }
            NodeKind::Print {
                expr, directives, ..
            } => {
                out.push('{');
                out.push_str(&expr.to_source_string());
                for directive in directives {
                    out.push(' ');
                    out.push_str(&directive.to_source_string());
                }
                out.push('}');
            }
            // The first branch writes the `{if}` tag itself.
            NodeKind::If => {
                self.write_children_source(out, node);
                out.push_str("{/if}");
            }
            NodeKind::IfCond { condition } => {
                let is_first = self
                    .parent(node)
                    .map(|p| self.children(p).first() == Some(&node))
                    .unwrap_or(true);
                let tag = if is_first { "if" } else { "elseif" };
                let _ = write!(out, "{{{} {}}}", tag, condition.to_source_string());
                self.write_children_source(out, node);
            }
            NodeKind::IfElse => {
                out.push_str("{else}");
                self.write_children_source(out, node);
            }
            NodeKind::Msg { key, desc } => {
                let _ = write!(out, "{{msg key=\"{}\" desc=\"{}\"}}", key, desc);
                self.write_children_source(out, node);
                out.push_str("{/msg}");
            }
            NodeKind::Call {
                callee,
                pass_all_data,
            } => {
                let _ = write!(out, "{{call {}", callee);
                if *pass_all_data {
                    out.push_str(" data=\"all\"");
                }
                out.push_str(" /}");
            }
        }
    }
}
