//! Auto-escaping of print sites.
//!
//! Context analysis runs first and marks the print sites that need escaping;
//! `PerformAutoescape` then gives every marked site its context's default
//! escape unless one of the site's own directives cancels auto-escaping.

use stencil_tree::{DirectiveCall, EscapeContext, NodeKind, NodeRef, Tree};

use super::{visit_children_mut, MutatingVisitor};
use crate::directives::DirectiveRegistry;
use crate::error::Result;

/// Minimal context analysis: every print inside an auto-escaping template
/// that has not been given a context yet is an HTML text site.
#[derive(Debug, Default)]
pub struct MarkEscapingSites {
    in_autoescape_template: bool,
}

impl MarkEscapingSites {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MutatingVisitor for MarkEscapingSites {
    fn setup(&mut self) {
        self.in_autoescape_template = false;
    }

    fn visit(&mut self, tree: &mut Tree, node: NodeRef) -> Result<()> {
        match tree.kind_mut(node) {
            NodeKind::Template { autoescape, .. } => {
                self.in_autoescape_template = *autoescape;
                visit_children_mut(self, tree, node)
            }
            NodeKind::Print { escape, .. } => {
                if self.in_autoescape_template && escape.is_none() {
                    *escape = Some(EscapeContext::Html);
                }
                Ok(())
            }
            _ => visit_children_mut(self, tree, node),
        }
    }
}

/// Puts the default escape directive in front of each marked print site whose
/// directives do not cancel auto-escaping.
pub struct PerformAutoescape<'a> {
    registry: &'a DirectiveRegistry,
    inserted: usize,
}

impl<'a> PerformAutoescape<'a> {
    pub fn new(registry: &'a DirectiveRegistry) -> Self {
        Self {
            registry,
            inserted: 0,
        }
    }

    /// Number of default escapes inserted by the last run.
    pub fn inserted(&self) -> usize {
        self.inserted
    }
}

impl MutatingVisitor for PerformAutoescape<'_> {
    fn setup(&mut self) {
        self.inserted = 0;
    }

    fn visit(&mut self, tree: &mut Tree, node: NodeRef) -> Result<()> {
        if !matches!(tree.kind(node), NodeKind::Print { .. }) {
            return visit_children_mut(self, tree, node);
        }
        let NodeKind::Print {
            directives, escape, ..
        } = tree.kind_mut(node)
        else {
            return Ok(());
        };
        let Some(context) = *escape else {
            return Ok(());
        };

        let mut cancelled = false;
        for call in directives.iter() {
            if self.registry.lookup(&call.name)?.cancels_autoescape() {
                cancelled = true;
                break;
            }
        }
        if !cancelled {
            directives.insert(0, DirectiveCall::new(context.default_directive()));
            self.inserted += 1;
        }
        Ok(())
    }
}
