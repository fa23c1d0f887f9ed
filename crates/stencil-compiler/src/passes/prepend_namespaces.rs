//! Rewrites partial template and callee names into full names.

use stencil_tree::{is_partial_name, NodeKind, NodeRef, Tree};

use super::{visit_children_mut, MutatingVisitor};
use crate::error::Result;

/// Prepends the enclosing file's namespace to every partial name, so that
/// `.main` in `{namespace app}` becomes `app.main`.
#[derive(Debug, Default)]
pub struct PrependNamespaces {
    namespace: String,
}

impl PrependNamespaces {
    pub fn new() -> Self {
        Self::default()
    }

    fn qualify(&self, name: &mut String) {
        if is_partial_name(name) {
            *name = format!("{}{}", self.namespace, name);
        }
    }
}

impl MutatingVisitor for PrependNamespaces {
    fn setup(&mut self) {
        self.namespace.clear();
    }

    fn visit(&mut self, tree: &mut Tree, node: NodeRef) -> Result<()> {
        match tree.kind_mut(node) {
            NodeKind::File { namespace, .. } => {
                self.namespace = namespace.clone();
                visit_children_mut(self, tree, node)
            }
            NodeKind::Template { name, .. } => {
                self.qualify(name);
                visit_children_mut(self, tree, node)
            }
            NodeKind::Call { callee, .. } => {
                self.qualify(callee);
                Ok(())
            }
            NodeKind::FileSet
            | NodeKind::If
            | NodeKind::IfCond { .. }
            | NodeKind::IfElse
            | NodeKind::Msg { .. } => visit_children_mut(self, tree, node),
            NodeKind::RawText(_) | NodeKind::Print { .. } => Ok(()),
        }
    }
}
