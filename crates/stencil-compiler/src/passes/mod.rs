//! Visitor pass framework
//!
//! A pass is a stateful traversal of the tree. `setup` resets pass-local
//! state once per run, then `visit` is called on the root; container kinds
//! usually just recurse into their children in source order while the kinds a
//! pass cares about do the real work.
//!
//! Read-only passes (validation, accumulation, code generation) implement
//! [`Visitor`]; passes that rewrite the tree implement [`MutatingVisitor`].
//! Passes are composed by running them one after another over the same tree.

mod autoescape;
mod check_directives;
mod check_overrides;
mod insert_msgs;
mod optimize_bidi;
mod prepend_namespaces;

use stencil_tree::{NodeRef, Tree};

use crate::error::Result;

pub use autoescape::{MarkEscapingSites, PerformAutoescape};
pub use check_directives::CheckDirectives;
pub use check_overrides::CheckOverrides;
pub use insert_msgs::InsertMsgs;
pub use optimize_bidi::{fold_bidi, OptimizeBidi};
pub use prepend_namespaces::PrependNamespaces;

/// A traversal that reads the tree and produces an `Output`.
pub trait Visitor {
    type Output;

    /// Reset pass-local state before a run.
    fn setup(&mut self) {}

    fn visit(&mut self, tree: &Tree, node: NodeRef) -> Result<()>;

    /// Hand out what the run accumulated.
    fn finish(&mut self) -> Self::Output;

    /// Run the pass over the whole tree.
    fn exec(&mut self, tree: &Tree) -> Result<Self::Output> {
        self.setup();
        self.visit(tree, tree.root())?;
        Ok(self.finish())
    }
}

/// Visit each child of `node` in source order.
pub fn visit_children<V: Visitor + ?Sized>(visitor: &mut V, tree: &Tree, node: NodeRef) -> Result<()> {
    for &child in tree.children(node) {
        visitor.visit(tree, child)?;
    }
    Ok(())
}

/// A traversal that rewrites the tree in place.
pub trait MutatingVisitor {
    fn setup(&mut self) {}

    fn visit(&mut self, tree: &mut Tree, node: NodeRef) -> Result<()>;

    fn exec(&mut self, tree: &mut Tree) -> Result<()> {
        self.setup();
        let root = tree.root();
        self.visit(tree, root)
    }
}

/// Visit each child of `node` in source order.
///
/// The child list is copied first, so the visitor may replace or remove the
/// child it is visiting.
pub fn visit_children_mut<V: MutatingVisitor + ?Sized>(
    visitor: &mut V,
    tree: &mut Tree,
    node: NodeRef,
) -> Result<()> {
    let children = tree.children(node).to_vec();
    for child in children {
        visitor.visit(tree, child)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stencil_tree::{Expr, NodeKind};

    /// Collects the source text of every raw text node, in order.
    #[derive(Default)]
    struct CollectText {
        seen: Vec<String>,
        runs: usize,
    }

    impl Visitor for CollectText {
        type Output = Vec<String>;

        fn setup(&mut self) {
            self.seen.clear();
            self.runs += 1;
        }

        fn visit(&mut self, tree: &Tree, node: NodeRef) -> Result<()> {
            match tree.kind(node) {
                NodeKind::RawText(text) => {
                    self.seen.push(text.clone());
                    Ok(())
                }
                _ => visit_children(self, tree, node),
            }
        }

        fn finish(&mut self) -> Vec<String> {
            std::mem::take(&mut self.seen)
        }
    }

    /// Removes every print node.
    struct StripPrints;

    impl MutatingVisitor for StripPrints {
        fn visit(&mut self, tree: &mut Tree, node: NodeRef) -> Result<()> {
            if matches!(tree.kind(node), NodeKind::Print { .. }) {
                tree.detach(node);
                return Ok(());
            }
            visit_children_mut(self, tree, node)
        }
    }

    fn sample() -> Tree {
        let mut tree = Tree::new();
        let root = tree.root();
        let f = tree
            .add(root, NodeKind::File { path: "a.stn".into(), namespace: "app".into() })
            .unwrap();
        let t = tree.add(f, NodeKind::template("app.main")).unwrap();
        tree.add(t, NodeKind::RawText("a".into())).unwrap();
        tree.add(t, NodeKind::print(Expr::data("x"))).unwrap();
        let if_node = tree.add(t, NodeKind::If).unwrap();
        let cond = tree
            .add(if_node, NodeKind::IfCond { condition: Expr::Bool(true) })
            .unwrap();
        tree.add(cond, NodeKind::RawText("b".into())).unwrap();
        tree.add(t, NodeKind::RawText("c".into())).unwrap();
        tree
    }

    #[test]
    fn test_visitor_source_order_and_setup_per_run() {
        let tree = sample();
        let mut pass = CollectText::default();

        assert_eq!(pass.exec(&tree).unwrap(), vec!["a", "b", "c"]);
        assert_eq!(pass.exec(&tree).unwrap(), vec!["a", "b", "c"]);
        assert_eq!(pass.runs, 2);
    }

    #[test]
    fn test_mutating_visitor_can_remove_visited_node() {
        let mut tree = sample();
        StripPrints.exec(&mut tree).unwrap();

        let source = tree.to_source_string(tree.root());
        assert!(!source.contains("{$x}"));
        assert!(source.contains("{template app.main}a{if true}b{/if}c{/template}"));
    }
}
