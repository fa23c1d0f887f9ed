//! Arena-backed syntax tree with single ownership of every node.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::ast::NodeKind;
use crate::error::{Result, TreeError};

/// Source of process-unique node ids.
static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(0);

fn next_node_id() -> String {
    format!("n{}", NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
}

/// Handle to a node inside one [`Tree`].
///
/// Handles are only meaningful for the tree that created them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeRef(usize);

#[derive(Debug)]
struct NodeData {
    /// Stable identity, used for cross-referencing and diagnostics.
    id: String,
    kind: NodeKind,
    parent: Option<NodeRef>,
    children: Vec<NodeRef>,
}

/// The syntax tree for one file set.
///
/// Nodes detached from the tree stay in the arena as orphans; they can be
/// re-attached later but are not reachable from the root.
#[derive(Debug)]
pub struct Tree {
    nodes: Vec<NodeData>,
    root: NodeRef,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// Create a tree holding only an empty file-set root.
    pub fn new() -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            root: NodeRef(0),
        };
        tree.root = tree.create(NodeKind::FileSet);
        tree
    }

    pub fn root(&self) -> NodeRef {
        self.root
    }

    /// Create a detached node.
    pub fn create(&mut self, kind: NodeKind) -> NodeRef {
        let node = NodeRef(self.nodes.len());
        self.nodes.push(NodeData {
            id: next_node_id(),
            kind,
            parent: None,
            children: Vec::new(),
        });
        node
    }

    /// Create a node and append it to `parent`.
    pub fn add(&mut self, parent: NodeRef, kind: NodeKind) -> Result<NodeRef> {
        let node = self.create(kind);
        self.append_child(parent, node)?;
        Ok(node)
    }

    pub fn id(&self, node: NodeRef) -> &str {
        &self.nodes[node.0].id
    }

    pub fn kind(&self, node: NodeRef) -> &NodeKind {
        &self.nodes[node.0].kind
    }

    pub fn kind_mut(&mut self, node: NodeRef) -> &mut NodeKind {
        &mut self.nodes[node.0].kind
    }

    pub fn parent(&self, node: NodeRef) -> Option<NodeRef> {
        self.nodes[node.0].parent
    }

    /// Children in source order.
    pub fn children(&self, node: NodeRef) -> &[NodeRef] {
        &self.nodes[node.0].children
    }

    /// The file nodes of this file set, in input order.
    pub fn files(&self) -> &[NodeRef] {
        self.children(self.root)
    }

    /// Append `child` as the last child of `parent`, detaching it from any
    /// previous parent first.
    pub fn append_child(&mut self, parent: NodeRef, child: NodeRef) -> Result<()> {
        let mut index = self.children(parent).len();
        if self.parent(child) == Some(parent) {
            // Moving to the end of its own parent.
            index -= 1;
        }
        self.insert_child(parent, index, child)
    }

    /// Insert `child` so that it ends up at `index` among `parent`'s children.
    ///
    /// Fails without touching the tree if `child` is `parent` itself, one of
    /// its ancestors, or the root, or if `parent` cannot own children.
    pub fn insert_child(&mut self, parent: NodeRef, index: usize, child: NodeRef) -> Result<()> {
        if !self.kind(parent).is_container() {
            return Err(TreeError::invalid(
                self.id(parent),
                format!("{} nodes cannot have children", self.kind(parent).label()),
            ));
        }
        if child == self.root {
            return Err(TreeError::invalid(
                self.id(child),
                "the file-set root cannot become a child",
            ));
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(TreeError::invalid(
                self.id(child),
                format!("appending to {} would create a cycle", self.id(parent)),
            ));
        }

        let mut len = self.children(parent).len();
        if self.parent(child) == Some(parent) {
            len -= 1;
        }
        if index > len {
            return Err(TreeError::invalid(
                self.id(parent),
                format!("insert index {} out of range for {} children", index, len),
            ));
        }

        self.detach(child);
        self.nodes[parent.0].children.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
        Ok(())
    }

    /// Remove `node` from its parent. Returns its former index, if it had a parent.
    pub fn detach(&mut self, node: NodeRef) -> Option<usize> {
        let parent = self.nodes[node.0].parent.take()?;
        let siblings = &mut self.nodes[parent.0].children;
        let index = siblings.iter().position(|&c| c == node)?;
        siblings.remove(index);
        Some(index)
    }

    /// Put `replacements` where `node` was, in order, and detach `node`.
    pub fn replace_with(&mut self, node: NodeRef, replacements: &[NodeRef]) -> Result<()> {
        let parent = self.parent(node).ok_or_else(|| {
            TreeError::invalid(self.id(node), "cannot replace a node that has no parent")
        })?;
        for &replacement in replacements {
            if replacement == node || self.is_ancestor_or_self(replacement, parent) {
                return Err(TreeError::invalid(
                    self.id(replacement),
                    format!("cannot replace {} with itself or an ancestor", self.id(node)),
                ));
            }
        }

        for &replacement in replacements {
            self.detach(replacement);
        }
        let index = self
            .detach(node)
            .ok_or_else(|| TreeError::invalid(self.id(node), "node missing from its parent"))?;
        for (offset, &replacement) in replacements.iter().enumerate() {
            self.insert_child(parent, index + offset, replacement)?;
        }
        Ok(())
    }

    /// True if `candidate` is `node` or lies on the path from `node` to its root.
    pub fn is_ancestor_or_self(&self, candidate: NodeRef, node: NodeRef) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == candidate {
                return true;
            }
            current = self.parent(n);
        }
        false
    }

    /// Closest proper ancestor of `node` matching `pred`.
    pub fn nearest_ancestor(
        &self,
        node: NodeRef,
        pred: impl Fn(&NodeKind) -> bool,
    ) -> Option<NodeRef> {
        let mut current = self.parent(node);
        while let Some(n) = current {
            if pred(self.kind(n)) {
                return Some(n);
            }
            current = self.parent(n);
        }
        None
    }

    /// Path of the file that contains `node`, if any.
    pub fn file_path_of(&self, node: NodeRef) -> Option<&str> {
        let file = self.nearest_ancestor(node, |k| matches!(k, NodeKind::File { .. }))?;
        match self.kind(file) {
            NodeKind::File { path, .. } => Some(path),
            _ => None,
        }
    }

    /// `node` and everything below it, in pre-order (source order).
    pub fn descendants(&self, node: NodeRef) -> Vec<NodeRef> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.children(n).iter().rev());
        }
        out
    }

    /// Find a node reachable from the root by its stable id.
    pub fn node_by_id(&self, id: &str) -> Option<NodeRef> {
        self.descendants(self.root)
            .into_iter()
            .find(|&n| self.id(n) == id)
    }

    /// Number of nodes reachable from the root.
    pub fn len(&self) -> usize {
        self.descendants(self.root).len()
    }

    pub fn is_empty(&self) -> bool {
        self.files().is_empty()
    }

    /// Independent copy of everything reachable from the root, with fresh ids.
    ///
    /// Use this when two callers need to run mutating passes over the same
    /// source at the same time.
    pub fn deep_copy(&self) -> Tree {
        let mut copy = Tree::new();
        let root = copy.root;
        self.copy_children(self.root, &mut copy, root);
        copy
    }

    fn copy_children(&self, from: NodeRef, into: &mut Tree, to: NodeRef) {
        for &child in self.children(from) {
            let new_child = into.create(self.kind(child).clone());
            into.nodes[to.0].children.push(new_child);
            into.nodes[new_child.0].parent = Some(to);
            self.copy_children(child, into, new_child);
        }
    }
}
