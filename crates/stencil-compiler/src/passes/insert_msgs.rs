//! Message substitution.

use stencil_tree::{NodeKind, NodeRef, Tree};

use super::{visit_children_mut, MutatingVisitor};
use crate::error::{CompileError, Result};
use crate::msgs::{find_placeholder, MsgBundle, MsgPart};

/// Replaces every `{msg}` node with its translation from the bundle, or with
/// its own source-language content when there is no bundle or no translation.
///
/// Placeholders in a translation reuse the print nodes of the original message.
pub struct InsertMsgs<'a> {
    bundle: Option<&'a MsgBundle>,
    translated: usize,
    untranslated: usize,
}

impl<'a> InsertMsgs<'a> {
    pub fn new(bundle: Option<&'a MsgBundle>) -> Self {
        Self {
            bundle,
            translated: 0,
            untranslated: 0,
        }
    }

    /// Build the nodes a translation expands to.
    fn translation_nodes(
        tree: &mut Tree,
        msg: NodeRef,
        key: &str,
        parts: &[MsgPart],
    ) -> Result<Vec<NodeRef>> {
        let mut nodes = Vec::with_capacity(parts.len());
        for part in parts {
            let node = match part {
                MsgPart::Text(text) => tree.create(NodeKind::RawText(text.clone())),
                MsgPart::Placeholder(name) => {
                    let print = find_placeholder(tree, msg, name).ok_or_else(|| {
                        CompileError::codegen(
                            tree.id(msg),
                            format!(
                                "translation of message '{}' uses unknown placeholder {}",
                                key, name
                            ),
                        )
                    })?;
                    if nodes.contains(&print) {
                        // Placeholder used twice: the second use gets its own node.
                        let kind = tree.kind(print).clone();
                        tree.create(kind)
                    } else {
                        print
                    }
                }
            };
            nodes.push(node);
        }
        Ok(nodes)
    }
}

impl MutatingVisitor for InsertMsgs<'_> {
    fn setup(&mut self) {
        self.translated = 0;
        self.untranslated = 0;
    }

    fn visit(&mut self, tree: &mut Tree, node: NodeRef) -> Result<()> {
        let NodeKind::Msg { key, .. } = tree.kind(node) else {
            return visit_children_mut(self, tree, node);
        };
        let key = key.clone();

        let replacements = match self.bundle.and_then(|b| b.get(&key)) {
            Some(parts) => {
                self.translated += 1;
                Self::translation_nodes(tree, node, &key, parts)?
            }
            None => {
                self.untranslated += 1;
                tree.children(node).to_vec()
            }
        };
        tree.replace_with(node, &replacements)?;
        Ok(())
    }

    fn exec(&mut self, tree: &mut Tree) -> Result<()> {
        self.setup();
        let root = tree.root();
        self.visit(tree, root)?;
        tracing::debug!(
            translated = self.translated,
            untranslated = self.untranslated,
            "inserted messages"
        );
        Ok(())
    }
}
