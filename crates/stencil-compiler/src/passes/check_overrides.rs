//! Rejects duplicate template definitions that are not explicit overrides.

use std::collections::HashMap;

use stencil_tree::{is_partial_name, NodeKind, NodeRef, Tree};

use super::{visit_children, Visitor};
use crate::error::{CompileError, Result};

/// Checks that no two templates share a full name unless the later one is an
/// explicit override.
///
/// Requires full names: run [`super::PrependNamespaces`] first.
#[derive(Debug, Default)]
pub struct CheckOverrides {
    /// Full template name to the first template seen with that name.
    templates: HashMap<String, NodeRef>,
}

impl CheckOverrides {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Visitor for CheckOverrides {
    type Output = ();

    fn setup(&mut self) {
        self.templates.clear();
    }

    fn visit(&mut self, tree: &Tree, node: NodeRef) -> Result<()> {
        match tree.kind(node) {
            NodeKind::FileSet | NodeKind::File { .. } => visit_children(self, tree, node),
            NodeKind::Template {
                name, is_override, ..
            } => {
                if is_partial_name(name) {
                    return Err(CompileError::PartialTemplateName(name.clone()));
                }
                let Some(previous) = self.templates.get(name).copied() else {
                    self.templates.insert(name.clone(), node);
                    return Ok(());
                };
                if *is_override {
                    tracing::debug!(template = %name, "accepting explicit override");
                    return Ok(());
                }

                let previous_file = tree.file_path_of(previous).unwrap_or_default().to_string();
                let current_file = tree.file_path_of(node).unwrap_or_default().to_string();
                if previous_file == current_file {
                    Err(CompileError::DuplicateTemplateSameFile {
                        name: name.clone(),
                        file: current_file,
                    })
                } else {
                    Err(CompileError::DuplicateTemplate {
                        name: name.clone(),
                        first_file: previous_file,
                        second_file: current_file,
                    })
                }
            }
            // Templates only occur directly under files.
            _ => Ok(()),
        }
    }

    fn finish(&mut self) {}
}
