//! Compile-time validation of the print directives applied at each print site.

use stencil_tree::{NodeKind, NodeRef, Tree};

use super::{visit_children, Visitor};
use crate::directives::{BackendKind, DirectiveRegistry};
use crate::error::{CompileError, Result};

/// Fails on unknown directives and on wrong argument counts, and optionally on
/// directives that have no realization for a given backend.
pub struct CheckDirectives<'a> {
    registry: &'a DirectiveRegistry,
    backend: Option<BackendKind>,
}

impl<'a> CheckDirectives<'a> {
    pub fn new(registry: &'a DirectiveRegistry) -> Self {
        Self {
            registry,
            backend: None,
        }
    }

    /// Also require every directive to support `backend`.
    pub fn for_backend(mut self, backend: BackendKind) -> Self {
        self.backend = Some(backend);
        self
    }
}

/// Describe a print site for diagnostics: its source and file.
pub(crate) fn describe_site(tree: &Tree, node: NodeRef) -> String {
    let source = tree.to_source_string(node);
    match tree.file_path_of(node) {
        Some(path) => format!("{} ({})", source, path),
        None => source,
    }
}

impl Visitor for CheckDirectives<'_> {
    type Output = ();

    fn visit(&mut self, tree: &Tree, node: NodeRef) -> Result<()> {
        let NodeKind::Print { directives, .. } = tree.kind(node) else {
            return visit_children(self, tree, node);
        };

        for call in directives {
            let directive = self
                .registry
                .resolve(call)
                .map_err(|e| e.at_site(describe_site(tree, node)))?;
            if let Some(backend) = self.backend {
                if !directive.supports(backend) {
                    return Err(CompileError::UnsupportedDirectiveForBackend {
                        directive: call.name.clone(),
                        backend: backend.to_string(),
                        node_id: tree.id(node).to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    fn finish(&mut self) {}
}
