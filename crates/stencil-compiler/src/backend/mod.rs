//! Source code backends.
//!
//! Every backend runs the same pipeline for one generation call:
//!
//! 1. substitute translated messages when a bundle is given,
//! 2. open a call scope frame and seed the shared parameters,
//! 3. fold bidi helpers using the seeded direction,
//! 4. emit one output unit per input file, in file-set order.
//!
//! The frame is closed on every exit path, including emission failures.

mod javasrc;
mod jssrc;
mod writer;

use std::sync::Arc;

use stencil_tree::{DirectiveCall, Expr, NodeKind, NodeRef, Tree};

use crate::directives::{BackendKind, DirectiveRegistry, TargetExpr};
use crate::error::{CompileError, Result};
use crate::msgs::MsgBundle;
use crate::passes::{InsertMsgs, MutatingVisitor, OptimizeBidi};
use crate::scope::CallScope;
use crate::templates::{OverridePolicy, TemplateSet};

pub use javasrc::{JavaSrcBackend, JavaSrcOptions};
pub use jssrc::{JsSrcBackend, JsSrcOptions};
pub use writer::CodeWriter;

/// Generated source for one input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputUnit {
    /// Path of the input file this unit was generated from.
    pub source_path: String,
    /// Suggested file name for the generated code.
    pub file_name: String,
    pub code: String,
}

/// A code generator for one target language.
pub trait Backend {
    fn kind(&self) -> BackendKind;

    /// `1` ltr, `-1` rtl, `0` to derive from the bundle's locale.
    fn bidi_global_dir(&self) -> i32;

    fn override_policy(&self) -> OverridePolicy;

    /// Emit the code for one `File` node.
    fn emit_file(&self, tree: &Tree, file: NodeRef, templates: &TemplateSet) -> Result<OutputUnit>;
}

/// Run the generation pipeline with a call scope private to this call.
pub fn generate<B: Backend + ?Sized>(
    backend: &B,
    tree: &mut Tree,
    bundle: Option<Arc<MsgBundle>>,
) -> Result<Vec<OutputUnit>> {
    let scope = CallScope::new();
    generate_in_scope(backend, tree, bundle, &scope)
}

/// Run the generation pipeline inside `scope`.
///
/// Fails with [`CompileError::ScopeReentry`] if `scope` already has an open
/// frame.
pub fn generate_in_scope<B: Backend + ?Sized>(
    backend: &B,
    tree: &mut Tree,
    bundle: Option<Arc<MsgBundle>>,
    scope: &CallScope,
) -> Result<Vec<OutputUnit>> {
    let span = tracing::debug_span!("generate", backend = %backend.kind());
    let _enter = span.enter();

    if let Some(bundle) = bundle.as_deref() {
        InsertMsgs::new(Some(bundle)).exec(tree)?;
    }

    let frame = scope.enter()?;
    frame.seed_shared_params(bundle, backend.bidi_global_dir())?;

    OptimizeBidi::new(&frame).exec(tree)?;

    let templates = TemplateSet::resolve(tree, backend.override_policy())?;
    let files = tree.files().to_vec();
    let mut units = Vec::with_capacity(files.len());
    for file in files {
        let unit = backend.emit_file(tree, file, &templates)?;
        tracing::debug!(
            file = %unit.source_path,
            bytes = unit.code.len(),
            "emitted output unit"
        );
        units.push(unit);
    }
    Ok(units)
}

/// Path and namespace of a `File` node.
pub(crate) fn file_info(tree: &Tree, file: NodeRef) -> Result<(&str, &str)> {
    match tree.kind(file) {
        NodeKind::File { path, namespace } => Ok((path.as_str(), namespace.as_str())),
        other => Err(CompileError::codegen(
            tree.id(file),
            format!("expected a file, found {}", other.label()),
        )),
    }
}

/// Apply a print site's directives, in order, to the translated value.
pub(crate) fn apply_directives<F>(
    registry: &DirectiveRegistry,
    backend: BackendKind,
    tree: &Tree,
    node: NodeRef,
    value: TargetExpr,
    directives: &[DirectiveCall],
    mut translate: F,
) -> Result<TargetExpr>
where
    F: FnMut(&Expr) -> Result<TargetExpr>,
{
    let mut value = value;
    for call in directives {
        let directive = registry
            .resolve(call)
            .map_err(|e| e.at_site(tree.to_source_string(node)))?;
        let args = call
            .args
            .iter()
            .map(&mut translate)
            .collect::<Result<Vec<_>>>()?;
        let applied = match backend {
            BackendKind::JsSrc => directive.js_src().map(|d| d.apply_for_js_src(&value, &args)),
            BackendKind::JavaSrc => directive
                .java_src()
                .map(|d| d.apply_for_java_src(&value, &args)),
            BackendKind::Interpreter => None,
        };
        value = applied.ok_or_else(|| CompileError::UnsupportedDirectiveForBackend {
            directive: call.name.clone(),
            backend: backend.to_string(),
            node_id: tree.id(node).to_string(),
        })?;
    }
    Ok(value)
}

/// Error for a bidi call that reached emission unfolded.
pub(crate) fn unfolded_bidi(tree: &Tree, node: NodeRef, expr: &Expr) -> CompileError {
    CompileError::codegen(
        tree.id(node),
        format!("{} was not folded before emission", expr.to_source_string()),
    )
}

/// Error for a node kind that cannot appear where it was found.
pub(crate) fn misplaced(tree: &Tree, node: NodeRef) -> CompileError {
    CompileError::codegen(
        tree.id(node),
        format!("unexpected {} inside a template body", tree.kind(node).label()),
    )
}
