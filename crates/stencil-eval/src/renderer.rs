//! Render façade over a compiled template set.
//!
//! A [`Renderer`] is either unbound (renders by full template name) or bound
//! to a namespace (renders partial names relative to it). Bound renderers are
//! cheap views sharing the unbound base.

use std::sync::Arc;

use stencil_compiler::{
    prepare_tree, BackendKind, CallScope, DirectiveRegistry, MsgBundle, OverridePolicy,
    TemplateSet,
};
use stencil_tree::{is_partial_name, Tree};

use crate::data::TemplateData;
use crate::error::{RenderError, Result};
use crate::eval::{render_template, RenderState};

/// Options for the interpreter
#[derive(Debug, Clone, Copy, Default)]
pub struct InterpreterOptions {
    /// `1` ltr, `-1` rtl, `0` to derive from the bundle's locale.
    pub bidi_global_dir: i32,
    pub override_policy: OverridePolicy,
}

impl InterpreterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bidi_global_dir(mut self, dir: i32) -> Self {
        self.bidi_global_dir = dir;
        self
    }

    pub fn override_policy(mut self, policy: OverridePolicy) -> Self {
        self.override_policy = policy;
        self
    }
}

/// The validated tree and everything derived from it. Read-only once built.
#[derive(Debug)]
struct CompiledTemplates {
    tree: Tree,
    templates: TemplateSet,
    registry: DirectiveRegistry,
    options: InterpreterOptions,
}

/// Renders templates of a compiled set, optionally within a namespace.
#[derive(Debug, Clone)]
pub struct Renderer {
    base: Arc<CompiledTemplates>,
    namespace: Option<String>,
}

impl Renderer {
    /// Validate `tree` with the built-in directives and build an unbound renderer.
    pub fn new(tree: Tree, options: InterpreterOptions) -> Result<Self> {
        Self::with_registry(tree, options, DirectiveRegistry::with_basic_directives())
    }

    pub fn with_registry(
        mut tree: Tree,
        options: InterpreterOptions,
        registry: DirectiveRegistry,
    ) -> Result<Self> {
        prepare_tree(&mut tree, &registry, Some(BackendKind::Interpreter))?;
        let templates = TemplateSet::resolve(&tree, options.override_policy)?;
        tracing::debug!(templates = templates.len(), "renderer ready");
        Ok(Self {
            base: Arc::new(CompiledTemplates {
                tree,
                templates,
                registry,
                options,
            }),
            namespace: None,
        })
    }

    /// The namespace this renderer is bound to, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// A renderer bound to `namespace`, or the unbound renderer for `None` or
    /// an empty namespace. Always built over the unbound base, so binding an
    /// already bound renderer replaces its namespace rather than nesting it.
    pub fn for_namespace<'n>(&self, namespace: impl Into<Option<&'n str>>) -> Renderer {
        let namespace = namespace.into().filter(|ns| !ns.is_empty());
        Renderer {
            base: Arc::clone(&self.base),
            namespace: namespace.map(str::to_string),
        }
    }

    /// The full template name `name` refers to through this renderer.
    pub fn resolve_name(&self, name: &str) -> Result<String> {
        match &self.namespace {
            Some(namespace) => {
                if !is_partial_name(name) {
                    return Err(RenderError::InvalidPartialName(name.to_string()));
                }
                Ok(format!("{}{}", namespace, name))
            }
            None => {
                if is_partial_name(name) {
                    return Err(RenderError::MissingNamespace(name.to_string()));
                }
                Ok(name.to_string())
            }
        }
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.resolve_name(name)
            .map(|full| self.base.templates.get(&full).is_some())
            .unwrap_or(false)
    }

    /// Render a template with a call scope private to this call.
    pub fn render(
        &self,
        name: &str,
        data: &TemplateData,
        bundle: Option<Arc<MsgBundle>>,
    ) -> Result<String> {
        let scope = CallScope::new();
        self.render_in_scope(name, data, bundle, &scope)
    }

    /// Render a template inside `scope`, which must not have an open frame.
    pub fn render_in_scope(
        &self,
        name: &str,
        data: &TemplateData,
        bundle: Option<Arc<MsgBundle>>,
        scope: &CallScope,
    ) -> Result<String> {
        let full_name = self.resolve_name(name)?;
        let base = &*self.base;
        let template = base
            .templates
            .get(&full_name)
            .ok_or_else(|| RenderError::UnknownTemplate(full_name.clone()))?;

        let span = tracing::debug_span!("render", template = %full_name);
        let _enter = span.enter();

        let frame = scope.enter()?;
        frame.seed_shared_params(bundle, base.options.bidi_global_dir)?;

        let mut state = RenderState::new(&base.tree, &base.templates, &base.registry, &frame);
        let mut out = String::new();
        render_template(&mut state, template, data, &mut out)?;
        tracing::debug!(bytes = out.len(), "rendered");
        Ok(out)
    }
}
